//! Request routing
//!
//! Maps a method and request target onto a handler. Routes live under
//! `/api/v1`:
//!
//! - `POST   /snippets`          create
//! - `GET    /snippets`          list (`?q=`, `?tag=`, `?tags=a,b`)
//! - `GET    /snippets/search`   same as list
//! - `GET    /snippets/{id}`     fetch
//! - `PUT    /snippets/{id}`     partial update
//! - `DELETE /snippets/{id}`     delete
//! - `GET    /tags`              tags in use (`?counts=true` for counts)
//!
//! plus `GET /health`. `OPTIONS` on any path answers a CORS preflight.

use std::sync::Arc;

use url::Url;

use snipstash_core::SnippetStore;

use crate::handlers::{snippets, tags};
use crate::response::ApiResponse;

/// Base used to resolve request targets, which arrive as bare paths
const BASE_URL: &str = "http://localhost/";

/// The HTTP API over one shared store
#[derive(Debug, Clone)]
pub struct Api {
    store: Arc<SnippetStore>,
}

impl Api {
    pub fn new(store: Arc<SnippetStore>) -> Self {
        Self { store }
    }

    /// Route one request and produce its response
    pub fn handle(&self, method: &str, target: &str, body: &[u8]) -> ApiResponse {
        if method == "OPTIONS" {
            return ApiResponse::empty(200);
        }

        let Ok(url) = Url::parse(BASE_URL).and_then(|base| base.join(target)) else {
            return ApiResponse::message(400, "invalid request target");
        };

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let store = self.store.as_ref();
        let result = match (method, segments.as_slice()) {
            ("GET", ["health"]) => Ok(ApiResponse::text(200, "OK\n")),

            ("GET", ["api", "v1", "snippets"]) | ("GET", ["api", "v1", "snippets", "search"]) => {
                snippets::list(store, snippets::filter_from_query(url.query_pairs()))
            }
            ("POST", ["api", "v1", "snippets"]) => snippets::create(store, body),

            ("GET", ["api", "v1", "snippets", id]) => snippets::get(store, id),
            ("PUT", ["api", "v1", "snippets", id]) => snippets::update(store, id, body),
            ("DELETE", ["api", "v1", "snippets", id]) => snippets::delete(store, id),

            ("GET", ["api", "v1", "tags"]) => {
                let counts = url
                    .query_pairs()
                    .any(|(key, value)| key == "counts" && (value == "true" || value == "1"));
                tags::list(store, counts)
            }

            (_, ["health"])
            | (_, ["api", "v1", "snippets"])
            | (_, ["api", "v1", "snippets", _])
            | (_, ["api", "v1", "tags"]) => Ok(ApiResponse::method_not_allowed()),

            _ => Ok(ApiResponse::not_found()),
        };

        result.unwrap_or_else(|err| ApiResponse::error(&err))
    }
}
