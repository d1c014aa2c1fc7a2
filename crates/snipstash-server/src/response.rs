//! HTTP response building
//!
//! Handlers return an `ApiResponse`; the server turns it into a wire
//! response and adds the shared headers. Keeping this independent of
//! `tiny_http` lets the handlers be tested without a socket.

use serde::Serialize;
use serde_json::json;
use tracing::error;

use snipstash_core::StoreError;

/// Content type for JSON bodies
pub const JSON: &str = "application/json";

/// Content type for plain text bodies
pub const TEXT: &str = "text/plain; charset=utf-8";

/// A response produced by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the Content-Type header (absent for empty bodies)
    pub content_type: Option<&'static str>,
    /// Response body
    pub body: String,
}

impl ApiResponse {
    /// Serialize `value` as a JSON body
    ///
    /// A serialization failure becomes a 500 with a generic message.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: Some(JSON),
                body,
            },
            Err(e) => Self::error(&StoreError::Internal(e.to_string())),
        }
    }

    /// A JSON error body for `err`, logging internal failures
    pub fn error(err: &StoreError) -> Self {
        if let StoreError::Internal(details) = err {
            error!(error = %details, "internal error");
        }
        Self::message(err.status_code(), &err.public_message())
    }

    /// A JSON error body with an arbitrary status and message
    pub fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: Some(JSON),
            body: json!({ "error": message }).to_string(),
        }
    }

    /// A plain text body
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some(TEXT),
            body: body.into(),
        }
    }

    /// An empty body (204 No Content and preflight replies)
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::message(404, "not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::message(405, "method not allowed")
    }

    /// Parse the body as JSON (test helper)
    #[cfg(test)]
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}
