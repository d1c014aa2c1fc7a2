//! Tag request handlers

use serde::Serialize;

use snipstash_core::{SnippetStore, StoreResult};

use crate::response::ApiResponse;

#[derive(Serialize)]
struct TagCount {
    name: String,
    count: usize,
}

/// List tags referenced by at least one snippet
///
/// With `counts` set, each entry carries its reference count.
pub fn list(store: &SnippetStore, counts: bool) -> StoreResult<ApiResponse> {
    if counts {
        let tags: Vec<TagCount> = store
            .tags_with_counts()
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect();
        return Ok(ApiResponse::json(200, &tags));
    }

    Ok(ApiResponse::json(200, &store.list_tags()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use snipstash_core::{Snippet, SnippetDraft};

    #[test]
    fn test_list_tags() {
        let store = SnippetStore::new();
        store.create(Snippet::new("a", SnippetDraft::default().tags(["go", "web"]), Utc::now()));
        store.create(Snippet::new("b", SnippetDraft::default().tags(["go"]), Utc::now()));

        let resp = list(&store, false).unwrap();
        assert_eq!(resp.json_body(), json!(["go", "web"]));

        let resp = list(&store, true).unwrap();
        assert_eq!(
            resp.json_body(),
            json!([{ "name": "go", "count": 2 }, { "name": "web", "count": 1 }])
        );
    }

    #[test]
    fn test_list_tags_empty() {
        let store = SnippetStore::new();
        assert_eq!(list(&store, false).unwrap().json_body(), json!([]));
    }
}
