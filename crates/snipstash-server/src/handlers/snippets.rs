//! Snippet request handlers

use std::borrow::Cow;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use snipstash_core::{
    generate_id, ListFilter, Snippet, SnippetDraft, SnippetPatch, SnippetStore, StoreResult,
};

use crate::response::ApiResponse;

/// Create a snippet from a JSON draft
///
/// The server assigns the ID and both timestamps. Replies 201 with the new ID.
pub fn create(store: &SnippetStore, body: &[u8]) -> StoreResult<ApiResponse> {
    let draft: SnippetDraft = serde_json::from_slice(body)?;

    let snippet = store.create(Snippet::new(generate_id(), draft, Utc::now()));
    debug!(snippet.id = %snippet.id, "snippet created");

    Ok(ApiResponse::json(201, &json!({ "id": snippet.id })))
}

/// List snippets, optionally filtered
///
/// A filtered listing with no matches is a 404; an unfiltered empty listing
/// is an empty array.
pub fn list(store: &SnippetStore, filter: ListFilter) -> StoreResult<ApiResponse> {
    let snippets = store.list(&filter);

    if snippets.is_empty() && !filter.is_empty() {
        debug!(tags = ?filter.tags, query = ?filter.query, "no snippets matched");
        return Ok(ApiResponse::message(404, "no snippets matched"));
    }

    Ok(ApiResponse::json(200, &snippets))
}

/// Fetch one snippet
pub fn get(store: &SnippetStore, id: &str) -> StoreResult<ApiResponse> {
    let snippet = store.get(id)?;
    Ok(ApiResponse::json(200, &snippet))
}

/// Apply a partial update
///
/// The body must be valid JSON; known fields with the wrong type are ignored.
pub fn update(store: &SnippetStore, id: &str, body: &[u8]) -> StoreResult<ApiResponse> {
    let updates: Value = serde_json::from_slice(body)?;
    let patch = SnippetPatch::from_json(&updates);

    let snippet = store.update(id, patch)?;
    Ok(ApiResponse::json(200, &snippet))
}

/// Delete a snippet
pub fn delete(store: &SnippetStore, id: &str) -> StoreResult<ApiResponse> {
    store.delete(id)?;
    Ok(ApiResponse::empty(204))
}

/// Build a list filter from decoded query pairs
///
/// `q` sets the text query; `tag` may repeat and `tags` takes a
/// comma-separated list. Blank tags are dropped.
pub fn filter_from_query<'a, I>(pairs: I) -> ListFilter
where
    I: IntoIterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
{
    let mut filter = ListFilter::all();

    for (key, value) in pairs {
        match key.as_ref() {
            "q" | "query" => filter.query = Some(value.into_owned()),
            "tag" => filter.tags.push(value.trim().to_string()),
            "tags" => filter
                .tags
                .extend(value.split(',').map(|t| t.trim().to_string())),
            _ => {}
        }
    }

    filter.tags.retain(|t| !t.is_empty());
    filter
}
