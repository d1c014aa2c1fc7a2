//! Snippet filtering
//!
//! A listing is filtered by tags (any match) and by a free-text query
//! (case-insensitive substring over the text fields). When both are given a
//! snippet qualifies if it satisfies either one.

use crate::models::Snippet;

/// Filter for listing snippets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Match snippets carrying any of these tags
    pub tags: Vec<String>,
    /// Match snippets whose text fields contain this query
    pub query: Option<String>,
}

impl ListFilter {
    /// A filter matching every snippet
    pub fn all() -> Self {
        Self::default()
    }

    /// Add tags to match
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set the text query
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// The query trimmed and lower-cased, or `None` when blank
    pub fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
    }

    /// True when the filter places no restriction at all
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.normalized_query().is_none()
    }

    /// Whether `snippet` passes this filter
    ///
    /// `query` must already be normalized (see [`ListFilter::normalized_query`]).
    pub(crate) fn matches(&self, snippet: &Snippet, query: Option<&str>) -> bool {
        has_any_tag(snippet, &self.tags) || query.is_some_and(|q| matches_query(snippet, q))
    }
}

/// Reports whether `snippet` carries any of `tags`
pub fn has_any_tag<S: AsRef<str>>(snippet: &Snippet, tags: &[S]) -> bool {
    tags.iter()
        .any(|wanted| snippet.tags.iter().any(|tag| tag == wanted.as_ref()))
}

/// Reports whether any text field of `snippet` contains `query`, ignoring case
///
/// An empty query matches nothing.
pub fn matches_query(snippet: &Snippet, query: &str) -> bool {
    if query.is_empty() {
        return false;
    }

    let query = query.to_lowercase();
    [
        &snippet.title,
        &snippet.content,
        &snippet.description,
        &snippet.language,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&query))
}
