//! Concurrent snippet store
//!
//! The `SnippetStore` owns every snippet and the tag reference counts
//! derived from them. It is constructed once at startup and shared (behind an
//! `Arc`) by all request handlers.
//!
//! ## Locking
//!
//! Records live behind one `RwLock`; the `TagIndex` locks itself. Writers
//! hold the record lock while they update the index, and the index never
//! calls back into the store, so locks are always taken records-then-tags.
//! Readers take only read locks.
//!
//! ## Usage
//!
//! ```ignore
//! let store = SnippetStore::new();
//!
//! let snippet = Snippet::new(generate_id(), draft, Utc::now());
//! store.create(snippet);
//!
//! let go = store.list(&ListFilter::all().with_tags(["go"]));
//! ```

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::filter::ListFilter;
use crate::models::{normalize_tags, Snippet, SnippetPatch};
use crate::tags::TagIndex;

/// In-memory snippet store with tag reference counting
#[derive(Debug, Default)]
pub struct SnippetStore {
    /// Snippets keyed by ID
    snippets: RwLock<HashMap<String, Snippet>>,
    /// Reference counts per tag
    tags: TagIndex,
}

impl SnippetStore {
    /// Create an empty store
    pub fn new() -> Self {
        debug!("memory store initialized");
        Self::default()
    }

    // ==================== Snippet Operations ====================

    /// Insert a snippet under its ID
    ///
    /// The caller assigns the ID and timestamps. Reusing an existing ID
    /// replaces that snippet (last write wins) and moves its tag references
    /// to the new tag set. Duplicate tags are collapsed before storing.
    pub fn create(&self, mut snippet: Snippet) -> Snippet {
        snippet.tags = normalize_tags(snippet.tags);
        let mut snippets = self.snippets.write();

        match snippets.get(&snippet.id) {
            Some(previous) => self.tags.reconcile(previous.tags.as_slice(), snippet.tags.as_slice()),
            None => self.tags.increment(&snippet.tags),
        }

        debug!(snippet.id = %snippet.id, tags = ?snippet.tags, "snippet saved");
        snippets.insert(snippet.id.clone(), snippet.clone());
        snippet
    }

    /// Get a snippet by ID
    pub fn get(&self, id: &str) -> StoreResult<Snippet> {
        let snippets = self.snippets.read();

        match snippets.get(id) {
            Some(snippet) => {
                debug!(snippet.id = %id, "snippet retrieved");
                Ok(snippet.clone())
            }
            None => {
                debug!(snippet.id = %id, "snippet not found");
                Err(StoreError::not_found(id))
            }
        }
    }

    /// Apply a partial update to a snippet
    ///
    /// Only fields present in `patch` change. Tag changes are reconciled
    /// against the tag index. `updated_at` is always bumped.
    pub fn update(&self, id: &str, patch: SnippetPatch) -> StoreResult<Snippet> {
        let mut snippets = self.snippets.write();

        let Some(snippet) = snippets.get_mut(id) else {
            debug!(snippet.id = %id, "snippet not found");
            return Err(StoreError::not_found(id));
        };

        let fields = patch.field_names();
        debug!(snippet.id = %id, ?fields, "updating snippet");

        let old_tags = patch.tags.as_ref().map(|_| snippet.tags.clone());
        snippet.apply(patch);
        if let Some(old_tags) = old_tags {
            self.tags.reconcile(old_tags.as_slice(), snippet.tags.as_slice());
        }
        snippet.updated_at = Utc::now();

        debug!(snippet.id = %id, ?fields, "snippet updated");
        Ok(snippet.clone())
    }

    /// Remove a snippet and release its tag references
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let mut snippets = self.snippets.write();

        let Some(snippet) = snippets.remove(id) else {
            debug!(snippet.id = %id, "snippet not found");
            return Err(StoreError::not_found(id));
        };

        self.tags.decrement(&snippet.tags);
        debug!(snippet.id = %id, "deleted snippet");
        Ok(())
    }

    /// List snippets matching `filter`
    ///
    /// An empty filter returns everything. Otherwise returns snippets that
    /// carry any requested tag or contain the query in a text field. Results
    /// are ordered by creation time, then ID.
    pub fn list(&self, filter: &ListFilter) -> Vec<Snippet> {
        let snippets = self.snippets.read();

        let mut results: Vec<Snippet> = if filter.is_empty() {
            snippets.values().cloned().collect()
        } else {
            let query = filter.normalized_query();
            snippets
                .values()
                .filter(|snippet| filter.matches(snippet, query.as_deref()))
                .cloned()
                .collect()
        };
        drop(snippets);

        results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(
            count = results.len(),
            tags = ?filter.tags,
            query = ?filter.query,
            "fetched snippets"
        );
        results
    }

    /// Number of stored snippets
    pub fn len(&self) -> usize {
        self.snippets.read().len()
    }

    /// Check if the store holds no snippets
    pub fn is_empty(&self) -> bool {
        self.snippets.read().is_empty()
    }

    // ==================== Tag Operations ====================

    /// Tags referenced by at least one snippet, sorted by name
    pub fn list_tags(&self) -> Vec<String> {
        let tags = self.tags.list();
        debug!(count = tags.len(), "fetched tags");
        tags
    }

    /// Tags with their reference counts, sorted by name
    pub fn tags_with_counts(&self) -> Vec<(String, usize)> {
        self.tags.snapshot().into_iter().collect()
    }

    /// Reference count for a single tag
    pub fn tag_count(&self, tag: &str) -> usize {
        self.tags.count(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::generate_id;
    use crate::models::SnippetDraft;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::thread;

    fn add(store: &SnippetStore, title: &str, content: &str, tags: &[&str]) -> Snippet {
        let draft = SnippetDraft::new(title, content, "python").tags(tags.iter().copied());
        store.create(Snippet::new(generate_id(), draft, Utc::now()))
    }

    fn tags(values: &[&str]) -> SnippetPatch {
        SnippetPatch {
            tags: Some(values.iter().map(|t| t.to_string()).collect()),
            ..SnippetPatch::default()
        }
    }

    /// Recount tags from scratch and compare with the incremental index
    fn assert_tag_index_consistent(store: &SnippetStore) {
        let mut expected: BTreeMap<String, usize> = BTreeMap::new();
        for snippet in store.list(&ListFilter::all()) {
            for tag in &snippet.tags {
                *expected.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        let actual: BTreeMap<String, usize> = store.tags_with_counts().into_iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_create_and_get() {
        let store = SnippetStore::new();
        let draft = SnippetDraft::new("Fibonacci", "def fib(n): ...", "python")
            .description("naive recursion")
            .tags(["math"])
            .favorite(true);
        let snippet = Snippet::new("fixed-id", draft, Utc::now());

        store.create(snippet.clone());

        let retrieved = store.get("fixed-id").unwrap();
        assert_eq!(retrieved, snippet);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = SnippetStore::new();
        let err = store.get("nope").unwrap_err();
        assert_eq!(err, StoreError::not_found("nope"));
    }

    #[test]
    fn test_create_counts_tags() {
        let store = SnippetStore::new();
        add(&store, "one", "", &["go", "web"]);
        add(&store, "two", "", &["go"]);

        assert_eq!(store.tag_count("go"), 2);
        assert_eq!(store.tag_count("web"), 1);
        assert_eq!(store.list_tags(), vec!["go", "web"]);
    }

    #[test]
    fn test_create_with_duplicate_tags_counts_once() {
        let store = SnippetStore::new();
        let created = add(&store, "dup", "", &["go", "go"]);

        assert_eq!(created.tags, vec!["go"]);
        assert_eq!(store.tag_count("go"), 1);
    }

    #[test]
    fn test_create_collapses_hand_built_duplicate_tags() {
        let store = SnippetStore::new();
        let mut snippet = Snippet::new("built", SnippetDraft::default(), Utc::now());
        snippet.tags = vec!["go".to_string(), "go".to_string(), "web".to_string()];

        let created = store.create(snippet);
        assert_eq!(created.tags, vec!["go", "web"]);
        assert_eq!(store.get("built").unwrap().tags, vec!["go", "web"]);
        assert_eq!(store.tag_count("go"), 1);
        assert_tag_index_consistent(&store);

        let mut value = serde_json::to_value(Snippet::new("decoded", SnippetDraft::default(), Utc::now())).unwrap();
        value["tags"] = serde_json::json!(["a", "a"]);
        let decoded: Snippet = serde_json::from_value(value).unwrap();

        store.create(decoded);
        assert_eq!(store.get("decoded").unwrap().tags, vec!["a"]);
        assert_eq!(store.tag_count("a"), 1);
        assert_tag_index_consistent(&store);

        store.delete("decoded").unwrap();
        assert_eq!(store.tag_count("a"), 0);
        assert_tag_index_consistent(&store);
    }

    #[test]
    fn test_create_reusing_id_replaces_and_keeps_counts_exact() {
        let store = SnippetStore::new();
        let first = Snippet::new("same", SnippetDraft::new("a", "", "").tags(["old", "shared"]), Utc::now());
        let second = Snippet::new("same", SnippetDraft::new("b", "", "").tags(["shared", "new"]), Utc::now());

        store.create(first);
        store.create(second);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("same").unwrap().title, "b");
        assert_eq!(store.tag_count("old"), 0);
        assert_eq!(store.tag_count("shared"), 1);
        assert_eq!(store.tag_count("new"), 1);
        assert_tag_index_consistent(&store);
    }

    #[test]
    fn test_update_partial_fields() {
        let store = SnippetStore::new();
        let original = add(&store, "Title", "body", &["a"]);

        let updated = store
            .update(
                &original.id,
                SnippetPatch {
                    title: Some("New Title".to_string()),
                    is_favorite: Some(true),
                    ..SnippetPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "New Title");
        assert!(updated.is_favorite);
        assert_eq!(updated.content, "body");
        assert_eq!(updated.tags, vec!["a"]);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(store.get(&original.id).unwrap(), updated);
    }

    #[test]
    fn test_empty_update_bumps_updated_at_only() {
        let store = SnippetStore::new();
        let original = add(&store, "Title", "body", &["a"]);
        thread::sleep(std::time::Duration::from_millis(10));

        let updated = store.update(&original.id, SnippetPatch::default()).unwrap();

        assert!(updated.updated_at > original.updated_at);
        assert_eq!(updated.title, original.title);
        assert_eq!(updated.content, original.content);
        assert_eq!(updated.tags, original.tags);
        assert_eq!(updated.is_favorite, original.is_favorite);
        assert_eq!(updated.created_at, original.created_at);
    }

    #[test]
    fn test_update_missing() {
        let store = SnippetStore::new();
        let err = store.update("nope", tags(&["x"])).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.list_tags().is_empty());
    }

    #[test]
    fn test_update_reconciles_tags() {
        let store = SnippetStore::new();
        let s = add(&store, "one", "", &["a", "b"]);
        add(&store, "two", "", &["b"]);

        store.update(&s.id, tags(&["b", "c"])).unwrap();

        assert_eq!(store.tag_count("a"), 0);
        assert_eq!(store.tag_count("b"), 2);
        assert_eq!(store.tag_count("c"), 1);
        assert_tag_index_consistent(&store);
    }

    #[test]
    fn test_delete() {
        let store = SnippetStore::new();
        let s = add(&store, "doomed", "", &["x"]);

        store.delete(&s.id).unwrap();

        assert!(store.get(&s.id).unwrap_err().is_not_found());
        assert!(store.is_empty());
        assert_eq!(store.tag_count("x"), 0);
    }

    #[test]
    fn test_delete_missing_mutates_nothing() {
        let store = SnippetStore::new();
        add(&store, "keep", "", &["x"]);

        let err = store.delete("nope").unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tag_count("x"), 1);
    }

    #[test]
    fn test_delete_only_releases_own_tags() {
        // Regression: releasing a snippet's tags must not touch unrelated tags
        let store = SnippetStore::new();
        add(&store, "keep", "", &["alpha", "beta"]);
        let doomed = add(&store, "doomed", "", &["gamma"]);

        store.delete(&doomed.id).unwrap();

        assert_eq!(store.tag_count("alpha"), 1);
        assert_eq!(store.tag_count("beta"), 1);
        assert_eq!(store.tag_count("gamma"), 0);
        assert_tag_index_consistent(&store);
    }

    #[test]
    fn test_tag_round_trip_leaves_nothing() {
        let store = SnippetStore::new();
        let s = add(&store, "round", "", &["a", "b"]);

        store.update(&s.id, tags(&["b", "c"])).unwrap();
        store.delete(&s.id).unwrap();

        for tag in ["a", "b", "c"] {
            assert_eq!(store.tag_count(tag), 0);
        }
        assert!(store.list_tags().is_empty());
    }

    #[test]
    fn test_list_all() {
        let store = SnippetStore::new();
        add(&store, "one", "", &[]);
        add(&store, "two", "", &["x"]);
        add(&store, "three", "", &[]);

        assert_eq!(store.list(&ListFilter::all()).len(), 3);
        assert_eq!(store.list(&ListFilter::all().with_query("  ")).len(), 3);
    }

    #[test]
    fn test_list_by_tag() {
        let store = SnippetStore::new();
        let go_web = add(&store, "server", "", &["go", "web"]);
        let go = add(&store, "cli", "", &["go"]);
        add(&store, "script", "", &["python"]);

        let results = store.list(&ListFilter::all().with_tags(["go"]));
        let mut ids: Vec<String> = results.into_iter().map(|s| s.id).collect();
        ids.sort();
        let mut expected = vec![go_web.id, go.id];
        expected.sort();

        assert_eq!(ids, expected);
    }

    #[test]
    fn test_list_by_any_of_several_tags() {
        let store = SnippetStore::new();
        add(&store, "a", "", &["go"]);
        add(&store, "b", "", &["rust"]);
        add(&store, "c", "", &["python"]);

        let results = store.list(&ListFilter::all().with_tags(["go", "rust"]));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_list_by_query() {
        let store = SnippetStore::new();
        let fib = add(&store, "Fibonacci", "def fib(n): ...", &[]);
        add(&store, "Quicksort", "def sort(xs): ...", &[]);

        let results = store.list(&ListFilter::all().with_query("FIB"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, fib.id);
    }

    #[test]
    fn test_list_union_has_no_duplicates() {
        let store = SnippetStore::new();
        add(&store, "Fibonacci", "def fib(n)", &["go"]);
        add(&store, "Other", "nothing", &["go"]);
        add(&store, "fib only", "", &[]);
        add(&store, "unrelated", "", &["rust"]);

        let results = store.list(&ListFilter::all().with_tags(["go"]).with_query("fib"));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_list_no_match() {
        let store = SnippetStore::new();
        add(&store, "a", "", &["go"]);

        assert!(store.list(&ListFilter::all().with_tags(["haskell"])).is_empty());
    }

    #[test]
    fn test_list_ordered_by_creation() {
        let store = SnippetStore::new();
        let now = Utc::now();
        let later = now + chrono::Duration::seconds(5);

        store.create(Snippet::new("b", SnippetDraft::new("late", "", ""), later));
        store.create(Snippet::new("a", SnippetDraft::new("early", "", ""), now));

        let titles: Vec<String> = store.list(&ListFilter::all()).into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[test]
    fn test_concurrent_creates_and_deletes() {
        let store = Arc::new(SnippetStore::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut kept = Vec::new();
                    for i in 0..50 {
                        let tag = format!("t{}", i % 5);
                        let s = add(&store, &format!("w{worker}-{i}"), "", &[tag.as_str(), "shared"]);
                        if i % 2 == 0 {
                            store.delete(&s.id).unwrap();
                        } else {
                            kept.push(s.id);
                        }
                    }
                    kept
                })
            })
            .collect();

        let kept: Vec<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

        assert_eq!(store.len(), kept.len());
        assert_eq!(store.tag_count("shared"), kept.len());
        for id in &kept {
            assert!(store.get(id).is_ok());
        }
        assert_tag_index_consistent(&store);
    }

    #[test]
    fn test_concurrent_updates_on_one_record() {
        let store = SnippetStore::new();
        let s = add(&store, "hot", "", &["start"]);

        thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                let id = s.id.clone();
                scope.spawn(move || {
                    for i in 0..50 {
                        let tag = format!("w{worker}-{}", i % 3);
                        store.update(&id, tags(&[tag.as_str(), "common"])).unwrap();
                        let _ = store.list(&ListFilter::all().with_tags(["common"]));
                    }
                });
            }
        });

        let final_snippet = store.get(&s.id).unwrap();
        assert_eq!(final_snippet.tags.len(), 2);
        assert!(final_snippet.tags.contains(&"common".to_string()));
        assert_eq!(store.tag_count("start"), 0);
        assert_eq!(store.list_tags().len(), 2);
        assert_tag_index_consistent(&store);
    }
}
