//! Tag reference counting
//!
//! The `TagIndex` tracks how many live snippets carry each tag. It is a
//! derived aggregate maintained incrementally by the store: every snippet
//! insert, tag change and delete is mirrored here.
//!
//! The index locks itself and never calls back into the store, so the store
//! may call it while holding its own record lock.

use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

/// Reference counts per tag name
#[derive(Debug, Default)]
pub struct TagIndex {
    counts: RwLock<HashMap<String, usize>>,
}

impl TagIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference for each distinct tag
    pub fn increment<I, S>(&self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = distinct(tags);
        let mut counts = self.counts.write();
        for tag in tags {
            increment_one(&mut counts, tag);
        }
    }

    /// Drop one reference for each distinct tag
    ///
    /// Tags that reach zero are removed. Untracked tags are ignored.
    pub fn decrement<I, S>(&self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = distinct(tags);
        let mut counts = self.counts.write();
        for tag in tags {
            decrement_one(&mut counts, &tag);
        }
    }

    /// Move references from `old` to `new` by set difference
    ///
    /// Tags only in `old` lose a reference, tags only in `new` gain one, and
    /// tags in both are left alone. Order and duplicates are irrelevant.
    pub fn reconcile<S: AsRef<str>>(&self, old: &[S], new: &[S]) {
        let old: HashSet<&str> = old.iter().map(AsRef::as_ref).collect();
        let new: HashSet<&str> = new.iter().map(AsRef::as_ref).collect();

        let mut counts = self.counts.write();
        for removed in old.difference(&new) {
            decrement_one(&mut counts, removed);
        }
        for added in new.difference(&old) {
            increment_one(&mut counts, (*added).to_string());
        }
    }

    /// Tag names referenced by at least one snippet, sorted
    pub fn list(&self) -> Vec<String> {
        let counts = self.counts.read();
        let mut tags: Vec<String> = counts
            .iter()
            .filter(|(_, count)| **count >= 1)
            .map(|(tag, _)| tag.clone())
            .collect();
        tags.sort();
        tags
    }

    /// Current reference count for `tag` (0 when untracked)
    pub fn count(&self, tag: &str) -> usize {
        self.counts.read().get(tag).copied().unwrap_or(0)
    }

    /// Copy of all counts, ordered by tag name
    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        self.counts
            .read()
            .iter()
            .map(|(tag, count)| (tag.clone(), *count))
            .collect()
    }

    /// Number of tracked tags
    pub fn len(&self) -> usize {
        self.counts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.read().is_empty()
    }
}

fn distinct<I, S>(tags: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter().map(|t| t.as_ref().to_string()).collect()
}

fn increment_one(counts: &mut HashMap<String, usize>, tag: String) {
    match counts.get_mut(&tag) {
        Some(count) => *count += 1,
        None => {
            debug!(tag = %tag, "tag saved");
            counts.insert(tag, 1);
        }
    }
}

fn decrement_one(counts: &mut HashMap<String, usize>, tag: &str) {
    let Some(count) = counts.get_mut(tag) else {
        return;
    };

    *count = count.saturating_sub(1);
    if *count == 0 {
        counts.remove(tag);
        debug!(tag, "tag released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_new_and_existing() {
        let index = TagIndex::new();
        index.increment(["rust", "web"]);
        index.increment(["rust"]);

        assert_eq!(index.count("rust"), 2);
        assert_eq!(index.count("web"), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_increment_ignores_duplicates_in_one_call() {
        let index = TagIndex::new();
        index.increment(["go", "go"]);
        assert_eq!(index.count("go"), 1);
    }

    #[test]
    fn test_decrement_only_named_tags() {
        let index = TagIndex::new();
        index.increment(["a", "b", "c"]);
        index.increment(["a", "b", "c"]);

        index.decrement(["b"]);

        assert_eq!(index.count("a"), 2);
        assert_eq!(index.count("b"), 1);
        assert_eq!(index.count("c"), 2);
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let index = TagIndex::new();
        index.increment(["solo"]);
        index.decrement(["solo"]);

        assert_eq!(index.count("solo"), 0);
        assert!(index.is_empty());
        assert!(index.list().is_empty());
    }

    #[test]
    fn test_decrement_never_goes_negative() {
        let index = TagIndex::new();
        index.decrement(["ghost"]);
        index.increment(["real"]);
        index.decrement(["real", "real"]);
        index.decrement(["real"]);

        assert_eq!(index.count("ghost"), 0);
        assert_eq!(index.count("real"), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_reconcile_set_difference() {
        let index = TagIndex::new();
        index.increment(["a", "b"]);

        index.reconcile(&["a", "b"], &["b", "c"]);

        assert_eq!(index.count("a"), 0);
        assert_eq!(index.count("b"), 1);
        assert_eq!(index.count("c"), 1);
    }

    #[test]
    fn test_reconcile_ignores_order_and_duplicates() {
        let index = TagIndex::new();
        index.increment(["x", "y"]);

        index.reconcile(&["x", "y"], &["y", "x", "x"]);

        assert_eq!(index.count("x"), 1);
        assert_eq!(index.count("y"), 1);
    }

    #[test]
    fn test_list_sorted_and_positive() {
        let index = TagIndex::new();
        index.increment(["zeta", "alpha", "mid"]);
        index.decrement(["mid"]);

        assert_eq!(index.list(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_snapshot() {
        let index = TagIndex::new();
        index.increment(["b", "a"]);
        index.increment(["a"]);

        let snapshot = index.snapshot();
        let pairs: Vec<(&str, usize)> = snapshot.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(pairs, vec![("a", 2), ("b", 1)]);
    }
}
