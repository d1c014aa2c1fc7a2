//! Data models for snipstash
//!
//! Defines the stored record (`Snippet`) and the two payload shapes that feed
//! it: `SnippetDraft` for creation and `SnippetPatch` for partial updates.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A saved code snippet with metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Unique identifier, assigned once at creation
    pub id: String,
    /// Display title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// The snippet body
    pub content: String,
    /// Language label (not interpreted)
    pub language: String,
    /// Tags, unique within one snippet
    pub tags: Vec<String>,
    /// When this snippet was created
    pub created_at: DateTime<Utc>,
    /// When this snippet was last updated
    pub updated_at: DateTime<Utc>,
    /// Whether the snippet is marked as a favorite
    pub is_favorite: bool,
}

impl Snippet {
    /// Build a snippet from a draft with caller-assigned ID and timestamp
    pub fn new(id: impl Into<String>, draft: SnippetDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            content: draft.content,
            language: draft.language,
            tags: normalize_tags(draft.tags),
            created_at: now,
            updated_at: now,
            is_favorite: draft.is_favorite,
        }
    }

    /// Add a tag
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
            self.updated_at = Utc::now();
        }
    }

    /// Remove a tag
    pub fn remove_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
            self.updated_at = Utc::now();
        }
    }

    /// Flip the favorite flag
    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
        self.updated_at = Utc::now();
    }

    /// Apply the fields present in `patch`
    ///
    /// Does not touch `updated_at`; the store stamps it so that every update
    /// bumps the timestamp, including empty ones.
    pub(crate) fn apply(&mut self, patch: SnippetPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(is_favorite) = patch.is_favorite {
            self.is_favorite = is_favorite;
        }
    }
}

/// Create payload: every field a client may supply on creation
///
/// Unknown keys are rejected. The server-owned keys (`id`, `createdAt`,
/// `updatedAt`) are accepted so that clients may post a full record back,
/// but their values are discarded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SnippetDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,

    #[serde(default, rename = "id")]
    _id: Option<IgnoredAny>,
    #[serde(default, rename = "createdAt")]
    _created_at: Option<IgnoredAny>,
    #[serde(default, rename = "updatedAt")]
    _updated_at: Option<IgnoredAny>,
}

impl SnippetDraft {
    /// Create a draft with the three fields every snippet is expected to have
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            language: language.into(),
            ..Self::default()
        }
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the favorite flag
    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}

/// Typed partial update
///
/// `None` means "leave unchanged". Built either directly or from a loosely
/// typed JSON object with [`SnippetPatch::from_json`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

impl SnippetPatch {
    /// Build a patch from a JSON object, keeping only well-typed known fields
    ///
    /// Unknown keys and fields of the wrong type are skipped. `tags` must be
    /// an array made only of strings, otherwise it is skipped as a whole.
    /// Anything other than an object yields an empty patch.
    pub fn from_json(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let string = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        let tags = fields.get("tags").and_then(Value::as_array).and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });

        Self {
            title: string("title"),
            description: string("description"),
            content: string("content"),
            language: string("language"),
            tags,
            is_favorite: fields.get("isFavorite").and_then(Value::as_bool),
        }
    }

    /// Names of the fields this patch would change, for logging
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title");
        }
        if self.description.is_some() {
            names.push("description");
        }
        if self.content.is_some() {
            names.push("content");
        }
        if self.language.is_some() {
            names.push("language");
        }
        if self.tags.is_some() {
            names.push("tags");
        }
        if self.is_favorite.is_some() {
            names.push("isFavorite");
        }
        names
    }

    /// Whether applying this patch would change no data field
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }
}

/// Drop duplicate tags, keeping the first occurrence of each
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}
