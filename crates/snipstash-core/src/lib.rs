//! snipstash Core Library
//!
//! This crate provides the core of snipstash, a concurrent in-memory store
//! for code snippets with tag reference counting.
//!
//! # Architecture
//!
//! - **SnippetStore**: owns all snippets behind a read/write lock
//! - **TagIndex**: self-locking reference counts, one per tag
//!
//! Nothing is persisted; all state lives in process memory.
//!
//! # Quick Start
//!
//! ```text
//! let store = SnippetStore::new();
//!
//! let draft = SnippetDraft::new("Fibonacci", "def fib(n): ...", "python").tags(["math"]);
//! let snippet = store.create(Snippet::new(generate_id(), draft, Utc::now()));
//!
//! let math = store.list(&ListFilter::all().with_tags(["math"]));
//! let tags = store.list_tags();
//! ```
//!
//! # Modules
//!
//! - `store`: Snippet store facade (main entry point)
//! - `tags`: Tag reference counting
//! - `filter`: Tag and text filtering
//! - `models`: Snippet, draft and patch types
//! - `error`: Store errors
//! - `id`: ID generation
//! - `config`: Server configuration

pub mod config;
pub mod error;
pub mod filter;
pub mod id;
pub mod models;
pub mod store;
pub mod tags;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use filter::{has_any_tag, matches_query, ListFilter};
pub use id::generate_id;
pub use models::{normalize_tags, Snippet, SnippetDraft, SnippetPatch};
pub use store::SnippetStore;
pub use tags::TagIndex;
