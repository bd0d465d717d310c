//! Storage abstraction for the knowledge corpus.
//!
//! The [`CorpusStore`] trait owns the one piece of shared mutable state in
//! Brand Chat. Readers call [`snapshot`](CorpusStore::snapshot) and get an
//! immutable `Arc<Corpus>` that the relevance engine borrows for the length
//! of one query. Writers go through the mutation methods, which replace the
//! published snapshot only after the change has been flushed to the
//! backing medium (if any). A snapshot already handed out never changes.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`snapshot`](CorpusStore::snapshot) | Current read-only corpus |
//! | [`append`](CorpusStore::append) | Add items at the end, in order |
//! | [`remove_at`](CorpusStore::remove_at) | Remove one item by position |
//! | [`remove_by_category`](CorpusStore::remove_by_category) | Remove every item of one category |
//! | [`clear`](CorpusStore::clear) | Remove everything |

pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Corpus, KnowledgeItem};

/// Abstract corpus storage backend.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// The current corpus. Later mutations do not affect the returned value.
    async fn snapshot(&self) -> Result<Arc<Corpus>>;

    /// Append items in order. Returns how many were added.
    async fn append(&self, items: Vec<KnowledgeItem>) -> Result<usize>;

    /// Remove the item at `index`; every later index shifts down by one.
    ///
    /// Fails with [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange)
    /// without changing anything when `index` is past the end.
    async fn remove_at(&self, index: usize) -> Result<KnowledgeItem>;

    /// Remove every item whose category equals `category` exactly.
    /// Returns the number removed (possibly zero).
    async fn remove_by_category(&self, category: &str) -> Result<usize>;

    /// Remove every item. Returns the number removed.
    async fn clear(&self) -> Result<usize>;
}
