//! Validation errors raised before any corpus mutation.

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the core crate.
///
/// An empty retrieval result is deliberately not represented here: "no
/// grounding available" is a normal outcome, not a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The query was empty after trimming.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The category label was empty after trimming.
    #[error("category must not be empty")]
    EmptyCategory,

    /// The submitted text was empty after trimming.
    #[error("text must not be empty")]
    EmptyText,

    /// A positional removal referenced an index past the end of the corpus.
    #[error("index {index} out of range for corpus of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// A stored item violates the knowledge item invariant.
    #[error("invalid knowledge item: {0}")]
    InvalidItem(String),
}
