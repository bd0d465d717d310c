//! # Brand Chat Core
//!
//! Pure retrieval logic for Brand Chat: the knowledge item model, the
//! blank-line chunking rule, the category taxonomy, the relevance engine,
//! and the corpus store abstraction.
//!
//! This crate performs no network calls and no filesystem I/O. The engine
//! is a synchronous function over a borrowed [`models::Corpus`] snapshot;
//! persistence and text generation belong to the calling application.
//!
//! ```rust
//! use brand_chat_core::chunk::chunk_knowledge;
//! use brand_chat_core::models::Corpus;
//! use brand_chat_core::search::RelevanceEngine;
//!
//! let mut corpus = Corpus::new();
//! corpus.append(chunk_knowledge("education", "BA Economics, 2010\n\nMBA, 2015").unwrap());
//!
//! let engine = RelevanceEngine::default();
//! let retrieval = engine.retrieve("what are your degrees", &corpus);
//! assert_eq!(retrieval.count(), 2);
//! ```

pub mod chunk;
pub mod error;
pub mod models;
pub mod search;
pub mod store;
pub mod taxonomy;

pub use error::{Error, Result};
