//! # Brand Chat
//!
//! A grounded chat assistant for a personal brand.
//!
//! An admin curates a knowledge base of short, categorized text items
//! (education, experience, expertise, brand voice, ...). For every visitor
//! question, the relevance engine picks the items worth showing the
//! language model, and the reply is generated from that context only.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────────┐
//! │ Admin ingest │──▶│  Chunker    │──▶│ knowledge.json │
//! │  CLI / HTTP  │   │ blank lines │   │  (JSON store)  │
//! └──────────────┘   └─────────────┘   └───────┬────────┘
//!                                              │ snapshot
//!                                              ▼
//!  question ──▶ ┌──────────────────┐   ┌──────────────┐
//!               │ Relevance engine │──▶│ Prompt + LLM │──▶ reply
//!               │ override / score │   │  (streamed)  │
//!               └──────────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! brandchat init
//! brandchat add --category education --file education.txt
//! brandchat retrieve "where did you study" --debug
//! brandchat ask "what are your degrees?"
//! brandchat serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`json_store`] | File-backed corpus store |
//! | [`ingest`] | Chunk and append admin text |
//! | [`knowledge`] | List, remove, clear commands |
//! | [`search`] | Retrieval diagnostics command |
//! | [`stats`] | Corpus summary |
//! | [`prompt`] | System prompt assembly |
//! | [`llm`] | Streaming chat completion client |
//! | [`chat`] | Question answering |
//! | [`admin`] | Admin password gate |
//! | [`server`] | HTTP server |
//!
//! The pure parts (items, chunking, taxonomy, scoring) live in
//! [`brand_chat_core`], re-exported here as [`core`].

pub use brand_chat_core as core;

pub mod admin;
pub mod chat;
pub mod config;
pub mod ingest;
pub mod json_store;
pub mod knowledge;
pub mod llm;
pub mod prompt;
pub mod search;
pub mod server;
pub mod stats;
