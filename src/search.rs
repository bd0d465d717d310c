//! Retrieval entry points for the CLI.
//!
//! The engine itself lives in `brand-chat-core::search` and is a pure
//! function over a corpus snapshot. This wrapper handles config, loading
//! the store, and printing diagnostics.

use anyhow::Result;

pub use brand_chat_core::search::{retrieve, Hit, RelevanceEngine, Retrieval, Strategy};
use brand_chat_core::store::CorpusStore;
use brand_chat_core::Error;

use crate::config::Config;
use crate::json_store::JsonFileStore;
use crate::knowledge::excerpt;

/// CLI entry point for `brandchat retrieve`.
pub async fn run_retrieve(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    debug: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::EmptyQuery.into());
    }

    let store = JsonFileStore::from_config(config).await?;
    let corpus = store.snapshot().await?;
    let engine = config.engine();
    let retrieval =
        engine.retrieve_with_limit(query, &corpus, limit.unwrap_or(engine.top_k()));

    if debug {
        println!(
            "Retrieval: strategy={}, matched categories: {}, items: {}",
            strategy_label(retrieval.strategy),
            if retrieval.matched_categories.is_empty() {
                "none".to_string()
            } else {
                retrieval.matched_categories.join(", ")
            },
            retrieval.count()
        );
        println!();
    }

    if retrieval.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (rank, hit) in retrieval.hits.iter().enumerate() {
        match hit.score {
            Some(score) => println!(
                "{}. [{}] #{} {}",
                rank + 1,
                score,
                hit.index,
                hit.item.category()
            ),
            None => println!("{}. #{} {}", rank + 1, hit.index, hit.item.category()),
        }
        println!("    {}", excerpt(hit.item.content(), 200));
        println!();
    }

    Ok(())
}

pub fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::CategoryOverride => "category_override",
        Strategy::KeywordScoring => "keyword_scoring",
        Strategy::NoMatch => "no_match",
    }
}
