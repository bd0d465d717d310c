//! Question answering: retrieve grounding, build the prompt, generate.
//!
//! Each call is stateless: no conversation history is kept between
//! questions. The corpus snapshot is taken once per question, so an admin
//! edit during generation never changes the grounding mid-answer.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use brand_chat_core::search::{RelevanceEngine, Strategy};
use brand_chat_core::store::CorpusStore;
use brand_chat_core::Error;

use crate::config::Config;
use crate::json_store::JsonFileStore;
use crate::llm;
use crate::prompt::build_system_prompt;

/// A generated reply plus the retrieval diagnostics behind it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub reply: String,
    pub strategy: Strategy,
    pub matched_categories: Vec<String>,
    pub items_used: usize,
}

/// Answer one question, streaming reply text through `on_delta`.
///
/// # Errors
///
/// [`Error::EmptyQuery`] for a blank question (checked before anything
/// else), store failures, and LLM failures.
pub async fn answer<S, F>(
    config: &Config,
    engine: &RelevanceEngine,
    store: &S,
    question: &str,
    on_delta: F,
) -> Result<ChatAnswer>
where
    S: CorpusStore + ?Sized,
    F: FnMut(&str) + Send,
{
    if question.trim().is_empty() {
        return Err(Error::EmptyQuery.into());
    }

    let corpus = store.snapshot().await?;
    let (system_prompt, strategy, matched_categories, items_used) = {
        let retrieval = engine.retrieve(question, &corpus);
        tracing::info!(
            strategy = ?retrieval.strategy,
            categories = ?retrieval.matched_categories,
            items = retrieval.count(),
            "retrieved grounding"
        );
        (
            build_system_prompt(&config.persona, &retrieval),
            retrieval.strategy,
            retrieval.matched_categories.clone(),
            retrieval.count(),
        )
    };

    let reply =
        llm::complete_chat(&config.llm, &system_prompt, question.trim(), on_delta).await?;

    Ok(ChatAnswer {
        reply,
        strategy,
        matched_categories,
        items_used,
    })
}

/// CLI entry point for `brandchat ask`.
pub async fn run_ask(config: &Config, question: &str, debug: bool) -> Result<()> {
    let store = JsonFileStore::from_config(config).await?;
    let engine = config.engine();

    let result = answer(config, &engine, &store, question, |delta| {
        print!("{}", delta);
        let _ = std::io::stdout().flush();
    })
    .await?;
    println!();

    if debug {
        eprintln!(
            "[strategy: {:?} | matched: {} | items: {}]",
            result.strategy,
            if result.matched_categories.is_empty() {
                "none".to_string()
            } else {
                result.matched_categories.join(", ")
            },
            result.items_used
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_chat_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_blank_question_rejected_before_generation() {
        let config = Config::minimal();
        let store = InMemoryStore::new();
        let err = answer(&config, &config.engine(), &store, "  ", |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::EmptyQuery));
    }

    #[tokio::test]
    async fn test_disabled_llm_surfaces_error() {
        let config = Config::minimal();
        let store = InMemoryStore::new();
        let err = answer(&config, &config.engine(), &store, "what are your degrees", |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }
}
