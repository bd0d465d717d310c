//! System prompt construction for the persona assistant.
//!
//! The prompt introduces the persona, embeds the grounding block produced
//! by the relevance engine, and tells the model how to behave when the
//! knowledge base had nothing relevant.

use std::fmt::Write;

use brand_chat_core::search::Retrieval;

use crate::config::PersonaConfig;

/// Inserted in place of grounding when retrieval returned nothing.
pub const NO_CONTEXT_NOTE: &str = "No information on this topic is available in the knowledge base. \
Say honestly that you don't have that information instead of inventing details.";

/// Build the system prompt for one question.
pub fn build_system_prompt(persona: &PersonaConfig, retrieval: &Retrieval<'_>) -> String {
    let name = persona.name.trim();
    let mut prompt = String::new();

    if persona.role.trim().is_empty() {
        let _ = writeln!(prompt, "You are a helpful assistant representing {name}.");
    } else {
        let _ = writeln!(
            prompt,
            "You are a helpful assistant representing {name}, a {}.",
            persona.role.trim()
        );
    }

    if !persona.description.trim().is_empty() {
        let _ = write!(prompt, "\n{}\n", persona.description.trim());
    }

    let _ = write!(
        prompt,
        "\nWhen answering questions, use the following context from {name}'s knowledge base:\n\n"
    );

    if retrieval.is_empty() {
        prompt.push_str(NO_CONTEXT_NOTE);
    } else {
        prompt.push_str(&retrieval.context_block());
    }

    prompt.push_str(
        "\n\nRespond naturally and conversationally. Only state facts that appear in the context. \
If the context does not cover the question, be honest about it but still be helpful.",
    );

    prompt
}
