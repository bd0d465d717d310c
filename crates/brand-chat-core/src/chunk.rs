//! Blank-line text chunker for admin-submitted knowledge.
//!
//! Splits a multi-paragraph text into [`KnowledgeItem`]s that all share the
//! submitted category. Each paragraph becomes exactly one item; nothing is
//! merged or size-limited, because the relevance engine treats one item as
//! one coherent unit.
//!
//! # Algorithm
//!
//! 1. Reject a blank category or blank text.
//! 2. Walk the text line by line. A line that is empty or whitespace-only
//!    ends the current paragraph; runs of blank lines collapse.
//! 3. Trim each paragraph and drop paragraphs that are empty after trimming.
//! 4. Emit one item per remaining paragraph, in order.
//!
//! # Example
//!
//! ```rust
//! use brand_chat_core::chunk::chunk_knowledge;
//!
//! let items = chunk_knowledge("bio", "A\n\nB\n\n\nC").unwrap();
//! let texts: Vec<&str> = items.iter().map(|i| i.content()).collect();
//! assert_eq!(texts, ["A", "B", "C"]);
//! ```

use crate::error::{Error, Result};
use crate::models::KnowledgeItem;

/// Split `text` into knowledge items tagged with `category`.
///
/// The category is trimmed before use. A text without blank lines yields a
/// single item holding the whole trimmed text.
///
/// # Errors
///
/// [`Error::EmptyCategory`] or [`Error::EmptyText`] when either input is
/// blank. No items are produced in that case.
pub fn chunk_knowledge(category: &str, text: &str) -> Result<Vec<KnowledgeItem>> {
    let category = category.trim();
    if category.is_empty() {
        return Err(Error::EmptyCategory);
    }
    if text.trim().is_empty() {
        return Err(Error::EmptyText);
    }

    split_paragraphs(text)
        .into_iter()
        .map(|para| KnowledgeItem::new(category, para))
        .collect()
}

/// Split text on blank-line boundaries into trimmed, non-empty paragraphs.
///
/// Borrowed slices of the input are returned, so interior line breaks are
/// kept exactly as submitted.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                push_trimmed(&mut paragraphs, &text[s..end]);
            }
            continue;
        }

        if start.is_none() {
            start = Some(line_start);
        }
        end = offset;
    }

    if let Some(s) = start {
        push_trimmed(&mut paragraphs, &text[s..end]);
    }

    paragraphs
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}
