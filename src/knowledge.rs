//! Knowledge base management commands.
//!
//! CLI entry points for listing and deleting stored items. The CLI runs
//! with direct access to the store file, so it does not ask for the admin
//! password; the HTTP server gates the same operations behind it.
//!
//! Positional indices shift after every removal: re-run `brandchat list`
//! before removing a second item by index.

use anyhow::{bail, Result};

use brand_chat_core::store::CorpusStore;

use crate::config::Config;
use crate::json_store::JsonFileStore;

/// Characters shown per item in `brandchat list`.
const EXCERPT_CHARS: usize = 100;

/// CLI entry point for `brandchat init`.
pub async fn run_init(config: &Config) -> Result<()> {
    if JsonFileStore::init(&config.store.path).await? {
        println!(
            "Knowledge base initialized at {}.",
            config.store.path.display()
        );
    } else {
        println!(
            "Knowledge base already initialized at {}.",
            config.store.path.display()
        );
    }
    Ok(())
}

/// CLI entry point for `brandchat list`.
pub async fn run_list(config: &Config, category: Option<&str>) -> Result<()> {
    let store = JsonFileStore::from_config(config).await?;
    let corpus = store.snapshot().await?;

    let mut shown = 0;
    for (index, item) in corpus.iter().enumerate() {
        if let Some(c) = category {
            if item.category() != c {
                continue;
            }
        }
        println!(
            "{:>4}  [{}] {}",
            index,
            item.category(),
            excerpt(item.content(), EXCERPT_CHARS)
        );
        shown += 1;
    }

    if shown == 0 {
        println!("No knowledge items.");
    }
    Ok(())
}

/// CLI entry point for `brandchat remove <index>`.
pub async fn run_remove(config: &Config, index: usize) -> Result<()> {
    let store = JsonFileStore::from_config(config).await?;
    let removed = store.remove_at(index).await?;
    println!(
        "Removed item {} [{}] {}",
        index,
        removed.category(),
        excerpt(removed.content(), EXCERPT_CHARS)
    );
    Ok(())
}

/// CLI entry point for `brandchat remove-category <category>`.
pub async fn run_remove_category(config: &Config, category: &str) -> Result<()> {
    let store = JsonFileStore::from_config(config).await?;
    let removed = store.remove_by_category(category).await?;
    println!("Removed {} items from category '{}'.", removed, category);
    Ok(())
}

/// CLI entry point for `brandchat clear`.
pub async fn run_clear(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to clear the knowledge base without --yes");
    }
    let store = JsonFileStore::from_config(config).await?;
    let removed = store.clear().await?;
    println!("Knowledge base cleared ({} items removed).", removed);
    Ok(())
}

/// Single-line excerpt of at most `max` characters.
pub fn excerpt(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_flattens_and_truncates() {
        assert_eq!(excerpt("line one\nline two", 100), "line one line two");
        assert_eq!(excerpt("abcdef ghij", 7), "abcdef…");
        assert_eq!(excerpt("Nicola’s voice", 8), "Nicola’s…");
    }
}
