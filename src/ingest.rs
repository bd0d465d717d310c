//! Knowledge ingestion: chunk admin-submitted text and append it.
//!
//! Used by `brandchat add` and by `POST /admin/knowledge`. Validation
//! happens before the store is touched, so a rejected submission never
//! produces a partial write.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;

use brand_chat_core::chunk::chunk_knowledge;
use brand_chat_core::store::CorpusStore;

use crate::config::Config;
use crate::json_store::JsonFileStore;

/// Chunk `text` on blank lines and append every chunk under `category`.
///
/// Returns the number of chunks added.
pub async fn ingest_text<S: CorpusStore + ?Sized>(
    store: &S,
    category: &str,
    text: &str,
) -> Result<usize> {
    let items = chunk_knowledge(category, text)?;
    let added = store.append(items).await?;
    tracing::info!(category = category.trim(), chunks = added, "ingested text");
    Ok(added)
}

/// Where `brandchat add` reads its text from.
pub enum TextSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

impl TextSource {
    fn read(self) -> Result<String> {
        match self {
            TextSource::Inline(s) => Ok(s),
            TextSource::File(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display())),
            TextSource::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read stdin")?;
                Ok(buf)
            }
        }
    }
}

/// CLI entry point for `brandchat add`.
pub async fn run_add(config: &Config, category: &str, source: TextSource) -> Result<()> {
    let text = source.read()?;
    let store = JsonFileStore::from_config(config).await?;
    let added = ingest_text(&store, category, &text).await?;
    println!("Added {} chunks to knowledge base.", added);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_chat_core::store::memory::InMemoryStore;
    use brand_chat_core::Error;

    #[tokio::test]
    async fn test_ingest_appends_in_order() {
        let store = InMemoryStore::new();
        let n = ingest_text(&store, "bio", "A\n\nB\n\n\nC").await.unwrap();
        assert_eq!(n, 3);

        ingest_text(&store, "values", "Agency").await.unwrap();
        let corpus = store.snapshot().await.unwrap();
        let contents: Vec<&str> = corpus.iter().map(|i| i.content()).collect();
        assert_eq!(contents, vec!["A", "B", "C", "Agency"]);
    }

    #[tokio::test]
    async fn test_rejected_input_writes_nothing() {
        let store = InMemoryStore::new();
        let err = ingest_text(&store, "  ", "Some text").await.unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::EmptyCategory));

        let err = ingest_text(&store, "bio", "\n\n").await.unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::EmptyText));

        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
