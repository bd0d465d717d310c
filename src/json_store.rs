//! JSON file implementation of the [`CorpusStore`] trait.
//!
//! The corpus is persisted as a plain JSON array of
//! `{ "category": ..., "content": ... }` objects. The whole file is loaded
//! once at open; after every mutation the full list is rewritten through a
//! temporary file in the same directory and renamed into place, so a crash
//! never leaves a half-written corpus behind.
//!
//! Writers are serialized by a `tokio::sync::RwLock`. A mutation works on a
//! copy of the corpus and publishes it only after the flush succeeded; a
//! failed write leaves both the file and the in-memory snapshot unchanged.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use brand_chat_core::models::{Corpus, KnowledgeItem};
use brand_chat_core::store::CorpusStore;

use crate::config::Config;

/// File-backed corpus store.
pub struct JsonFileStore {
    path: PathBuf,
    corpus: RwLock<Arc<Corpus>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty corpus; a file
    /// with malformed items is an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let corpus = load_corpus(&path).await?;
        tracing::debug!(path = %path.display(), items = corpus.len(), "corpus loaded");
        Ok(Self {
            path,
            corpus: RwLock::new(Arc::new(corpus)),
        })
    }

    /// Open the store configured in `[store].path`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.store.path).await
    }

    /// Create an empty corpus file if none exists. Returns `true` when a
    /// file was created.
    pub async fn init(path: &Path) -> Result<bool> {
        if tokio::fs::try_exists(path).await? {
            return Ok(false);
        }
        write_corpus(path, &Corpus::new()).await?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the corpus, persist it, then publish it.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Corpus) -> Result<T>) -> Result<T> {
        let mut guard = self.corpus.write().await;
        let mut next = Corpus::clone(&guard);
        let out = f(&mut next)?;
        write_corpus(&self.path, &next).await?;
        *guard = Arc::new(next);
        Ok(out)
    }
}

#[async_trait]
impl CorpusStore for JsonFileStore {
    async fn snapshot(&self) -> Result<Arc<Corpus>> {
        Ok(Arc::clone(&*self.corpus.read().await))
    }

    async fn append(&self, items: Vec<KnowledgeItem>) -> Result<usize> {
        let n = self.mutate(|c| Ok(c.append(items))).await?;
        tracing::info!(added = n, "knowledge appended");
        Ok(n)
    }

    async fn remove_at(&self, index: usize) -> Result<KnowledgeItem> {
        let removed = self.mutate(|c| Ok(c.remove_at(index)?)).await?;
        tracing::info!(index, category = removed.category(), "knowledge item removed");
        Ok(removed)
    }

    async fn remove_by_category(&self, category: &str) -> Result<usize> {
        let n = self.mutate(|c| Ok(c.remove_by_category(category))).await?;
        tracing::info!(category, removed = n, "knowledge category removed");
        Ok(n)
    }

    async fn clear(&self) -> Result<usize> {
        let n = self.mutate(|c| Ok(c.clear())).await?;
        tracing::warn!(removed = n, "knowledge base cleared");
        Ok(n)
    }
}

async fn load_corpus(path: &Path) -> Result<Corpus> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Corpus::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read corpus: {}", path.display()))
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Corpus::new());
    }

    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse corpus: {}", path.display()))
}

async fn write_corpus(path: &Path, corpus: &Corpus) -> Result<()> {
    let json = serde_json::to_vec_pretty(corpus)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to write corpus: {}", path.display()))?;
        Ok(())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_chat_core::chunk::chunk_knowledge;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path().join("none.json")).await.unwrap();
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("knowledge.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .append(chunk_knowledge("education", "BA Economics, 2010\n\nMBA, 2015").unwrap())
            .await
            .unwrap();
        store
            .append(chunk_knowledge("bio", "Founder of X").unwrap())
            .await
            .unwrap();
        store.remove_at(0).await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let corpus = reopened.snapshot().await.unwrap();
        let contents: Vec<&str> = corpus.iter().map(|i| i.content()).collect();
        assert_eq!(contents, vec!["MBA, 2015", "Founder of X"]);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw[1],
            serde_json::json!({ "category": "bio", "content": "Founder of X" })
        );
    }

    #[tokio::test]
    async fn test_failed_removal_leaves_store_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("knowledge.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .append(chunk_knowledge("bio", "Founder of X").unwrap())
            .await
            .unwrap();

        assert!(store.remove_at(5).await.is_err());
        assert_eq!(store.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("knowledge.json");
        std::fs::write(&path, r#"[{"category": "bio"}]"#).unwrap();
        assert!(JsonFileStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("knowledge.json");
        assert!(JsonFileStore::init(&path).await.unwrap());
        assert!(!JsonFileStore::init(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }
}
