//! In-memory [`CorpusStore`] for tests and embedding.
//!
//! Holds the published snapshot behind `std::sync::RwLock<Arc<Corpus>>`.
//! Mutations use `Arc::make_mut`, so the corpus is copied only while some
//! reader still holds the previous snapshot.

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Corpus, KnowledgeItem};

use super::CorpusStore;

/// Process-local store with no persistence.
pub struct InMemoryStore {
    corpus: RwLock<Arc<Corpus>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_corpus(Corpus::new())
    }

    pub fn with_corpus(corpus: Corpus) -> Self {
        Self {
            corpus: RwLock::new(Arc::new(corpus)),
        }
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Corpus) -> Result<T>) -> Result<T> {
        let mut guard = self
            .corpus
            .write()
            .map_err(|_| anyhow!("corpus lock poisoned"))?;
        f(Arc::make_mut(&mut guard))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CorpusStore for InMemoryStore {
    async fn snapshot(&self) -> Result<Arc<Corpus>> {
        let guard = self
            .corpus
            .read()
            .map_err(|_| anyhow!("corpus lock poisoned"))?;
        Ok(Arc::clone(&guard))
    }

    async fn append(&self, items: Vec<KnowledgeItem>) -> Result<usize> {
        self.mutate(|c| Ok(c.append(items)))
    }

    async fn remove_at(&self, index: usize) -> Result<KnowledgeItem> {
        self.mutate(|c| Ok(c.remove_at(index)?))
    }

    async fn remove_by_category(&self, category: &str) -> Result<usize> {
        self.mutate(|c| Ok(c.remove_by_category(category)))
    }

    async fn clear(&self) -> Result<usize> {
        self.mutate(|c| Ok(c.clear()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_knowledge;
    use crate::search::{retrieve, DEFAULT_TOP_K};
    use crate::Error;

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_writes() {
        let store = InMemoryStore::new();
        store
            .append(chunk_knowledge("bio", "Founder of X").unwrap())
            .await
            .unwrap();

        let before = store.snapshot().await.unwrap();
        store
            .append(chunk_knowledge("education", "MBA, 2015").unwrap())
            .await
            .unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_by_category_then_retrieve() {
        let store = InMemoryStore::new();
        store
            .append(chunk_knowledge("education", "BA Economics, 2010\n\nMBA, 2015").unwrap())
            .await
            .unwrap();
        store
            .append(chunk_knowledge("bio", "Founder of X").unwrap())
            .await
            .unwrap();

        assert_eq!(store.remove_by_category("education").await.unwrap(), 2);

        let corpus = store.snapshot().await.unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0).unwrap().category(), "bio");
        assert!(retrieve("degrees", &corpus, DEFAULT_TOP_K).is_empty());
    }

    #[tokio::test]
    async fn test_remove_at_out_of_range_is_typed() {
        let store = InMemoryStore::new();
        let err = store.remove_at(0).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let store = InMemoryStore::new();
        store
            .append(chunk_knowledge("values", "Truth\n\nAgency").unwrap())
            .await
            .unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
