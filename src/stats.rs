//! Knowledge base statistics.
//!
//! A quick summary of what the corpus holds: total item count and a
//! per-category breakdown. Used by `brandchat stats` and the public
//! `GET /knowledge/stats` endpoint.

use anyhow::Result;
use serde::Serialize;

use brand_chat_core::models::Corpus;
use brand_chat_core::store::CorpusStore;

use crate::config::Config;
use crate::json_store::JsonFileStore;

/// Item count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub items: usize,
}

/// Corpus summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeStats {
    pub total_items: usize,
    /// Categories in order of first appearance.
    pub categories: Vec<CategoryStats>,
}

pub fn compute_stats(corpus: &Corpus) -> KnowledgeStats {
    KnowledgeStats {
        total_items: corpus.len(),
        categories: corpus
            .category_counts()
            .into_iter()
            .map(|(category, items)| CategoryStats { category, items })
            .collect(),
    }
}

/// Run the stats command: load the corpus and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = JsonFileStore::from_config(config).await?;
    let stats = compute_stats(&*store.snapshot().await?);

    let file_size = std::fs::metadata(store.path())
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Brand Chat: Knowledge Base Stats");
    println!("================================");
    println!();
    println!("  Store:       {}", store.path().display());
    println!("  Size:        {}", format_bytes(file_size));
    println!();
    println!("  Total Knowledge Items: {}", stats.total_items);

    if !stats.categories.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<32} {:>8}", "CATEGORY", "ITEMS");
        println!("  {}", "-".repeat(41));
        for c in &stats.categories {
            println!("  {:<32} {:>8}", c.category, c.items);
        }
    }
    println!();

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_chat_core::chunk::chunk_knowledge;

    #[test]
    fn test_compute_stats() {
        let mut corpus = Corpus::new();
        corpus.append(chunk_knowledge("education", "BA\n\nMBA").unwrap());
        corpus.append(chunk_knowledge("bio", "Founder").unwrap());

        let stats = compute_stats(&corpus);
        assert_eq!(stats.total_items, 3);
        assert_eq!(
            stats.categories,
            vec![
                CategoryStats { category: "education".to_string(), items: 2 },
                CategoryStats { category: "bio".to_string(), items: 1 },
            ]
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0 MB");
    }
}
