//! Knowledge items and the ordered corpus that holds them.
//!
//! A [`KnowledgeItem`] is one category-tagged, paragraph-scale text chunk.
//! Every item is expected to come out of [`chunk_knowledge`](crate::chunk::chunk_knowledge):
//! a larger admin-submitted text split on blank lines, with each fragment
//! trimmed and empty fragments discarded. The relevance engine relies on
//! this invariant: it treats each item as one coherent, self-contained unit
//! and never re-splits or merges content.
//!
//! The persisted shape is a JSON array of `{ "category", "content" }`
//! objects. Deserialization rejects missing fields, unknown fields, and
//! blank values instead of skipping them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One category-tagged text chunk.
///
/// Both fields are non-empty once constructed. Items carry no identifier;
/// their identity is their position in the [`Corpus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKnowledgeItem")]
pub struct KnowledgeItem {
    category: String,
    content: String,
}

/// Wire shape checked by `TryFrom` before an item exists.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKnowledgeItem {
    category: String,
    content: String,
}

impl TryFrom<RawKnowledgeItem> for KnowledgeItem {
    type Error = Error;

    fn try_from(raw: RawKnowledgeItem) -> Result<Self> {
        if raw.category.trim().is_empty() {
            return Err(Error::InvalidItem("category is empty".to_string()));
        }
        if raw.content.trim().is_empty() {
            return Err(Error::InvalidItem("content is empty".to_string()));
        }
        Ok(Self {
            category: raw.category,
            content: raw.content,
        })
    }
}

impl KnowledgeItem {
    /// Create an item, rejecting a blank category or blank content.
    pub fn new(category: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let category = category.into();
        let content = content.into();
        if category.trim().is_empty() {
            return Err(Error::EmptyCategory);
        }
        if content.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        Ok(Self { category, content })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether both fields are still non-blank.
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.category.trim().is_empty() && !self.content.trim().is_empty()
    }
}

/// Ordered collection of knowledge items, oldest first.
///
/// Duplicates are allowed: resubmitting the same text produces independent
/// items. Positional indices are only valid until the next removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    items: Vec<KnowledgeItem>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<KnowledgeItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KnowledgeItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KnowledgeItem> {
        self.items.iter()
    }

    /// Append items in order. Returns how many were added.
    pub fn append(&mut self, items: impl IntoIterator<Item = KnowledgeItem>) -> usize {
        let before = self.items.len();
        self.items.extend(items);
        self.items.len() - before
    }

    /// Remove exactly one item. Every later item shifts down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<KnowledgeItem> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Remove every item whose category equals `category` exactly
    /// (case-sensitive). Returns the number removed.
    pub fn remove_by_category(&mut self, category: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.category != category);
        before - self.items.len()
    }

    /// Empty the corpus. Returns the number of items dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    /// Item counts per category, in order of first appearance.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for item in &self.items {
            match counts.iter_mut().find(|(c, _)| *c == item.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((item.category.clone(), 1)),
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a KnowledgeItem;
    type IntoIter = std::slice::Iter<'a, KnowledgeItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str, content: &str) -> KnowledgeItem {
        KnowledgeItem::new(category, content).unwrap()
    }

    fn sample() -> Corpus {
        Corpus::from_items(vec![
            item("education", "BA Economics, 2010"),
            item("education", "MBA, 2015"),
            item("bio", "Founder of X"),
        ])
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        assert_eq!(KnowledgeItem::new("  ", "text"), Err(Error::EmptyCategory));
        assert_eq!(KnowledgeItem::new("bio", "\n\t"), Err(Error::EmptyText));
    }

    #[test]
    fn test_remove_at_shifts_indices() {
        let mut corpus = sample();
        let removed = corpus.remove_at(0).unwrap();
        assert_eq!(removed.content(), "BA Economics, 2010");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0).unwrap().content(), "MBA, 2015");
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut corpus = sample();
        assert_eq!(
            corpus.remove_at(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn test_remove_by_category_is_case_sensitive() {
        let mut corpus = sample();
        assert_eq!(corpus.remove_by_category("Education"), 0);
        assert_eq!(corpus.remove_by_category("education"), 2);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0).unwrap().category(), "bio");
    }

    #[test]
    fn test_clear_reports_count() {
        let mut corpus = sample();
        assert_eq!(corpus.clear(), 3);
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_category_counts_first_seen_order() {
        let mut corpus = sample();
        corpus.append(vec![item("education", "PhD, 2020")]);
        assert_eq!(
            corpus.category_counts(),
            vec![("education".to_string(), 3), ("bio".to_string(), 1)]
        );
    }

    #[test]
    fn test_json_shape_is_plain_list() {
        let corpus = sample();
        let json = serde_json::to_value(&corpus).unwrap();
        assert_eq!(
            json[2],
            serde_json::json!({ "category": "bio", "content": "Founder of X" })
        );
        let back: Corpus = serde_json::from_value(json).unwrap();
        assert_eq!(back, corpus);
    }

    #[test]
    fn test_deserialize_rejects_malformed_items() {
        let missing = r#"[{"category": "bio"}]"#;
        assert!(serde_json::from_str::<Corpus>(missing).is_err());

        let blank = r#"[{"category": "bio", "content": "   "}]"#;
        assert!(serde_json::from_str::<Corpus>(blank).is_err());

        let extra = r#"[{"category": "bio", "content": "x", "id": 1}]"#;
        assert!(serde_json::from_str::<Corpus>(extra).is_err());
    }
}
