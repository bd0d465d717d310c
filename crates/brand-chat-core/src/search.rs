//! Relevance engine: category override with keyword-scoring fallback.
//!
//! The engine is a pure function over a borrowed [`Corpus`] snapshot. It
//! does no I/O and takes no locks, so any number of threads may call it
//! against the same snapshot.
//!
//! # Algorithm
//!
//! 1. **Category override.** Lower-case the query and collect every
//!    canonical category from the [`CategoryTaxonomy`] with a trigger
//!    keyword inside it. Select every item whose lower-cased category
//!    contains one of those names, in corpus order. If that selection is
//!    non-empty it is the result, **without** applying `top_k`: a question
//!    like "list all my degrees" gets every education item.
//! 2. **Keyword scoring.** Otherwise tokenize the query on whitespace, drop
//!    stop words and tokens of two characters or fewer, and score each item:
//!    - `+10` when the whole lower-cased query occurs in the content;
//!    - per token: `+5` when it occurs in the category, `+2` when it occurs
//!      in the content, `+1` more when it occurs inside a single
//!      whitespace-delimited word of the content.
//!
//!    Zero scores are dropped, the rest are stably sorted by score
//!    (descending) and truncated to `top_k`.
//!
//! An empty result is a normal outcome meaning "no grounding available".

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Corpus, KnowledgeItem};
use crate::taxonomy::CategoryTaxonomy;

/// Default cap on fallback results.
pub const DEFAULT_TOP_K: usize = 15;

/// Score for the whole query appearing verbatim in an item's content.
pub const FULL_QUERY_SCORE: u32 = 10;
/// Score for a token appearing in an item's category.
pub const CATEGORY_TOKEN_SCORE: u32 = 5;
/// Score for a token appearing anywhere in an item's content.
pub const CONTENT_TOKEN_SCORE: u32 = 2;
/// Extra score for a token appearing inside one word of the content.
pub const WORD_TOKEN_SCORE: u32 = 1;

/// Tokens dropped from queries before scoring: articles, interrogatives,
/// politeness words, and filler pronouns/auxiliaries. Tokens of two
/// characters or fewer are dropped separately.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "nor", "yet", "what", "whats", "what's", "who", "whom", "whose",
    "which", "when", "where", "why", "how", "please", "thanks", "thank", "kindly", "hello", "hey",
    "you", "your", "yours", "you're", "are", "was", "were", "does", "did", "can", "could", "would",
    "should", "will", "tell", "about", "with", "have", "has", "had", "that", "this", "these",
    "those", "there", "any", "some", "she", "her", "hers", "him", "his", "they", "them", "their",
];

/// Which step of the engine produced a [`Retrieval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every item of the matched categories, unbounded.
    CategoryOverride,
    /// Scored top-K fallback.
    KeywordScoring,
    /// Neither step selected anything.
    NoMatch,
}

/// One selected item with its position in the corpus snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit<'c> {
    /// Index in the snapshot the engine was given.
    pub index: usize,
    #[serde(flatten)]
    pub item: &'c KnowledgeItem,
    /// Fallback score; `None` for category override hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

/// Result of one engine call: the selected items plus the diagnostics a
/// caller needs to explain what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retrieval<'c> {
    pub strategy: Strategy,
    /// Canonical categories whose trigger keywords matched the query. May
    /// be non-empty even when no item was selected.
    pub matched_categories: Vec<String>,
    pub hits: Vec<Hit<'c>>,
}

impl<'c> Retrieval<'c> {
    fn empty(matched_categories: Vec<String>) -> Self {
        Self {
            strategy: Strategy::NoMatch,
            matched_categories,
            hits: Vec::new(),
        }
    }

    /// Number of items returned.
    pub fn count(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &'c KnowledgeItem> + '_ {
        self.hits.iter().map(|h| h.item)
    }

    /// Join the selected contents with blank lines, ready to be used as a
    /// grounding block. Empty when nothing was selected.
    pub fn context_block(&self) -> String {
        self.items()
            .map(KnowledgeItem::content)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Category-aware keyword retrieval over a corpus snapshot.
#[derive(Debug, Clone)]
pub struct RelevanceEngine {
    taxonomy: CategoryTaxonomy,
    stop_words: HashSet<String>,
    top_k: usize,
}

impl Default for RelevanceEngine {
    fn default() -> Self {
        Self::new(CategoryTaxonomy::default(), DEFAULT_TOP_K)
    }
}

impl RelevanceEngine {
    /// Build an engine. `top_k` is clamped to at least 1.
    pub fn new(taxonomy: CategoryTaxonomy, top_k: usize) -> Self {
        Self {
            taxonomy,
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            top_k: top_k.max(1),
        }
    }

    /// Treat the subject's name, each part of it, and their possessive
    /// forms as stop words.
    pub fn with_subject_name(mut self, name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        let mut variants: Vec<&str> = lower.split_whitespace().collect();
        if variants.len() > 1 {
            variants.push(lower.as_str());
        }
        for v in variants {
            let v = v.trim_matches(|c: char| !c.is_alphanumeric());
            if v.is_empty() {
                continue;
            }
            self.stop_words.insert(v.to_string());
            self.stop_words.insert(format!("{v}'s"));
            self.stop_words.insert(format!("{v}’s"));
        }
        self
    }

    /// Add extra stop words (lower-cased).
    pub fn with_stop_words<'w>(mut self, words: impl IntoIterator<Item = &'w str>) -> Self {
        self.stop_words
            .extend(words.into_iter().map(|w| w.trim().to_lowercase()));
        self
    }

    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Run the engine with this engine's `top_k`.
    pub fn retrieve<'c>(&self, query: &str, corpus: &'c Corpus) -> Retrieval<'c> {
        self.retrieve_with_limit(query, corpus, self.top_k)
    }

    /// Run the engine with an explicit fallback cap (clamped to at least 1).
    pub fn retrieve_with_limit<'c>(
        &self,
        query: &str,
        corpus: &'c Corpus,
        top_k: usize,
    ) -> Retrieval<'c> {
        if query.trim().is_empty() {
            return Retrieval::empty(Vec::new());
        }
        let query_lower = query.to_lowercase();

        let matched: Vec<String> = self
            .taxonomy
            .match_categories(&query_lower)
            .into_iter()
            .map(str::to_string)
            .collect();

        if corpus.is_empty() {
            return Retrieval::empty(matched);
        }

        if !matched.is_empty() {
            let hits = select_categories(corpus, &matched);
            if !hits.is_empty() {
                tracing::debug!(
                    categories = ?matched,
                    count = hits.len(),
                    "category override"
                );
                return Retrieval {
                    strategy: Strategy::CategoryOverride,
                    matched_categories: matched,
                    hits,
                };
            }
        }

        let tokens = self.query_tokens(&query_lower);
        let mut hits: Vec<Hit<'c>> = corpus
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let score = score_item(&query_lower, &tokens, item);
                (score > 0).then_some(Hit {
                    index,
                    item,
                    score: Some(score),
                })
            })
            .collect();

        // Stable: equal scores keep corpus order.
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(top_k.max(1));

        tracing::debug!(
            tokens = ?tokens,
            categories = ?matched,
            count = hits.len(),
            "keyword scoring"
        );

        if hits.is_empty() {
            return Retrieval::empty(matched);
        }

        Retrieval {
            strategy: Strategy::KeywordScoring,
            matched_categories: matched,
            hits,
        }
    }

    /// Scoring tokens for an already lower-cased query.
    ///
    /// Tokens are the whitespace-separated words exactly as typed, so
    /// punctuation stays attached: `"degrees?"` is its own token.
    pub fn query_tokens(&self, query_lower: &str) -> Vec<String> {
        query_lower
            .split_whitespace()
            .filter(|t| t.chars().count() > 2)
            .filter(|t| !self.stop_words.contains(*t))
            .map(str::to_string)
            .collect()
    }
}

/// Run the default engine (built-in taxonomy and stop words) with an
/// explicit `top_k`.
pub fn retrieve<'c>(query: &str, corpus: &'c Corpus, top_k: usize) -> Retrieval<'c> {
    RelevanceEngine::new(CategoryTaxonomy::default(), top_k).retrieve(query, corpus)
}

fn select_categories<'c>(corpus: &'c Corpus, categories: &[String]) -> Vec<Hit<'c>> {
    corpus
        .iter()
        .enumerate()
        .filter(|(_, item)| {
            assert_well_formed(item);
            let cat = item.category().to_lowercase();
            categories.iter().any(|c| cat.contains(c.as_str()))
        })
        .map(|(index, item)| Hit {
            index,
            item,
            score: None,
        })
        .collect()
}

/// Fallback score of one item. `query_lower` is the full lower-cased query;
/// `tokens` are the filtered query tokens.
pub fn score_item(query_lower: &str, tokens: &[String], item: &KnowledgeItem) -> u32 {
    assert_well_formed(item);

    let content = item.content().to_lowercase();
    let category = item.category().to_lowercase();
    let mut score = 0;

    if content.contains(query_lower) {
        score += FULL_QUERY_SCORE;
    }

    for token in tokens {
        let token = token.as_str();
        if category.contains(token) {
            score += CATEGORY_TOKEN_SCORE;
        }
        if content.contains(token) {
            score += CONTENT_TOKEN_SCORE;
        }
        if content.split_whitespace().any(|word| word.contains(token)) {
            score += WORD_TOKEN_SCORE;
        }
    }

    score
}

fn assert_well_formed(item: &KnowledgeItem) {
    assert!(
        item.is_well_formed(),
        "corpus contains a malformed knowledge item: {item:?}"
    );
}
