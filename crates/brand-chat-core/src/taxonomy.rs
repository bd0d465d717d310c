//! Canonical topic categories and the keywords that trigger them.
//!
//! The taxonomy is a plain table from canonical category name to trigger
//! keywords. A query that contains any trigger keyword (as a lower-case
//! substring) activates the category override in the relevance engine.
//!
//! The built-in table covers the six canonical topics of a personal brand
//! corpus. Applications may add keywords or whole categories with
//! [`CategoryTaxonomy::extend`]; the scoring code never needs to change.

/// Built-in trigger table: `(canonical category, trigger keywords)`.
///
/// Keywords are lower-case and matched as substrings, so a stem such as
/// `"degree"` also covers `"degrees"`. Words that also occur inside
/// unrelated words (`tone` in "milestone", `bio` in "biology") appear only
/// as phrases.
pub const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "education",
        &[
            "degree",
            "education",
            "educated",
            "university",
            "college",
            "school",
            "studied",
            "study",
            "qualification",
            "certification",
            "certificate",
            "diploma",
            "graduate",
            "bachelor",
            "master",
            "mba",
            "phd",
        ],
    ),
    (
        "experience",
        &[
            "experience",
            "career",
            "job",
            "worked",
            "work history",
            "employ",
            "previous position",
            "positions held",
            "previous role",
            "companies",
            "projects",
        ],
    ),
    (
        "expertise",
        &[
            "expertise",
            "expert",
            "skill",
            "speciali",
            "good at",
            "strength",
            "capabilit",
        ],
    ),
    (
        "bio",
        &[
            "your bio",
            "short bio",
            "biography",
            "about yourself",
            "who are you",
            "who is",
            "background",
            "introduce",
        ],
    ),
    (
        "brand-voice",
        &[
            "brand voice",
            "your voice",
            "tone of voice",
            "your tone",
            "writing style",
            "how do you write",
            "how you write",
            "messaging",
        ],
    ),
    (
        "values",
        &[
            "values",
            "value system",
            "believe",
            "belief",
            "principle",
            "your mission",
            "mission statement",
            "ethic",
            "care about",
        ],
    ),
];

/// One canonical category and its trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered table of category rules consulted by the relevance engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTaxonomy {
    rules: Vec<CategoryRule>,
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::from_table(DEFAULT_TAXONOMY)
    }
}

impl CategoryTaxonomy {
    /// A taxonomy with no categories; every query falls through to scoring.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        let mut taxonomy = Self::empty();
        for (name, keywords) in table {
            taxonomy.extend(name, keywords.iter().copied());
        }
        taxonomy
    }

    /// Add trigger keywords to `category`, creating it if it is new.
    ///
    /// Names and keywords are lower-cased; blank and duplicate keywords are
    /// ignored.
    pub fn extend<'k>(&mut self, category: &str, keywords: impl IntoIterator<Item = &'k str>) {
        let name = category.trim().to_lowercase();
        if name.is_empty() {
            return;
        }

        let idx = match self.rules.iter().position(|r| r.name == name) {
            Some(idx) => idx,
            None => {
                self.rules.push(CategoryRule {
                    name,
                    keywords: Vec::new(),
                });
                self.rules.len() - 1
            }
        };

        let rule = &mut self.rules[idx];
        for kw in keywords {
            let kw = kw.trim().to_lowercase();
            if !kw.is_empty() && !rule.keywords.contains(&kw) {
                rule.keywords.push(kw);
            }
        }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Canonical categories with at least one keyword inside `query_lower`.
    ///
    /// `query_lower` must already be lower-cased. Order follows the table.
    pub fn match_categories(&self, query_lower: &str) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|kw| query_lower.contains(kw.as_str())))
            .map(|rule| rule.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_canonical_categories() {
        let taxonomy = CategoryTaxonomy::default();
        let names: Vec<&str> = taxonomy.categories().collect();
        assert_eq!(
            names,
            vec!["education", "experience", "expertise", "bio", "brand-voice", "values"]
        );
    }

    #[test]
    fn test_degree_stem_matches_plural() {
        let taxonomy = CategoryTaxonomy::default();
        assert_eq!(taxonomy.match_categories("what are your degrees"), vec!["education"]);
    }

    #[test]
    fn test_multiple_categories_match() {
        let taxonomy = CategoryTaxonomy::default();
        let matched = taxonomy.match_categories("what is your career history and what values drive you");
        assert_eq!(matched, vec!["experience", "values"]);
    }

    #[test]
    fn test_no_match_for_plain_topic_words() {
        let taxonomy = CategoryTaxonomy::default();
        assert!(taxonomy.match_categories("economics").is_empty());
        assert!(taxonomy.match_categories("blockchain and crypto tools").is_empty());
    }

    #[test]
    fn test_keywords_do_not_fire_inside_other_words() {
        let taxonomy = CategoryTaxonomy::default();
        for q in [
            "what was your biggest milestone",
            "can you send an invoice",
            "how is AIMC positioning itself",
            "did you take biology",
            "do you work on commission",
        ] {
            assert!(taxonomy.match_categories(q).is_empty(), "{q}");
        }
    }

    #[test]
    fn test_phrase_keywords_still_match() {
        let taxonomy = CategoryTaxonomy::default();
        assert_eq!(
            taxonomy.match_categories("describe your tone of voice"),
            vec!["brand-voice"]
        );
        assert_eq!(taxonomy.match_categories("share a short bio"), vec!["bio"]);
        assert_eq!(taxonomy.match_categories("what is your mission"), vec!["values"]);
    }

    #[test]
    fn test_extend_existing_and_new_category() {
        let mut taxonomy = CategoryTaxonomy::default();
        taxonomy.extend("Education", ["Alma Mater", "degree", ""]);
        taxonomy.extend("speaking", ["keynote", "podcast"]);

        let education = &taxonomy.rules()[0];
        assert!(education.keywords.contains(&"alma mater".to_string()));
        assert_eq!(
            education.keywords.iter().filter(|k| *k == "degree").count(),
            1
        );
        assert_eq!(taxonomy.match_categories("any podcast appearances?"), vec!["speaking"]);
    }

    #[test]
    fn test_empty_taxonomy_never_matches() {
        let taxonomy = CategoryTaxonomy::empty();
        assert!(taxonomy.match_categories("what are your degrees").is_empty());
    }
}
