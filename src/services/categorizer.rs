// src/services/categorizer.rs

//! Category inference service.
//!
//! Assigns every event exactly one category. The source-category hint is
//! checked first, then keyword groups over title and description in
//! priority order, then the default bucket.

use crate::models::{CategorizerConfig, Category, CategoryRule, Event};

/// A compiled rule: lowercase terms mapped to a resolved category.
#[derive(Debug, Clone)]
struct Rule {
    category: Category,
    terms: Vec<String>,
}

impl From<&CategoryRule> for Rule {
    fn from(rule: &CategoryRule) -> Self {
        Self {
            category: Category::parse_or_default(&rule.category),
            terms: rule.terms.iter().map(|t| t.trim().to_lowercase()).collect(),
        }
    }
}

/// Service mapping events to categories.
#[derive(Debug, Clone)]
pub struct Categorizer {
    hints: Vec<Rule>,
    keywords: Vec<Rule>,
}

impl Categorizer {
    /// Create a categorizer from configured rule lists.
    pub fn new(config: &CategorizerConfig) -> Self {
        Self {
            hints: config.hints.iter().map(Rule::from).collect(),
            keywords: config.keywords.iter().map(Rule::from).collect(),
        }
    }

    /// Classify one event.
    pub fn categorize(&self, event: &Event) -> Category {
        self.from_hint(&event.source_category)
            .or_else(|| {
                let text = format!(
                    "{} {}",
                    event.title,
                    event.description.as_deref().unwrap_or("")
                );
                self.from_keywords(&text)
            })
            .unwrap_or(Category::DEFAULT)
    }

    /// Exact synonym match on the normalized hint.
    fn from_hint(&self, hint: &str) -> Option<Category> {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return None;
        }
        self.hints
            .iter()
            .find(|rule| rule.terms.iter().any(|term| *term == hint))
            .map(|rule| rule.category)
    }

    /// Substring match of any keyword; earlier groups win.
    fn from_keywords(&self, text: &str) -> Option<Category> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|rule| rule.terms.iter().any(|term| text.contains(term.as_str())))
            .map(|rule| rule.category)
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(&CategorizerConfig::default())
    }
}
