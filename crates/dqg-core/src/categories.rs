//! Category index and filtering.

use std::collections::HashSet;
use std::fmt;

use crate::models::Quote;
use crate::store::QuoteStore;

/// Wildcard option shown before the real categories.
pub const ALL_CATEGORIES: &str = "all";

/// Distinct categories in first-seen order.
pub fn derive_categories(store: &QuoteStore) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut categories = Vec::new();
    for quote in store {
        if seen.insert(quote.category.as_str()) {
            categories.push(quote.category.clone());
        }
    }
    categories
}

/// The wildcard followed by every derived category.
pub fn category_options(store: &QuoteStore) -> Vec<String> {
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(derive_categories(store))
        .collect()
}

/// Category selection used to narrow the quote pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn named(category: impl Into<String>) -> Self {
        Self::Named(category.into())
    }

    /// Parse a stored or user-typed selection. Empty and `all` mean no filter.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Named(value.to_string())
        }
    }

    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            Self::All => true,
            Self::Named(category) => quote.category == *category,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Named(category) => category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
