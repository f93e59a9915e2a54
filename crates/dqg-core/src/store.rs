//! In-memory quote store.
//!
//! An ordered collection of quotes with an id index. Insertion order is
//! preserved; ids are unique; text and category are never empty.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;

use crate::categories::CategoryFilter;
use crate::error::{Error, Result};
use crate::ids::{Clock, IdGenerator};
use crate::models::{Quote, QuoteId, QuoteSource};

/// Quotes seeded into an empty store on first run: `(text, category)`.
pub const DEFAULT_QUOTES: [(&str, &str); 3] = [
    (
        "The best way to predict the future is to create it.",
        "Motivation",
    ),
    (
        "Life is what happens when you're busy making other plans.",
        "Life",
    ),
    ("Do or do not. There is no try.", "Wisdom"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteStore {
    quotes: Vec<Quote>,
    index: HashMap<QuoteId, usize>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from quotes, keeping the first occurrence of each id.
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let mut store = Self::new();
        for quote in quotes {
            if store.contains_id(&quote.id) {
                tracing::warn!("Dropping quote with duplicate id {}", quote.id);
                continue;
            }
            store.insert_unchecked(quote);
        }
        store
    }

    /// Store holding the default quotes, all tagged `local`.
    pub fn seeded(ids: &dyn IdGenerator, clock: &dyn Clock) -> Self {
        let now = clock.now_ms();
        Self::from_quotes(DEFAULT_QUOTES.iter().map(|(text, category)| Quote {
            id: ids.next_id(),
            text: (*text).to_string(),
            category: (*category).to_string(),
            updated_at: now,
            source: QuoteSource::Local,
        }))
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Quote> {
        self.quotes.iter()
    }

    pub fn as_slice(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn get(&self, id: &QuoteId) -> Option<&Quote> {
        self.index.get(id).map(|&position| &self.quotes[position])
    }

    pub(crate) fn get_mut(&mut self, id: &QuoteId) -> Option<&mut Quote> {
        self.index
            .get(id)
            .copied()
            .map(move |position| &mut self.quotes[position])
    }

    pub fn contains_id(&self, id: &QuoteId) -> bool {
        self.index.contains_key(id)
    }

    /// Set of `(text, category)` pairs currently present.
    pub fn content_keys(&self) -> HashSet<(String, String)> {
        self.quotes.iter().map(Quote::content_key).collect()
    }

    /// Append a quote. Fails when the id is already taken.
    pub fn push(&mut self, quote: Quote) -> Result<()> {
        if self.contains_id(&quote.id) {
            return Err(Error::InvalidInput(format!(
                "Quote id already exists: {}",
                quote.id
            )));
        }
        self.insert_unchecked(quote);
        Ok(())
    }

    /// Replace the quote stored under `quote.id`, returning the previous copy.
    pub fn replace(&mut self, quote: Quote) -> Result<Quote> {
        let slot = self
            .get_mut(&quote.id)
            .ok_or_else(|| Error::NotFound(quote.id.to_string()))?;
        Ok(std::mem::replace(slot, quote))
    }

    /// Create a new local quote with a generated id.
    pub fn add(
        &mut self,
        text: &str,
        category: &str,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<Quote> {
        let mut id = ids.next_id();
        while self.contains_id(&id) {
            id = ids.next_id();
        }
        let quote = Quote::new(id, text, category, clock.now_ms(), QuoteSource::Local)?;
        self.insert_unchecked(quote.clone());
        Ok(quote)
    }

    /// Replace a quote's text as a local edit.
    pub fn edit_text(&mut self, id: &QuoteId, text: &str, clock: &dyn Clock) -> Result<Quote> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("Quote text cannot be empty".to_string()));
        }
        let quote = self
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        quote.text = text.to_string();
        quote.updated_at = clock.now_ms();
        quote.source = QuoteSource::Local;
        Ok(quote.clone())
    }

    /// Quotes matching `filter`, in store order.
    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<&Quote> {
        self.quotes
            .iter()
            .filter(|quote| filter.matches(quote))
            .collect()
    }

    /// A uniformly random quote matching `filter`.
    pub fn random(&self, filter: &CategoryFilter) -> Option<&Quote> {
        self.filtered(filter)
            .choose(&mut rand::thread_rng())
            .copied()
    }

    // Caller guarantees the id is not taken.
    pub(crate) fn insert_unchecked(&mut self, quote: Quote) {
        self.index.insert(quote.id.clone(), self.quotes.len());
        self.quotes.push(quote);
    }
}

impl<'a> IntoIterator for &'a QuoteStore {
    type Item = &'a Quote;
    type IntoIter = std::slice::Iter<'a, Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
