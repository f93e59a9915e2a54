//! JSON import/export of the quote store.
//!
//! Two failure granularities coexist on import: a document that is not JSON
//! or not an array is rejected as a whole, while individual elements that do
//! not coerce into a quote are skipped and counted.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::ids::{Clock, IdGenerator};
use crate::models::{Quote, QuoteId, QuoteSource};
use crate::store::QuoteStore;
use crate::util::non_blank;

/// Default name for exported documents.
pub const EXPORT_FILE_NAME: &str = "quotes.json";

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Quotes appended to the store
    pub added: usize,
    /// Elements missing text or category
    pub skipped_invalid: usize,
    /// Elements whose text and category already exist
    pub skipped_duplicate: usize,
}

/// Serialize the full store, in store order.
pub fn export_document(store: &QuoteStore) -> Result<Value> {
    Ok(serde_json::to_value(store.as_slice())?)
}

/// Render the store as pretty-printed JSON.
pub fn render_json_export(store: &QuoteStore) -> serde_json::Result<String> {
    serde_json::to_string_pretty(store.as_slice())
}

/// Build a deterministic file name, optionally date-stamped.
#[must_use]
pub fn suggested_export_file_name(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || EXPORT_FILE_NAME.to_string(),
        |date| format!("quotes-{}.json", date.format("%Y-%m-%d")),
    )
}

/// Parse raw import text. Malformed JSON is a [`Error::Parse`].
pub fn parse_import_text(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Append the quotes of `doc` that are not already in `store`.
///
/// Quotes are deduplicated on exact `(text, category)` after trimming, both
/// against the store and within the document. A new quote whose id is already
/// taken gets a generated id.
pub fn import_document(
    doc: &Value,
    store: &mut QuoteStore,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<ImportReport> {
    let Value::Array(elements) = doc else {
        return Err(Error::InvalidFormat(
            "Expected a JSON array of quotes".to_string(),
        ));
    };

    let mut report = ImportReport::default();
    let mut seen = store.content_keys();
    let mut new_quotes = Vec::new();
    let mut taken_ids: HashSet<QuoteId> = HashSet::new();

    for element in elements {
        let Some(mut quote) = coerce_quote(element, ids, clock) else {
            report.skipped_invalid += 1;
            continue;
        };

        if !seen.insert(quote.content_key()) {
            report.skipped_duplicate += 1;
            continue;
        }

        while store.contains_id(&quote.id) || taken_ids.contains(&quote.id) {
            quote.id = ids.next_id();
        }
        taken_ids.insert(quote.id.clone());
        new_quotes.push(quote);
    }

    report.added = new_quotes.len();
    for quote in new_quotes {
        store.insert_unchecked(quote);
    }

    Ok(report)
}

#[allow(clippy::cast_possible_truncation)] // JSON numbers may carry fractional ms
fn coerce_quote(element: &Value, ids: &dyn IdGenerator, clock: &dyn Clock) -> Option<Quote> {
    let Value::Object(fields) = element else {
        return None;
    };

    let text = string_field(fields, "text")?;
    let category = string_field(fields, "category")?;
    let id = string_field(fields, "id").map_or_else(|| ids.next_id(), QuoteId::new);
    let updated_at = fields
        .get("updatedAt")
        .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|ms| ms as i64)))
        .unwrap_or_else(|| clock.now_ms());
    let source = fields
        .get("source")
        .and_then(Value::as_str)
        .and_then(|value| value.parse().ok())
        .unwrap_or(QuoteSource::Import);

    Quote::new(id, text, category, updated_at, source).ok()
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    non_blank(fields.get(key)?.as_str()?).map(str::to_string)
}
