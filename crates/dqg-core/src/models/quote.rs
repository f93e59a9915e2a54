//! Quote model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::util::non_blank;

/// Prefix of ids generated for locally created quotes.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Prefix of ids derived from remote records.
///
/// Remote ids never collide with generated local ids because of it.
pub const REMOTE_ID_PREFIX: &str = "srv-";

/// A unique identifier for a quote within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the stable id for a record coming from the remote source.
    pub fn remote(remote_id: impl fmt::Display) -> Self {
        Self(format!("{REMOTE_ID_PREFIX}{remote_id}"))
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id was derived from a remote record.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.0.starts_with(REMOTE_ID_PREFIX)
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QuoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Created or last edited on this device
    #[default]
    Local,
    /// Last written by the remote source
    Server,
    /// Brought in from an imported document
    Import,
}

impl QuoteSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Server => "server",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QuoteSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "local" => Ok(Self::Local),
            "server" => Ok(Self::Server),
            "import" => Ok(Self::Import),
            other => Err(Error::InvalidInput(format!("Unknown quote source: {other}"))),
        }
    }
}

/// A quote in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique identifier
    pub id: QuoteId,
    /// Quote text, trimmed and never empty
    pub text: String,
    /// Free-form category label, trimmed and never empty
    pub category: String,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Provenance marker
    pub source: QuoteSource,
}

impl Quote {
    /// Create a quote, trimming `text` and `category`.
    ///
    /// Fails when either is empty after trimming.
    pub fn new(
        id: QuoteId,
        text: impl Into<String>,
        category: impl Into<String>,
        updated_at: i64,
        source: QuoteSource,
    ) -> Result<Self> {
        let text = normalize_field(text.into(), "text")?;
        let category = normalize_field(category.into(), "category")?;

        Ok(Self {
            id,
            text,
            category,
            updated_at,
            source,
        })
    }

    /// Whether `other` carries the same text and category.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.text == other.text && self.category == other.category
    }

    /// Composite key used to detect duplicate quotes on import.
    #[must_use]
    pub fn content_key(&self) -> (String, String) {
        (self.text.clone(), self.category.clone())
    }
}

fn normalize_field(value: String, field: &str) -> Result<String> {
    non_blank(&value)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("Quote {field} cannot be empty")))
}
