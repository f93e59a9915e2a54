//! Application configuration.
//!
//! Stored as a JSON file; every field is optional and falls back to the
//! defaults below. Values are normalized on load.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{has_http_scheme, non_blank};

/// Mock server queried by default.
pub const DEFAULT_SERVER_URL: &str = "https://jsonplaceholder.typicode.com/posts?_limit=5";
/// Category assigned to every remote quote.
pub const DEFAULT_SERVER_CATEGORY: &str = "Server";
pub const DEFAULT_AUTO_SYNC_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_server_category")]
    pub server_category: String,
    #[serde(default = "default_auto_sync_interval_secs")]
    pub auto_sync_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_server_category() -> String {
    DEFAULT_SERVER_CATEGORY.to_string()
}

const fn default_auto_sync_interval_secs() -> u64 {
    DEFAULT_AUTO_SYNC_INTERVAL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            server_category: default_server_category(),
            auto_sync_interval_secs: DEFAULT_AUTO_SYNC_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load config from `path`, returning defaults when the file is missing.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse and normalize a raw JSON config.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut config = serde_json::from_str::<Self>(raw)?;
        config.normalize()?;
        Ok(config)
    }

    pub const fn auto_sync_interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalize(&mut self) -> Result<()> {
        let server_url =
            non_blank(&self.server_url).map_or_else(default_server_url, str::to_string);
        if !has_http_scheme(&server_url) {
            return Err(Error::InvalidInput(
                "server_url must include http:// or https://".to_string(),
            ));
        }
        self.server_url = server_url;
        self.server_category =
            non_blank(&self.server_category).map_or_else(default_server_category, str::to_string);
        if self.auto_sync_interval_secs == 0 {
            self.auto_sync_interval_secs = DEFAULT_AUTO_SYNC_INTERVAL_SECS;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        Ok(())
    }
}
