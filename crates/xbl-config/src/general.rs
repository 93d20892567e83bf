//! General authentication behaviour.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default per-request timeout.
const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_force_refresh() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Where the token file lives. Defaults to `~/.xblive/tokens.json`.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Timeout applied to every individual HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Tokens expiring within this many seconds are treated as already expired.
    #[serde(default)]
    pub clock_skew_secs: u64,

    /// Refresh the access/refresh pair even when both are still valid.
    #[serde(default = "default_force_refresh")]
    pub force_refresh: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            token_file: None,
            request_timeout_secs: default_request_timeout_secs(),
            clock_skew_secs: 0,
            force_refresh: default_force_refresh(),
        }
    }
}

impl GeneralConfig {
    /// The configured token file, or `~/.xblive/tokens.json`.
    ///
    /// `None` only when no path is configured and the home directory is unknown.
    #[must_use]
    pub fn token_file_path(&self) -> Option<PathBuf> {
        self.token_file
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".xblive").join("tokens.json")))
    }
}
