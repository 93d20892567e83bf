//! # xbl-config
//!
//! Layered configuration loading for xblive using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`XBL_*` prefix, `__` as separator)
//! 2. Project-level `.xblive/config.toml`
//! 3. User-level `~/.config/xblive/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `XBL_GENERAL__TOKEN_FILE` -> `general.token_file`,
//! `XBL_XBOX__SANDBOX_ID` -> `xbox.sandbox_id`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use xbl_config::XblConfig;
//!
//! let config = XblConfig::load_with_dotenv().expect("config");
//! println!("sandbox: {}", config.xbox.sandbox_id);
//! ```

mod error;
mod general;
mod live;
mod xbox;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use live::LiveConfig;
pub use xbox::XboxConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct XblConfig {
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub xbox: XboxConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl XblConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`XblConfig::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed, or
    /// `ConfigError::InvalidValue` if the merged result fails [`XblConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`XblConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer more providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".xblive/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("XBL_").split("__"))
    }

    /// Reject values the HTTP layer cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero request timeout or an
    /// endpoint that does not parse as an `http(s)` URL with a host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.request_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let endpoints = [
            ("live.authorize_url", &self.live.authorize_url),
            ("live.token_url", &self.live.token_url),
            ("live.redirect_uri", &self.live.redirect_uri),
            ("xbox.user_auth_url", &self.xbox.user_auth_url),
            ("xbox.device_auth_url", &self.xbox.device_auth_url),
            ("xbox.title_auth_url", &self.xbox.title_auth_url),
            ("xbox.xsts_url", &self.xbox.xsts_url),
        ];
        for (field, raw) in endpoints {
            let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                field: field.into(),
                reason: format!("'{raw}' is not a valid URL: {e}"),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    reason: format!("'{raw}' is not an http(s) URL"),
                });
            }
        }

        if self.live.client_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "live.client_id".into(),
                reason: "must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("xblive").join("config.toml"))
    }
}
