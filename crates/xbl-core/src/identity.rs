use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Claims returned alongside the final session token (`DisplayClaims.xui[0]`).
///
/// Produced by `xbl-auth` when authorization succeeds, consumed by anything
/// that needs the authorization header or the numeric user id. Field names
/// on the wire are the platform's abbreviations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserIdentity {
    /// Xbox user id (`xid`).
    #[serde(rename = "xid")]
    pub xuid: String,
    /// Per-session user hash (`uhs`), part of the authorization header.
    #[serde(rename = "uhs")]
    pub userhash: String,
    /// Display name (`gtg`).
    #[serde(rename = "gtg", default)]
    pub gamertag: String,
    /// Age-group classification (`agg`, e.g. `"Adult"`).
    #[serde(rename = "agg", default)]
    pub age_group: String,
    /// Account-level privileges (`prv`), space-separated ids.
    #[serde(rename = "prv", default)]
    pub privileges: String,
    /// Session-level user privileges (`usr`), space-separated ids.
    #[serde(rename = "usr", default)]
    pub user_privileges: String,
}

impl UserIdentity {
    /// The user id as a number, the form the platform APIs expect in URLs.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `xid` is not an unsigned integer.
    pub fn xuid_numeric(&self) -> Result<u64, CoreError> {
        self.xuid
            .trim()
            .parse()
            .map_err(|e| CoreError::Validation(format!("xuid '{}' is not numeric: {e}", self.xuid)))
    }

    /// Account-level privilege ids. Tokens that are not numbers are skipped.
    #[must_use]
    pub fn privilege_ids(&self) -> Vec<u32> {
        parse_id_list(&self.privileges)
    }

    /// Session-level privilege ids. Tokens that are not numbers are skipped.
    #[must_use]
    pub fn user_privilege_ids(&self) -> Vec<u32> {
        parse_id_list(&self.user_privileges)
    }
}

fn parse_id_list(raw: &str) -> Vec<u32> {
    raw.split_whitespace()
        .filter_map(|part| part.parse().ok())
        .collect()
}
