//! Shape of the persisted token file.
//!
//! ```json
//! {
//!   "tokens": [
//!     {"name": "AccessToken", "token": "...", "date_issued": "...Z", "date_valid": "...Z"}
//!   ],
//!   "userinfo": {"xid": "...", "uhs": "...", "gtg": "...", "agg": "...", "prv": "...", "usr": "..."}
//! }
//! ```
//!
//! Only access, refresh, user and session tokens are written. Device and title
//! tokens are never saved even though the file format can carry them; files that
//! do carry them still load.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::identity::UserIdentity;
use crate::token::{TokenKind, TokenRecord};

/// Token kinds written on save, in file order.
pub const SAVED_KINDS: [TokenKind; 4] = [
    TokenKind::AccessToken,
    TokenKind::RefreshToken,
    TokenKind::UserToken,
    TokenKind::SessionToken,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TokenFile {
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
    #[serde(default)]
    pub userinfo: Option<UserIdentity>,
}

impl TokenFile {
    /// Parse the file contents. Any unknown token kind fails the whole file.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Json` for malformed JSON, unknown kinds, or bad timestamps.
    pub fn from_json(contents: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Render with 2-space indentation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_an_empty_file() {
        let file = TokenFile::from_json("{}").unwrap();
        assert!(file.tokens.is_empty());
        assert!(file.userinfo.is_none());
    }

    #[test]
    fn null_userinfo_is_accepted() {
        let file = TokenFile::from_json(r#"{"tokens": [], "userinfo": null}"#).unwrap();
        assert!(file.userinfo.is_none());
    }

    #[test]
    fn unknown_kind_fails_the_file() {
        let json = r#"{"tokens": [{"name": "WhoKnows", "token": "x",
            "date_issued": "2024-01-01T00:00:00.000000Z",
            "date_valid": "2024-01-01T01:00:00.000000Z"}]}"#;
        assert!(TokenFile::from_json(json).is_err());
    }

    #[test]
    fn pretty_output_uses_two_space_indent() {
        let rendered = TokenFile::default().to_json_pretty().unwrap();
        assert!(rendered.contains("\n  \"tokens\""));
    }

    #[test]
    fn saved_kinds_exclude_device_and_title() {
        assert!(!SAVED_KINDS.contains(&TokenKind::DeviceToken));
        assert!(!SAVED_KINDS.contains(&TokenKind::TitleToken));
    }
}
