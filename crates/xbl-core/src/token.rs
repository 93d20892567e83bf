//! Credential tokens issued by the identity provider and the platform.
//!
//! Every token has the same shape (opaque value, issue time, expiry time); the
//! six kinds differ only in which exchange produces them and which exchange
//! consumes them:
//!
//! ```text
//! identity provider:  AccessToken, RefreshToken
//! platform:           UserToken → (DeviceToken, TitleToken) → SessionToken
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::timestamp;

/// Lifetime the identity provider grants a refresh token. The provider does not
/// report it, so it is fixed here.
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 14;

// ---------------------------------------------------------------------------
// TokenKind
// ---------------------------------------------------------------------------

/// The six token kinds. Serialized with the tag names used in the token file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum TokenKind {
    AccessToken,
    RefreshToken,
    UserToken,
    DeviceToken,
    TitleToken,
    /// Final XSTS authorization token.
    #[serde(rename = "XSTSToken")]
    SessionToken,
}

impl TokenKind {
    /// All kinds, in exchange order.
    pub const ALL: [Self; 6] = [
        Self::AccessToken,
        Self::RefreshToken,
        Self::UserToken,
        Self::DeviceToken,
        Self::TitleToken,
        Self::SessionToken,
    ];

    /// Tag used in the token file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "AccessToken",
            Self::RefreshToken => "RefreshToken",
            Self::UserToken => "UserToken",
            Self::DeviceToken => "DeviceToken",
            Self::TitleToken => "TitleToken",
            Self::SessionToken => "XSTSToken",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTokenKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An immutable credential with its validity window.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    value: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Token {
    /// Build a token from explicit timestamps (e.g. `IssueInstant`/`NotAfter`).
    #[must_use]
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            issued_at: timestamp::normalize(issued_at),
            expires_at: timestamp::normalize(expires_at),
        }
    }

    /// Build a token issued now that lives for `lifetime`.
    #[must_use]
    pub fn issued_now(kind: TokenKind, value: impl Into<String>, lifetime: TimeDelta) -> Self {
        let issued_at = Utc::now();
        Self::new(kind, value, issued_at, issued_at + lifetime)
    }

    /// Fresh access token; `expires_in_secs` comes from the identity provider.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::LifetimeOutOfRange` when the expiry cannot be
    /// represented.
    pub fn access(value: impl Into<String>, expires_in_secs: i64) -> Result<Self, CoreError> {
        let issued_at = Utc::now();
        let expires_at = TimeDelta::try_seconds(expires_in_secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or(CoreError::LifetimeOutOfRange(expires_in_secs))?;
        Ok(Self::new(TokenKind::AccessToken, value, issued_at, expires_at))
    }

    /// Fresh refresh token with the fixed 14-day lifetime.
    #[must_use]
    pub fn refresh(value: impl Into<String>) -> Self {
        Self::issued_now(
            TokenKind::RefreshToken,
            value,
            TimeDelta::days(REFRESH_TOKEN_LIFETIME_DAYS),
        )
    }

    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The raw credential.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Strict validity: `expires_at > now`, in UTC, without tolerance.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Validity at an arbitrary instant. A token is invalid exactly at `expires_at`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Validity with a clock-skew allowance: the token must still be valid
    /// `skew` from now.
    #[must_use]
    pub fn is_valid_with_skew(&self, skew: TimeDelta) -> bool {
        self.is_valid_at(Utc::now() + skew)
    }

    /// Persisted form of this token.
    #[must_use]
    pub fn to_record(&self) -> TokenRecord {
        TokenRecord {
            name: self.kind,
            token: self.value.clone(),
            date_issued: self.issued_at,
            date_valid: self.expires_at,
        }
    }

    /// Restore a token verbatim from its persisted form.
    #[must_use]
    pub fn from_record(record: TokenRecord) -> Self {
        Self::new(
            record.name,
            record.token,
            record.date_issued,
            record.date_valid,
        )
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &self.kind)
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One entry of the token file's `tokens` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TokenRecord {
    pub name: TokenKind,
    pub token: String,
    #[serde(with = "crate::timestamp")]
    #[schemars(with = "String")]
    pub date_issued: DateTime<Utc>,
    #[serde(with = "crate::timestamp")]
    #[schemars(with = "String")]
    pub date_valid: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_expiring_at(expires_at: DateTime<Utc>) -> Token {
        Token::new(
            TokenKind::UserToken,
            "user-token",
            expires_at - TimeDelta::hours(1),
            expires_at,
        )
    }

    #[test]
    fn invalid_exactly_at_expiry() {
        let expiry = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let token = token_expiring_at(expiry);
        assert!(!token.is_valid_at(expiry));
    }

    #[test]
    fn valid_one_microsecond_before_expiry() {
        let expiry = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let token = token_expiring_at(expiry);
        assert!(token.is_valid_at(expiry - TimeDelta::microseconds(1)));
    }

    #[test]
    fn invalid_after_expiry() {
        let expiry = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let token = token_expiring_at(expiry);
        assert!(!token.is_valid_at(expiry + TimeDelta::seconds(1)));
    }

    #[test]
    fn access_token_uses_provider_lifetime() {
        let token = Token::access("access", 3600).unwrap();
        assert_eq!(token.kind(), TokenKind::AccessToken);
        assert_eq!(token.expires_at() - token.issued_at(), TimeDelta::seconds(3600));
        assert!(token.is_valid());
    }

    #[test]
    fn access_lifetime_out_of_range_is_an_error() {
        for secs in [i64::MAX, 9_999_999_999_999_999, 10_000_000_000_000] {
            let err = Token::access("access", secs).unwrap_err();
            assert!(matches!(err, CoreError::LifetimeOutOfRange(s) if s == secs));
        }
    }

    #[test]
    fn refresh_token_lives_fourteen_days() {
        let token = Token::refresh("refresh");
        assert_eq!(token.expires_at() - token.issued_at(), TimeDelta::days(14));
    }

    #[test]
    fn zero_lifetime_access_token_is_never_valid() {
        let token = Token::access("access", 0).unwrap();
        assert!(!token.is_valid());
    }

    #[test]
    fn skew_rejects_token_expiring_inside_window() {
        let token = Token::issued_now(TokenKind::SessionToken, "xsts", TimeDelta::seconds(30));
        assert!(token.is_valid_with_skew(TimeDelta::zero()));
        assert!(!token.is_valid_with_skew(TimeDelta::seconds(60)));
    }

    #[test]
    fn kind_tags_parse_back() {
        for kind in TokenKind::ALL {
            assert_eq!(kind.as_str().parse::<TokenKind>().unwrap(), kind);
        }
    }

    #[test]
    fn session_kind_uses_xsts_tag() {
        let json = serde_json::to_string(&TokenKind::SessionToken).unwrap();
        assert_eq!(json, "\"XSTSToken\"");
    }

    #[test]
    fn unknown_kind_tag_is_an_error() {
        let err = "BogusToken".parse::<TokenKind>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownTokenKind(ref tag) if tag == "BogusToken"));

        let json = r#"{"name":"BogusToken","token":"x","date_issued":"2024-01-01T00:00:00.000000Z","date_valid":"2024-01-01T01:00:00.000000Z"}"#;
        assert!(serde_json::from_str::<TokenRecord>(json).is_err());
    }

    #[test]
    fn debug_redacts_value() {
        let token = Token::access("very-secret", 60).unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn record_roundtrip_keeps_sub_second_precision() {
        let token = Token::access("access", 3600).unwrap();
        let json = serde_json::to_string(&token.to_record()).unwrap();
        let record: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Token::from_record(record), token);
    }
}
