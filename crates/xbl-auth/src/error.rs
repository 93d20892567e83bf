use thiserror::Error;
use xbl_core::{Token, TokenKind};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Network, DNS, timeout, or a server-side (5xx) failure. Worth retrying.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response did not have the expected HTML/JSON structure.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An exchange was attempted with an absent, expired, or wrong-kind token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The identity provider or the platform rejected the credentials or token.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The token file could not be written or removed.
    #[error("token store error: {0}")]
    TokenStore(String),

    #[error(transparent)]
    Config(#[from] xbl_config::ConfigError),
}

impl AuthError {
    /// Errors that send the orchestrator to credential sign-in instead of aborting.
    #[must_use]
    pub const fn requires_full_login(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::InvalidToken(_))
    }
}

/// Check that `slot` holds a currently valid token of `expected` kind.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` when the slot is empty, expired, or holds
/// a different kind.
pub fn require_valid(slot: Option<&Token>, expected: TokenKind) -> Result<&Token, AuthError> {
    let token = slot.ok_or_else(|| AuthError::InvalidToken(format!("no {expected}")))?;
    if token.kind() != expected {
        return Err(AuthError::InvalidToken(format!(
            "expected {expected}, got {}",
            token.kind()
        )));
    }
    if !token.is_valid() {
        return Err(AuthError::InvalidToken(format!(
            "{expected} expired at {}",
            token.expires_at()
        )));
    }
    Ok(token)
}
