//! Extension point for accounts that require a second sign-in factor.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AuthError;

/// Outcome of a completed second-factor challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// Redirect target carrying the token fragment, as the credential POST
    /// would have returned it. `None` means the challenge did not complete.
    pub location: Option<String>,
}

/// Completes a second-factor challenge raised during credential sign-in.
///
/// `server_data` is the `ServerData` object from the challenge page, or
/// `Value::Null` if the page carried none.
#[async_trait]
pub trait TwoFactorHandler: Send + Sync {
    /// Returns `Ok(None)` to decline the challenge.
    async fn challenge(
        &self,
        username: &str,
        server_data: &Value,
    ) -> Result<Option<ChallengeResponse>, AuthError>;
}

/// Declines every challenge, so two-factor accounts fail with
/// `AuthError::AuthenticationFailed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineTwoFactor;

#[async_trait]
impl TwoFactorHandler for DeclineTwoFactor {
    async fn challenge(
        &self,
        username: &str,
        _server_data: &Value,
    ) -> Result<Option<ChallengeResponse>, AuthError> {
        tracing::warn!(username, "two-factor authentication required but no handler is configured");
        Ok(None)
    }
}
