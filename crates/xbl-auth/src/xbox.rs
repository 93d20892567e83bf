//! Xbox Live platform: user/device/title token issuance and XSTS authorization.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use xbl_config::XboxConfig;
use xbl_core::{Token, TokenKind, UserIdentity};

use crate::error::{AuthError, require_valid};
use crate::http::{build_client, reject_server_error};

pub const CONTRACT_VERSION_HEADER: &str = "x-xbl-contract-version";
const CONTRACT_VERSION: &str = "1";

const AUTH_RELYING_PARTY: &str = "http://auth.xboxlive.com";
const XSTS_RELYING_PARTY: &str = "http://xboxlive.com";
const RPS_SITE_NAME: &str = "user.auth.xboxlive.com";

/// Success body shared by every platform token endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IssuedToken {
    token: String,
    #[serde(with = "xbl_core::timestamp")]
    issue_instant: DateTime<Utc>,
    #[serde(with = "xbl_core::timestamp")]
    not_after: DateTime<Utc>,
    #[serde(default)]
    display_claims: Option<DisplayClaims>,
}

#[derive(Debug, Deserialize)]
struct DisplayClaims {
    #[serde(default)]
    xui: Vec<Value>,
}

/// Rejection body returned with 401/403 by the XSTS endpoint.
#[derive(Debug, Default, Deserialize)]
struct Rejection {
    #[serde(rename = "XErr")]
    xerr: Option<u64>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct XboxLiveClient {
    config: XboxConfig,
    http: reqwest::Client,
}

impl XboxLiveClient {
    /// # Errors
    ///
    /// Returns `AuthError::Transport` if the HTTP client cannot be built.
    pub fn new(config: XboxConfig, timeout: Duration) -> Result<Self, AuthError> {
        Ok(Self {
            http: build_client(timeout, None, true)?,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &XboxConfig {
        &self.config
    }

    /// Exchange an access token for a user token.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` if `access` is not a valid access token
    /// - `AuthError::AuthenticationFailed` on a 4xx status
    /// - `AuthError::MalformedResponse` if the body lacks `Token`/`IssueInstant`/`NotAfter`
    /// - `AuthError::Transport` on network failure or a 5xx status
    pub async fn issue_user_token(&self, access: &Token) -> Result<Token, AuthError> {
        let access = require_valid(Some(access), TokenKind::AccessToken)?;
        let body = rps_request(access, None);
        let issued = self.post_contract(&self.config.user_auth_url, &body).await?;
        Ok(issued.into_token(TokenKind::UserToken))
    }

    /// Exchange an access token for a device token.
    ///
    /// # Errors
    ///
    /// Same as [`XboxLiveClient::issue_user_token`].
    pub async fn issue_device_token(&self, access: &Token) -> Result<Token, AuthError> {
        let access = require_valid(Some(access), TokenKind::AccessToken)?;
        let body = rps_request(access, None);
        let issued = self.post_contract(&self.config.device_auth_url, &body).await?;
        Ok(issued.into_token(TokenKind::DeviceToken))
    }

    /// Exchange a device token plus an access token for a title token.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidToken` unless both tokens are valid; otherwise the
    /// same as [`XboxLiveClient::issue_user_token`].
    pub async fn issue_title_token(&self, device: &Token, access: &Token) -> Result<Token, AuthError> {
        let device = require_valid(Some(device), TokenKind::DeviceToken)?;
        let access = require_valid(Some(access), TokenKind::AccessToken)?;
        let body = rps_request(access, Some(device));
        let issued = self.post_contract(&self.config.title_auth_url, &body).await?;
        Ok(issued.into_token(TokenKind::TitleToken))
    }

    /// Obtain the session (XSTS) token and the identity claims it carries.
    ///
    /// Device and title tokens are included only when given.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` if `user` is not a valid user token
    /// - `AuthError::AuthenticationFailed` on a 4xx status (the `XErr` code is
    ///   included in the message)
    /// - `AuthError::MalformedResponse` if the body lacks the token fields or
    ///   `DisplayClaims.xui[0]`
    /// - `AuthError::Transport` on network failure or a 5xx status
    pub async fn authorize(
        &self,
        user: &Token,
        device: Option<&Token>,
        title: Option<&Token>,
    ) -> Result<(Token, UserIdentity), AuthError> {
        let user = require_valid(Some(user), TokenKind::UserToken)?;
        let body = self.authorize_request(user, device, title);
        let issued = self.post_contract(&self.config.xsts_url, &body).await?;

        let claims = issued
            .display_claims
            .as_ref()
            .and_then(|claims| claims.xui.first())
            .cloned()
            .ok_or_else(|| {
                AuthError::MalformedResponse("authorization response has no DisplayClaims.xui".into())
            })?;
        let identity: UserIdentity = serde_json::from_value(claims)
            .map_err(|e| AuthError::MalformedResponse(format!("DisplayClaims.xui[0]: {e}")))?;

        tracing::debug!(gamertag = %identity.gamertag, "xsts authorization succeeded");
        Ok((issued.into_token(TokenKind::SessionToken), identity))
    }

    fn authorize_request(&self, user: &Token, device: Option<&Token>, title: Option<&Token>) -> Value {
        let mut properties = json!({
            "UserTokens": [user.value()],
            "SandboxId": self.config.sandbox_id,
        });
        if let Some(device) = device {
            properties["DeviceToken"] = Value::from(device.value());
        }
        if let Some(title) = title {
            properties["TitleToken"] = Value::from(title.value());
        }
        json!({
            "RelyingParty": XSTS_RELYING_PARTY,
            "TokenType": "JWT",
            "Properties": properties,
        })
    }

    async fn post_contract(&self, url: &str, body: &Value) -> Result<IssuedToken, AuthError> {
        tracing::debug!(url, "platform token request");
        let response = self
            .http
            .post(url)
            .header(CONTRACT_VERSION_HEADER, CONTRACT_VERSION)
            .json(body)
            .send()
            .await?;
        let response = reject_server_error(response)?;
        let status = response.status();

        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::AuthenticationFailed(describe_rejection(url, status, &text)));
        }
        if !status.is_success() {
            return Err(AuthError::MalformedResponse(format!(
                "unexpected status {status} from {url}"
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| AuthError::MalformedResponse(format!("token response from {url}: {e}")))
    }
}

impl IssuedToken {
    fn into_token(self, kind: TokenKind) -> Token {
        Token::new(kind, self.token, self.issue_instant, self.not_after)
    }
}

/// Body for the RPS-ticket exchanges (user, device, and title endpoints).
fn rps_request(access: &Token, device: Option<&Token>) -> Value {
    let mut properties = json!({
        "AuthMethod": "RPS",
        "SiteName": RPS_SITE_NAME,
        "RpsTicket": access.value(),
    });
    if let Some(device) = device {
        properties["DeviceToken"] = Value::from(device.value());
    }
    json!({
        "RelyingParty": AUTH_RELYING_PARTY,
        "TokenType": "JWT",
        "Properties": properties,
    })
}

fn describe_rejection(url: &str, status: StatusCode, body: &str) -> String {
    let rejection: Rejection = serde_json::from_str(body).unwrap_or_default();
    let mut message = format!("{url} returned {status}");
    if let Some(code) = rejection.xerr {
        message.push_str(&format!(" (XErr {code}"));
        if let Some(hint) = xerr_hint(code) {
            message.push_str(&format!(": {hint}"));
        }
        message.push(')');
    }
    if let Some(detail) = rejection.message.filter(|m| !m.is_empty()) {
        message.push_str(&format!(": {detail}"));
    }
    message
}

const fn xerr_hint(code: u64) -> Option<&'static str> {
    match code {
        2_148_916_233 => Some("account has no Xbox profile"),
        2_148_916_235 => Some("Xbox Live is not available in the account's region"),
        2_148_916_236 | 2_148_916_237 => Some("adult verification required"),
        2_148_916_238 => Some("child account must be added to a family"),
        _ => None,
    }
}
