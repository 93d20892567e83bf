//! Windows Live identity provider: credential sign-in and refresh-token exchange.
//!
//! Sign-in scrapes the HTML sign-in page rather than using an OAuth device
//! flow. The tokens come back in the fragment of the redirect that follows the
//! credential POST:
//!
//! ```text
//! GET  authorize_url?client_id=..&response_type=token&display=touch&..   -> HTML with ServerData
//! POST ServerData.urlPost  (login, passwd, PPFT, ..)                      -> 302 Location: ..#access_token=..
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde_json::Value;
use xbl_config::LiveConfig;
use xbl_core::{Token, TokenKind};

use crate::error::{AuthError, require_valid};
use crate::http::{build_client, decode_pairs, form_encode, reject_server_error};
use crate::server_data::{ServerData, extract_js_object, has_js_object};
use crate::two_factor::{DeclineTwoFactor, TwoFactorHandler};

/// Marker object the provider embeds when a second factor is required.
const TWO_FACTOR_MARKER: &str = "PROOF.Type";

/// Access and refresh token issued together by one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTokens {
    pub access: Token,
    pub refresh: Token,
}

pub struct LiveClient {
    config: LiveConfig,
    http: reqwest::Client,
    /// Shares cookies with `http`; used only for the credential POST.
    no_redirect: reqwest::Client,
    two_factor: Arc<dyn TwoFactorHandler>,
}

impl std::fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LiveClient {
    /// Build a client with its own cookie jar. Two-factor challenges are
    /// declined until [`LiveClient::with_two_factor`] installs a handler.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Transport` if the HTTP client cannot be built.
    pub fn new(config: LiveConfig, timeout: Duration) -> Result<Self, AuthError> {
        let jar = Arc::new(Jar::default());
        Ok(Self {
            http: build_client(timeout, Some(Arc::clone(&jar)), true)?,
            no_redirect: build_client(timeout, Some(jar), false)?,
            config,
            two_factor: Arc::new(DeclineTwoFactor),
        })
    }

    #[must_use]
    pub fn with_two_factor(mut self, handler: Arc<dyn TwoFactorHandler>) -> Self {
        self.two_factor = handler;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &LiveConfig {
        &self.config
    }

    /// Sign in with a username and password.
    ///
    /// # Errors
    ///
    /// - `AuthError::AuthenticationFailed` if the credentials are rejected (no
    ///   redirect) or a two-factor challenge is declined
    /// - `AuthError::MalformedResponse` if the sign-in page or the redirect
    ///   fragment lacks an expected field
    /// - `AuthError::Transport` on network failure or a 5xx status
    pub async fn sign_in_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LiveTokens, AuthError> {
        let server_data = self.fetch_server_data().await?;
        tracing::debug!(url_post = %server_data.url_post, "posting credentials");

        let body = form_encode(&[
            ("login", username),
            ("passwd", password),
            ("PPFT", server_data.ppft.as_str()),
            ("PPSX", "Passpor"),
            ("SI", "Sign in"),
            ("type", "11"),
            ("NewUser", "1"),
            ("LoginOptions", "1"),
        ]);
        let response = self
            .no_redirect
            .post(&server_data.url_post)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        let response = reject_server_error(response)?;

        let mut location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let page = response.text().await?;

        if has_js_object(&page, TWO_FACTOR_MARKER) {
            tracing::info!(username, "identity provider requested a second factor");
            let challenge_data = extract_js_object(&page, ServerData::OBJECT_NAME)
                .ok()
                .flatten()
                .unwrap_or(Value::Null);
            let answer = self
                .two_factor
                .challenge(username, &challenge_data)
                .await?
                .ok_or_else(|| {
                    AuthError::AuthenticationFailed("two-factor authentication was not completed".into())
                })?;
            location = answer.location;
        }

        let location = location.ok_or_else(|| {
            AuthError::AuthenticationFailed(
                "sign-in did not redirect; check the username and password".into(),
            )
        })?;
        tokens_from_redirect(&location)
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` if `refresh_token` is not a valid refresh
    ///   token (no request is sent)
    /// - `AuthError::MalformedResponse` if the body is not JSON
    /// - `AuthError::AuthenticationFailed` if the provider issues no access token
    /// - `AuthError::Transport` on network failure or a 5xx status
    pub async fn refresh(&self, refresh_token: &Token) -> Result<LiveTokens, AuthError> {
        let refresh_token = require_valid(Some(refresh_token), TokenKind::RefreshToken)?;
        let url = format!(
            "{}?{}",
            self.config.token_url,
            form_encode(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", self.config.scope.as_str()),
                ("refresh_token", refresh_token.value()),
            ])
        );

        tracing::debug!(token_url = %self.config.token_url, "refreshing access token");
        let response = reject_server_error(self.http.get(&url).send().await?)?;
        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| AuthError::MalformedResponse(format!("refresh response is not JSON: {e}")))?;
        tokens_from_refresh_response(&json)
    }

    fn authorize_url(&self) -> String {
        format!(
            "{}?{}",
            self.config.authorize_url,
            form_encode(&[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "token"),
                ("display", "touch"),
                ("scope", self.config.scope.as_str()),
                ("locale", "en"),
            ])
        )
    }

    async fn fetch_server_data(&self) -> Result<ServerData, AuthError> {
        tracing::debug!(authorize_url = %self.config.authorize_url, "fetching sign-in page");
        let response = reject_server_error(self.http.get(self.authorize_url()).send().await?)?;
        let page = response.text().await?;
        ServerData::from_page(&page)
    }
}

/// Read the issued tokens from the fragment of the post-sign-in redirect.
///
/// # Errors
///
/// Returns `AuthError::MalformedResponse` if the fragment is missing or lacks
/// `access_token`, `expires_in`, or `refresh_token`.
pub fn tokens_from_redirect(location: &str) -> Result<LiveTokens, AuthError> {
    let (_, fragment) = location.split_once('#').ok_or_else(|| {
        AuthError::MalformedResponse("redirect location has no fragment".into())
    })?;
    let pairs = decode_pairs(fragment)?;
    let field = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| AuthError::MalformedResponse(format!("redirect fragment has no {name}")))
    };

    let expires_in = field("expires_in")?;
    let expires_in = expires_in.parse::<i64>().map_err(|e| {
        AuthError::MalformedResponse(format!("expires_in {expires_in:?} is not a number: {e}"))
    })?;
    Ok(LiveTokens {
        access: provider_access_token(field("access_token")?, expires_in)?,
        refresh: Token::refresh(field("refresh_token")?),
    })
}

fn tokens_from_refresh_response(json: &Value) -> Result<LiveTokens, AuthError> {
    let Some(access_token) = json.get("access_token").and_then(Value::as_str) else {
        let reason = json
            .get("error_description")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("no access_token in response");
        return Err(AuthError::AuthenticationFailed(format!("refresh rejected: {reason}")));
    };
    let expires_in = match json.get("expires_in") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AuthError::MalformedResponse("refresh response has no usable expires_in".into()))?;
    let refresh_token = json
        .get("refresh_token")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::MalformedResponse("refresh response has no refresh_token".into()))?;

    Ok(LiveTokens {
        access: provider_access_token(access_token, expires_in)?,
        refresh: Token::refresh(refresh_token),
    })
}

fn provider_access_token(value: &str, expires_in: i64) -> Result<Token, AuthError> {
    Token::access(value, expires_in).map_err(|e| AuthError::MalformedResponse(e.to_string()))
}
