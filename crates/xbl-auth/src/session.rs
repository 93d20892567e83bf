//! Authorized handle for platform API clients.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use xbl_core::TokenStore;

use crate::error::AuthError;
use crate::http::client_builder;

/// What a platform API client needs from a completed authentication: the
/// numeric user id and an HTTP client that sends the authorization header on
/// every request.
#[derive(Debug, Clone)]
pub struct ApiSession {
    xuid: u64,
    userhash: String,
    authorization: String,
    http: reqwest::Client,
}

impl ApiSession {
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` if `store` is not authenticated
    /// - `AuthError::MalformedResponse` if the identity's `xid` is not numeric
    ///   or the header value contains invalid characters
    /// - `AuthError::Transport` if the HTTP client cannot be built
    pub fn from_store(store: &TokenStore, timeout: Duration) -> Result<Self, AuthError> {
        if !store.is_authenticated() {
            return Err(AuthError::InvalidToken(
                "token store holds no valid session; run `xbl auth login`".into(),
            ));
        }
        let (Some(identity), Some(authorization)) = (&store.userinfo, store.authorization_header())
        else {
            return Err(AuthError::InvalidToken("token store has no identity".into()));
        };
        let xuid = identity
            .xuid_numeric()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let mut header = HeaderValue::from_str(&authorization)
            .map_err(|e| AuthError::MalformedResponse(format!("authorization header: {e}")))?;
        header.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header);

        let http = client_builder(timeout).default_headers(headers).build()?;

        Ok(Self {
            xuid,
            userhash: identity.userhash.clone(),
            authorization,
            http,
        })
    }

    #[must_use]
    pub const fn xuid(&self) -> u64 {
        self.xuid
    }

    #[must_use]
    pub fn userhash(&self) -> &str {
        &self.userhash
    }

    /// `XBL3.0 x=<userhash>;<session token>`.
    #[must_use]
    pub fn authorization_header(&self) -> &str {
        &self.authorization
    }

    /// Client that sends the authorization header by default.
    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }
}
