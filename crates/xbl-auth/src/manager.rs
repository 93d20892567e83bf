//! The authentication state machine.
//!
//! ```text
//!              cached tokens usable?
//!   start ──► Refreshing ──► Authorizing ──► Authenticated ──► save
//!                 │ AuthenticationFailed / InvalidToken
//!                 ▼
//!           NeedsFullLogin ──► (credentials) sign in ──► Authorizing
//!                 │ (no credentials)
//!                 ▼
//!               Failed
//! ```
//!
//! Only `AuthenticationFailed` and `InvalidToken` from the cached phase lead to
//! the credential fallback; every other error aborts the attempt.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use xbl_config::XblConfig;
use xbl_core::{Token, TokenKind, TokenStore};

use crate::error::AuthError;
use crate::live::{LiveClient, LiveTokens};
use crate::token_file;
use crate::two_factor::TwoFactorHandler;
use crate::xbox::XboxLiveClient;

/// Upper bound on the configured clock skew (one day).
const MAX_CLOCK_SKEW_SECS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthPhase {
    NeedsFullLogin,
    Refreshing,
    Authorizing,
    Authenticated,
    Failed,
}

impl AuthPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NeedsFullLogin => "needs_full_login",
            Self::Refreshing => "refreshing",
            Self::Authorizing => "authorizing",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username and password for the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Drives one authentication attempt across both clients.
#[derive(Debug)]
pub struct AuthenticationManager {
    live: LiveClient,
    xbox: XboxLiveClient,
    token_file: Option<PathBuf>,
    clock_skew: TimeDelta,
    force_refresh: bool,
    device_and_title: bool,
}

impl AuthenticationManager {
    /// Manager with no token file, no clock skew, forced refresh, and the
    /// device/title exchanges off.
    #[must_use]
    pub fn new(live: LiveClient, xbox: XboxLiveClient) -> Self {
        Self {
            live,
            xbox,
            token_file: None,
            clock_skew: TimeDelta::zero(),
            force_refresh: true,
            device_and_title: false,
        }
    }

    /// Build both clients and the manager settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the configuration is invalid, or
    /// `AuthError::Transport` if an HTTP client cannot be built.
    pub fn from_config(config: &XblConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let timeout = Duration::from_secs(config.general.request_timeout_secs);
        let live = LiveClient::new(config.live.clone(), timeout)?;
        let xbox = XboxLiveClient::new(config.xbox.clone(), timeout)?;
        let skew = config.general.clock_skew_secs.min(MAX_CLOCK_SKEW_SECS);
        Ok(Self::new(live, xbox)
            .with_token_file(config.general.token_file_path())
            .with_clock_skew(TimeDelta::seconds(i64::try_from(skew).unwrap_or_default()))
            .with_force_refresh(config.general.force_refresh))
    }

    /// Where successful results are saved. `None` disables persistence.
    #[must_use]
    pub fn with_token_file(mut self, path: Option<PathBuf>) -> Self {
        self.token_file = path;
        self
    }

    /// Treat tokens expiring within `skew` as already expired.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: TimeDelta) -> Self {
        self.clock_skew = skew;
        self
    }

    /// When set, the access/refresh pair is refreshed on every attempt even if
    /// both are still valid.
    #[must_use]
    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Also obtain device and title tokens and pass them to authorization.
    #[must_use]
    pub fn with_device_and_title(mut self, enabled: bool) -> Self {
        self.device_and_title = enabled;
        self
    }

    #[must_use]
    pub fn with_two_factor(mut self, handler: Arc<dyn TwoFactorHandler>) -> Self {
        self.live = self.live.with_two_factor(handler);
        self
    }

    #[must_use]
    pub fn token_file(&self) -> Option<&std::path::Path> {
        self.token_file.as_deref()
    }

    /// The configured token file merged into `store`, or `store` unchanged.
    #[must_use]
    pub fn with_persisted(&self, store: TokenStore) -> TokenStore {
        match self.token_file.as_deref().and_then(token_file::load) {
            Some(persisted) => store.merge(&persisted),
            None => store,
        }
    }

    /// Run one authentication attempt.
    ///
    /// Tokens from the token file are merged into `store` first. The cached
    /// tokens are then refreshed and re-authorized; if that is rejected and
    /// `credentials` are given, a full sign-in runs instead. On success the
    /// store is saved to the token file and returned.
    ///
    /// # Errors
    ///
    /// - `AuthError::AuthenticationFailed` if neither path yields a session
    /// - `AuthError::TokenStore` if the result cannot be saved
    /// - any other error from the clients, which aborts the attempt
    pub async fn authenticate(
        &self,
        store: TokenStore,
        credentials: Option<&Credentials>,
    ) -> Result<TokenStore, AuthError> {
        let mut store = self.with_persisted(store);

        match self.authenticate_cached(&mut store).await {
            Ok(()) => {}
            Err(error) if error.requires_full_login() => {
                trace_phase(AuthPhase::NeedsFullLogin);
                tracing::info!(%error, "cached tokens rejected");
                if let Some(credentials) = credentials {
                    self.authenticate_with_credentials(&mut store, credentials)
                        .await
                        .inspect_err(|_| trace_phase(AuthPhase::Failed))?;
                }
            }
            Err(error) => {
                trace_phase(AuthPhase::Failed);
                return Err(error);
            }
        }

        if !store.is_authenticated() {
            trace_phase(AuthPhase::Failed);
            return Err(AuthError::AuthenticationFailed(
                "no valid tokens and no credentials to sign in with".into(),
            ));
        }
        trace_phase(AuthPhase::Authenticated);

        if let Some(path) = &self.token_file {
            token_file::save(path, &store)?;
        }
        Ok(store)
    }

    fn usable<'a>(&self, slot: Option<&'a Token>) -> Option<&'a Token> {
        slot.filter(|token| token.is_valid_with_skew(self.clock_skew))
    }

    async fn authenticate_cached(&self, store: &mut TokenStore) -> Result<(), AuthError> {
        trace_phase(AuthPhase::Refreshing);
        let pair_usable = self.usable(store.access_token.as_ref()).is_some()
            && self.usable(store.refresh_token.as_ref()).is_some();
        if self.force_refresh || !pair_usable {
            let refresh = self
                .usable(store.refresh_token.as_ref())
                .ok_or_else(|| AuthError::InvalidToken("no usable RefreshToken".into()))?;
            let tokens = self.live.refresh(refresh).await?;
            store_live_tokens(store, tokens);
        }

        if self.usable(store.user_token.as_ref()).is_none() {
            let access = required(self.usable(store.access_token.as_ref()), TokenKind::AccessToken)?;
            let user = self.xbox.issue_user_token(access).await?;
            store.set(user);
        }

        trace_phase(AuthPhase::Authorizing);
        if self.usable(store.session_token.as_ref()).is_some() && store.userinfo.is_some() {
            return Ok(());
        }
        self.authorize(store, false).await
    }

    async fn authenticate_with_credentials(
        &self,
        store: &mut TokenStore,
        credentials: &Credentials,
    ) -> Result<(), AuthError> {
        tracing::info!(username = %credentials.username, "signing in with credentials");
        let tokens = self
            .live
            .sign_in_with_credentials(&credentials.username, &credentials.password)
            .await?;
        store_live_tokens(store, tokens);

        let access = required(store.access_token.as_ref(), TokenKind::AccessToken)?;
        let user = self.xbox.issue_user_token(access).await?;
        store.set(user);

        trace_phase(AuthPhase::Authorizing);
        self.authorize(store, true).await
    }

    /// Final authorization, with device/title tokens when enabled. `reissue`
    /// requests new device/title tokens even if the cached ones are usable.
    async fn authorize(&self, store: &mut TokenStore, reissue: bool) -> Result<(), AuthError> {
        if self.device_and_title {
            self.ensure_device_and_title(store, reissue).await?;
        }
        let user = required(store.user_token.as_ref(), TokenKind::UserToken)?;
        let (device, title) = if self.device_and_title {
            (store.device_token.as_ref(), store.title_token.as_ref())
        } else {
            (None, None)
        };

        let (session, identity) = self.xbox.authorize(user, device, title).await?;
        store.set(session);
        store.userinfo = Some(identity);
        Ok(())
    }

    async fn ensure_device_and_title(
        &self,
        store: &mut TokenStore,
        reissue: bool,
    ) -> Result<(), AuthError> {
        if reissue || self.usable(store.device_token.as_ref()).is_none() {
            let access = required(store.access_token.as_ref(), TokenKind::AccessToken)?;
            let device = self.xbox.issue_device_token(access).await?;
            store.set(device);
        }
        if reissue || self.usable(store.title_token.as_ref()).is_none() {
            let access = required(store.access_token.as_ref(), TokenKind::AccessToken)?;
            let device = required(store.device_token.as_ref(), TokenKind::DeviceToken)?;
            let title = self.xbox.issue_title_token(device, access).await?;
            store.set(title);
        }
        Ok(())
    }
}

fn store_live_tokens(store: &mut TokenStore, tokens: LiveTokens) {
    store.set(tokens.access);
    store.set(tokens.refresh);
}

fn required(slot: Option<&Token>, kind: TokenKind) -> Result<&Token, AuthError> {
    slot.ok_or_else(|| AuthError::InvalidToken(format!("no usable {kind}")))
}

fn trace_phase(phase: AuthPhase) {
    tracing::info!(%phase, "authentication phase");
}
