//! The bundle of token slots carried between authentication runs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identity::UserIdentity;
use crate::persisted::{SAVED_KINDS, TokenFile};
use crate::token::{Token, TokenKind};

/// State of a single slot. Absence and expiry are different states even though
/// the merge policy treats them alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Absent,
    Valid,
    Expired,
}

impl SlotState {
    #[must_use]
    pub fn of(slot: Option<&Token>, now: DateTime<Utc>) -> Self {
        match slot {
            None => Self::Absent,
            Some(token) if token.is_valid_at(now) => Self::Valid,
            Some(_) => Self::Expired,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Valid => "valid",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Up to six token slots plus the resolved identity.
///
/// Slots are replaced whole, never edited in place. Not synchronized: one
/// authentication attempt owns the store at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStore {
    pub access_token: Option<Token>,
    pub refresh_token: Option<Token>,
    pub user_token: Option<Token>,
    pub device_token: Option<Token>,
    pub title_token: Option<Token>,
    pub session_token: Option<Token>,
    pub userinfo: Option<UserIdentity>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot holding tokens of `kind`.
    #[must_use]
    pub const fn slot(&self, kind: TokenKind) -> Option<&Token> {
        match kind {
            TokenKind::AccessToken => self.access_token.as_ref(),
            TokenKind::RefreshToken => self.refresh_token.as_ref(),
            TokenKind::UserToken => self.user_token.as_ref(),
            TokenKind::DeviceToken => self.device_token.as_ref(),
            TokenKind::TitleToken => self.title_token.as_ref(),
            TokenKind::SessionToken => self.session_token.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: TokenKind) -> &mut Option<Token> {
        match kind {
            TokenKind::AccessToken => &mut self.access_token,
            TokenKind::RefreshToken => &mut self.refresh_token,
            TokenKind::UserToken => &mut self.user_token,
            TokenKind::DeviceToken => &mut self.device_token,
            TokenKind::TitleToken => &mut self.title_token,
            TokenKind::SessionToken => &mut self.session_token,
        }
    }

    /// Put a token into the slot matching its kind, replacing what was there.
    pub fn set(&mut self, token: Token) {
        let kind = token.kind();
        *self.slot_mut(kind) = Some(token);
    }

    /// Merge with a persisted store, evaluated now. See [`TokenStore::merge_at`].
    #[must_use]
    pub fn merge(&self, persisted: &Self) -> Self {
        self.merge_at(persisted, Utc::now())
    }

    /// Per slot, keep the in-memory token unless it is absent or invalid and the
    /// persisted token is present and valid. Identity is taken from `persisted`
    /// only when absent here. Neither input is modified.
    #[must_use]
    pub fn merge_at(&self, persisted: &Self, now: DateTime<Utc>) -> Self {
        let mut merged = self.clone();
        for kind in TokenKind::ALL {
            let current_usable = self.slot(kind).is_some_and(|t| t.is_valid_at(now));
            let persisted_usable = persisted.slot(kind).is_some_and(|t| t.is_valid_at(now));
            if !current_usable && persisted_usable {
                *merged.slot_mut(kind) = persisted.slot(kind).cloned();
            }
        }
        if merged.userinfo.is_none() {
            merged.userinfo.clone_from(&persisted.userinfo);
        }
        merged
    }

    /// Per-slot state at `now`, in exchange order.
    #[must_use]
    pub fn slot_states(&self, now: DateTime<Utc>) -> Vec<(TokenKind, SlotState)> {
        TokenKind::ALL
            .into_iter()
            .map(|kind| (kind, SlotState::of(self.slot(kind), now)))
            .collect()
    }

    /// Session token valid and identity present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session_token.as_ref().is_some_and(Token::is_valid) && self.userinfo.is_some()
    }

    /// `XBL3.0 x=<userhash>;<session token>`, when both parts are present.
    ///
    /// Validity is not checked here; callers that care use [`TokenStore::is_authenticated`].
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        let session = self.session_token.as_ref()?;
        let identity = self.userinfo.as_ref()?;
        Some(format!("XBL3.0 x={};{}", identity.userhash, session.value()))
    }

    /// Persisted shape: present access/refresh/user/session tokens and the identity.
    #[must_use]
    pub fn to_file(&self) -> TokenFile {
        TokenFile {
            tokens: SAVED_KINDS
                .into_iter()
                .filter_map(|kind| self.slot(kind).map(Token::to_record))
                .collect(),
            userinfo: self.userinfo.clone(),
        }
    }

    /// Hydrate from the persisted shape. Expired tokens are kept as-is; a later
    /// record of the same kind replaces an earlier one.
    #[must_use]
    pub fn from_file(file: TokenFile) -> Self {
        let mut store = Self::new();
        for record in file.tokens {
            store.set(Token::from_record(record));
        }
        store.userinfo = file.userinfo;
        store
    }
}
