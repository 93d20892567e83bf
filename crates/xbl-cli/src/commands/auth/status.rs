use chrono::Utc;
use serde::Serialize;
use xbl_core::{SlotState, TokenStore, timestamp};

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Serialize)]
struct SlotStatus {
    kind: &'static str,
    state: SlotState,
    expires_at: Option<String>,
}

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    token_file: String,
    gamertag: Option<String>,
    xuid: Option<String>,
    tokens: Vec<SlotStatus>,
    note: Option<String>,
}

pub fn handle(flags: &GlobalFlags, config: &xbl_config::XblConfig) -> anyhow::Result<()> {
    let path = bootstrap::token_file(config)?;
    let loaded = xbl_auth::token_file::load(&path);
    let note = loaded
        .is_none()
        .then(|| "no saved tokens; run `xbl auth login`".to_string());
    let store = loaded.unwrap_or_default();

    output(&status_of(&store, path.display().to_string(), note), flags.format)
}

fn status_of(store: &TokenStore, token_file: String, note: Option<String>) -> AuthStatusResponse {
    let now = Utc::now();
    let tokens = store
        .slot_states(now)
        .into_iter()
        .map(|(kind, state)| SlotStatus {
            kind: kind.as_str(),
            state,
            expires_at: store
                .slot(kind)
                .map(|token| timestamp::format(&token.expires_at())),
        })
        .collect();

    AuthStatusResponse {
        authenticated: store.is_authenticated(),
        token_file,
        gamertag: store.userinfo.as_ref().map(|u| u.gamertag.clone()),
        xuid: store.userinfo.as_ref().map(|u| u.xuid.clone()),
        tokens,
        note,
    }
}
