use std::time::Duration;

use serde::Serialize;
use xbl_auth::{ApiSession, AuthenticationManager};
use xbl_core::TokenStore;

use crate::bootstrap;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

#[derive(Serialize)]
struct AuthHeaderResponse<'a> {
    authorization: &'a str,
    xuid: u64,
}

/// Print the authorization header, refreshing saved tokens if the session has
/// lapsed. Never prompts for credentials. `--format raw` prints the bare header.
pub async fn handle(flags: &GlobalFlags, config: &xbl_config::XblConfig) -> anyhow::Result<()> {
    let path = bootstrap::token_file(config)?;
    let mut config = config.clone();
    config.general.token_file = Some(path);

    let manager = AuthenticationManager::from_config(&config)?;
    let mut store = manager.with_persisted(TokenStore::new());
    if !store.is_authenticated() {
        tracing::info!("saved session has lapsed; refreshing");
        store = manager.authenticate(store, None).await?;
    }

    let session = ApiSession::from_store(
        &store,
        Duration::from_secs(config.general.request_timeout_secs),
    )?;
    match flags.format {
        OutputFormat::Raw => {
            println!("{}", session.authorization_header());
            Ok(())
        }
        OutputFormat::Json => output(
            &AuthHeaderResponse {
                authorization: session.authorization_header(),
                xuid: session.xuid(),
            },
            flags.format,
        ),
    }
}
