use anyhow::Context;
use serde::Serialize;
use xbl_auth::{AuthenticationManager, Credentials};
use xbl_core::{TokenStore, timestamp};

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::auth::AuthLoginArgs;
use crate::output::output;

#[derive(Serialize)]
struct AuthLoginResponse {
    authenticated: bool,
    gamertag: String,
    xuid: String,
    session_expires_at: Option<String>,
    token_file: String,
}

pub async fn handle(
    args: &AuthLoginArgs,
    flags: &GlobalFlags,
    config: &xbl_config::XblConfig,
) -> anyhow::Result<()> {
    let credentials = credentials(args)?;

    let path = bootstrap::token_file(config)?;
    let mut config = config.clone();
    config.general.token_file = Some(path.clone());
    if args.no_refresh {
        config.general.force_refresh = false;
    }

    let manager = AuthenticationManager::from_config(&config)?
        .with_device_and_title(args.device_and_title);
    let store = manager
        .authenticate(TokenStore::new(), credentials.as_ref())
        .await
        .context("auth login failed")?;

    let identity = store
        .userinfo
        .as_ref()
        .context("authenticated token store has no identity")?;
    output(
        &AuthLoginResponse {
            authenticated: true,
            gamertag: identity.gamertag.clone(),
            xuid: identity.xuid.clone(),
            session_expires_at: store
                .session_token
                .as_ref()
                .map(|token| timestamp::format(&token.expires_at())),
            token_file: path.display().to_string(),
        },
        flags.format,
    )
}

fn credentials(args: &AuthLoginArgs) -> anyhow::Result<Option<Credentials>> {
    match (&args.email, &args.password) {
        (Some(email), Some(password)) => Ok(Some(Credentials::new(email, password))),
        (Some(_), None) => anyhow::bail!("auth login: --email requires --password (or XBL_PASSWORD)"),
        (None, Some(_)) => anyhow::bail!("auth login: --password requires --email (or XBL_EMAIL)"),
        (None, None) => Ok(None),
    }
}
