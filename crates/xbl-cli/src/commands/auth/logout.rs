use serde::Serialize;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Serialize)]
struct AuthLogoutResponse {
    cleared: bool,
    token_file: String,
}

pub fn handle(flags: &GlobalFlags, config: &xbl_config::XblConfig) -> anyhow::Result<()> {
    let path = bootstrap::token_file(config)?;
    xbl_auth::logout(&path)?;
    output(
        &AuthLogoutResponse {
            cleared: true,
            token_file: path.display().to_string(),
        },
        flags.format,
    )
}
