use std::path::PathBuf;

use anyhow::Context;

use crate::cli::GlobalFlags;

/// Load `.env`, then layered configuration, then apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<xbl_config::XblConfig> {
    let mut config = xbl_config::XblConfig::load_with_dotenv()
        .context("failed to load xblive configuration")?;
    if let Some(path) = &flags.token_file {
        config.general.token_file = Some(path.clone());
    }
    Ok(config)
}

/// Token file from configuration, or an error if no home directory is known.
pub fn token_file(config: &xbl_config::XblConfig) -> anyhow::Result<PathBuf> {
    config.general.token_file_path().context(
        "cannot determine token file location; set XBL_GENERAL__TOKEN_FILE or pass --token-file",
    )
}
