mod header;
mod login;
mod logout;
mod status;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthCommands;

/// Handle `xbl auth <subcommand>`.
pub async fn handle(
    action: &AuthCommands,
    flags: &GlobalFlags,
    config: &xbl_config::XblConfig,
) -> anyhow::Result<()> {
    match action {
        AuthCommands::Login(args) => login::handle(args, flags, config).await,
        AuthCommands::Status => status::handle(flags, config),
        AuthCommands::Header => header::handle(flags, config).await,
        AuthCommands::Logout => logout::handle(flags, config),
    }
}
