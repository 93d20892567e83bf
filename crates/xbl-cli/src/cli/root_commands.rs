use clap::Subcommand;

use super::subcommands::AuthCommands;

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Sign in, inspect, or clear saved Xbox Live tokens.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
}
