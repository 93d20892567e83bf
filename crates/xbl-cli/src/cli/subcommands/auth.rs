use clap::{Args, Subcommand};

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Authenticate, reusing saved tokens and signing in with credentials if needed.
    Login(AuthLoginArgs),
    /// Show the state of each saved token.
    Status,
    /// Print the `Authorization` header for platform API requests.
    Header,
    /// Delete the token file.
    Logout,
}

#[derive(Clone, Debug, Args)]
pub struct AuthLoginArgs {
    /// Microsoft account email.
    #[arg(long, env = "XBL_EMAIL")]
    pub email: Option<String>,
    /// Microsoft account password.
    #[arg(long, env = "XBL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Keep a still-valid access/refresh pair instead of refreshing it.
    #[arg(long)]
    pub no_refresh: bool,
    /// Also obtain device and title tokens.
    #[arg(long)]
    pub device_and_title: bool,
}
