use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `xbl` binary.
#[derive(Debug, Parser)]
#[command(name = "xbl", version, about = "xblive - Xbox Live authentication")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Token file (overrides `general.token_file`)
    #[arg(long, global = true)]
    pub token_file: Option<std::path::PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            token_file: self.token_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::subcommands::AuthCommands;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "xbl",
            "--format",
            "raw",
            "--token-file",
            "/tmp/tokens.json",
            "--verbose",
            "auth",
            "status",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        let flags = cli.global_flags();
        assert_eq!(
            flags.token_file.as_deref(),
            Some(std::path::Path::new("/tmp/tokens.json"))
        );
        assert!(matches!(
            cli.command,
            Commands::Auth {
                action: AuthCommands::Status
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["xbl", "auth", "logout", "--quiet"]).expect("cli should parse");

        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Auth {
                action: AuthCommands::Logout
            }
        ));
    }

    #[test]
    fn login_accepts_credentials_and_flags() {
        let cli = Cli::try_parse_from([
            "xbl",
            "auth",
            "login",
            "--email",
            "player@example.com",
            "--password",
            "secret",
            "--no-refresh",
            "--device-and-title",
        ])
        .expect("cli should parse");

        let Commands::Auth {
            action: AuthCommands::Login(args),
        } = cli.command
        else {
            panic!("expected auth login");
        };
        assert_eq!(args.email.as_deref(), Some("player@example.com"));
        assert_eq!(args.password.as_deref(), Some("secret"));
        assert!(args.no_refresh);
        assert!(args.device_and_title);
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["xbl", "--format", "xml", "auth", "status"]);
        assert!(parsed.is_err());
    }
}
