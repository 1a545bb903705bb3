//! Clap derive structures for the `mountlink` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mountlink -- drive a telescope mount from line commands
#[derive(Debug, Parser)]
#[command(
    name = "mountlink",
    version,
    about = "Drive a telescope mount over a device-property bus",
    long_about = "Reads one command per line from stdin and forwards it to the mount.\n\n\
        Commands:\n  \
        mount_slew RA=<hours> DEC=<degrees>   slew to equatorial coordinates\n  \
        exit                                  disconnect the mount and quit\n\n\
        Without a subcommand, `run` is assumed.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "MOUNTLINK_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Mount device name (overrides config)
    #[arg(long, short = 'd', global = true)]
    pub device: Option<String>,

    /// Name this client registers with on the bus
    #[arg(long, global = true)]
    pub client_name: Option<String>,

    /// Bus server display name
    #[arg(long, global = true)]
    pub server_name: Option<String>,

    /// Bus server host
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// Bus server port
    #[arg(long, short = 'p', global = true)]
    pub port: Option<u16>,

    /// Delay before the simulated mount reports connected, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub connect_delay_ms: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read mount commands from stdin until `exit` or end of input
    Run,

    /// Inspect or create the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the current effective settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration as TOML
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["mountlink", "--port", "7625"]);
        assert!(matches!(cli, Ok(Cli { command: None, .. })));
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli =
            Cli::try_parse_from(["mountlink", "config", "show", "-d", "Mount Agent", "-vv"])
                .unwrap();
        assert_eq!(cli.global.device.as_deref(), Some("Mount Agent"));
        assert_eq!(cli.global.verbose, 2);
    }
}
