mod cli;
mod commands;
mod config;
mod error;

use std::io::Write;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    let code = match run(cli).await {
        Ok(()) => exit_code::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };

    // Exit explicitly: the runtime would otherwise wait on the blocking
    // stdin reader before shutting down.
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}

/// Logs go to stderr; stdout carries only operator output.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the bus
        Some(Command::Config(args)) => commands::config_cmd::handle(&args, &cli.global),

        // Shell completions generation
        Some(Command::Completions(args)) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "mountlink", &mut std::io::stdout());
            Ok(())
        }

        Some(Command::Run) | None => commands::run::handle(&cli.global).await,
    }
}
