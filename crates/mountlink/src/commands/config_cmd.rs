//! Config subcommand handlers.

use mountlink_config::{ConfigError, save_config};
use tracing::info;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let cfg = config::seed(global)?;
            let written = save_config(&cfg, Some(&path))?;
            info!(path = %written.display(), "config written");
            println!("{}", written.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            let text = toml::to_string_pretty(&cfg).map_err(ConfigError::from)?;
            print!("{text}");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path(global).display());
            Ok(())
        }
    }
}
