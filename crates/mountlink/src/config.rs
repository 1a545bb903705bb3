//! CLI-side configuration: flag overrides on top of `mountlink_config`.

use std::path::PathBuf;

use mountlink_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file this invocation reads and writes.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(mountlink_config::config_path)
}

/// Load file + env configuration and apply command-line overrides.
///
/// An explicit `--config` must exist; the default location may be absent.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    if let Some(path) = &global.config {
        if !path.is_file() {
            return Err(CliError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
    }

    let mut cfg = mountlink_config::load_config(global.config.as_deref())?;
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

/// Defaults plus command-line overrides, ignoring any existing file. Used to
/// seed a new config file.
pub fn seed(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = Config::default();
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(device) = &global.device {
        cfg.device.clone_from(device);
    }
    if let Some(client_name) = &global.client_name {
        cfg.client_name.clone_from(client_name);
    }
    if let Some(name) = &global.server_name {
        cfg.server.name.clone_from(name);
    }
    if let Some(host) = &global.host {
        cfg.server.host.clone_from(host);
    }
    if let Some(port) = global.port {
        cfg.server.port = port;
    }
    if let Some(delay) = global.connect_delay_ms {
        cfg.simulator.connect_delay_ms = delay;
    }
}
