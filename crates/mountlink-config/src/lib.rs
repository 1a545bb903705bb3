//! Configuration for the mountlink client.
//!
//! Defaults, an optional TOML file and `MOUNTLINK_*` environment variables
//! are layered with figment and translated into the runtime
//! `mountlink_core::SessionConfig` plus the simulator tuning. CLI flag
//! overrides live in the binary on top of this.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mountlink_bus::names::{
    DEFAULT_CLIENT_NAME, DEFAULT_MOUNT_DEVICE, DEFAULT_SERVER_HOST, DEFAULT_SERVER_NAME,
    DEFAULT_SERVER_PORT,
};
use mountlink_bus::{ServerAddress, SimulatorConfig};
use mountlink_core::SessionConfig;

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `MOUNTLINK_SERVER__PORT=7625`.
pub const ENV_PREFIX: &str = "MOUNTLINK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Name the client registers with on the bus.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// The mount every command is sent to.
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simulator: SimulatorSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            device: default_device(),
            server: ServerSection::default(),
            simulator: SimulatorSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_server_name")]
    pub name: String,

    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Tuning for the in-process mount simulator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulatorSection {
    /// Delay before the simulated mount reports itself connected.
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        Self {
            connect_delay_ms: default_connect_delay_ms(),
        }
    }
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.into()
}
fn default_device() -> String {
    DEFAULT_MOUNT_DEVICE.into()
}
fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.into()
}
fn default_server_host() -> String {
    DEFAULT_SERVER_HOST.into()
}
fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}
fn default_connect_delay_ms() -> u64 {
    500
}

impl Config {
    /// Reject values no session could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "device".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.client_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "client_name".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".into(),
                reason: "must be between 1 and 65535".into(),
            });
        }
        Ok(())
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            client_name: self.client_name.clone(),
            device: self.device.clone(),
            server: ServerAddress {
                name: self.server.name.clone(),
                host: self.server.host.clone(),
                port: self.server.port,
            },
        }
    }

    /// Simulator tuning for the configured device.
    pub fn to_simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            device: self.device.clone(),
            connect_delay: Duration::from_millis(self.simulator.connect_delay_ms),
            ..SimulatorConfig::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "mountlink", "mountlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mountlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config from `path` (or the canonical path) plus
/// the environment. A missing file just means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path` (or the canonical path).
/// Returns the path written.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_describe_the_indigosky_mount() {
        let session = Config::default().to_session_config();
        assert_eq!(session, SessionConfig::default());
    }

    #[test]
    fn simulator_follows_configured_device() {
        let mut cfg = Config::default();
        cfg.device = "Mount Agent".into();
        cfg.simulator.connect_delay_ms = 25;

        let sim = cfg.to_simulator_config();
        assert_eq!(sim.device, "Mount Agent");
        assert_eq!(sim.connect_delay, Duration::from_millis(25));
        assert!(!sim.initially_connected);
    }

    #[test]
    fn validation_rejects_unusable_values() {
        let mut cfg = Config::default();
        cfg.device = "  ".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "device"
        ));

        let mut cfg = Config::default();
        cfg.client_name = String::new();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "client_name"
        ));

        let mut cfg = Config::default();
        cfg.server.port = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn config_path_ends_in_config_toml() {
        assert!(config_path().ends_with("config.toml"));
    }
}
