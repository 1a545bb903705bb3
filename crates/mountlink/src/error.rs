//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text and
//! a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use mountlink_config::ConfigError;
use mountlink_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    /// `EX_CONFIG` from sysexits.h.
    pub const CONFIG: i32 = 78;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Bus ──────────────────────────────────────────────────────────

    #[error("Could not reach the bus server {server}")]
    #[diagnostic(
        code(mountlink::connection_failed),
        help(
            "Check the [server] section of your config or pass --host/--port.\n\
             Run: mountlink config show"
        )
    )]
    ConnectionFailed {
        server: String,
        #[source]
        source: mountlink_bus::Error,
    },

    #[error("Bus session failed: {0}")]
    #[diagnostic(code(mountlink::session))]
    Session(CoreError),

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(mountlink::config),
        help("Run: mountlink config path  to locate the file in use")
    )]
    Config(#[from] ConfigError),

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(mountlink::no_config),
        help("Create one with: mountlink --config {path} config init")
    )]
    ConfigNotFound { path: String },

    #[error("Configuration file already exists: {path}")]
    #[diagnostic(
        code(mountlink::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error("I/O error: {0}")]
    #[diagnostic(code(mountlink::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Config(_) | Self::ConfigNotFound { .. } => exit_code::CONFIG,
            Self::ConfigExists { .. } => exit_code::USAGE,
            Self::Session(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => Self::Io(e),
            other => Self::Session(other),
        }
    }
}
