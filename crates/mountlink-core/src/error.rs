// ── Core error types ──
//
// Bus misuse and operator-output failures. Transport delivery problems
// are not errors here: requests are fire-and-forget and the transport
// reports its own failures.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Session is already attached to the bus")]
    AlreadyAttached,

    #[error("Bus error: {0}")]
    Bus(#[from] mountlink_bus::Error),

    #[error("Failed to write operator output: {0}")]
    Io(#[from] std::io::Error),
}
