// ── Runtime session configuration ──
//
// Describes which device to drive and how to reach the bus. The binary
// builds a `SessionConfig` from files, env and flags and hands it in;
// core never touches disk.

use mountlink_bus::ServerAddress;
use mountlink_bus::names::{DEFAULT_CLIENT_NAME, DEFAULT_MOUNT_DEVICE};

/// Configuration for a single mount session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name this client registers with on the bus.
    pub client_name: String,
    /// The one device every event and command is scoped to.
    pub device: String,
    /// Bus server to connect to before attaching.
    pub server: ServerAddress,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.into(),
            device: DEFAULT_MOUNT_DEVICE.into(),
            server: ServerAddress::default(),
        }
    }
}
