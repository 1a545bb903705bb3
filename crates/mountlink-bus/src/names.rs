//! Well-known device, property and item names.
//!
//! These match the names an INDIGO server publishes for a mount driver.

/// Device the client drives unless configured otherwise.
pub const DEFAULT_MOUNT_DEVICE: &str = "Mount Simulator @ indigosky";

/// Name the client registers with on the bus.
pub const DEFAULT_CLIENT_NAME: &str = "MountClient";

pub const DEFAULT_SERVER_NAME: &str = "indigosky";
pub const DEFAULT_SERVER_HOST: &str = "indigosky.local";
pub const DEFAULT_SERVER_PORT: u16 = 7624;

/// Switch property every device exposes for its connection lifecycle.
pub const CONNECTION_PROPERTY: &str = "CONNECTION";
pub const CONNECTION_CONNECTED_ITEM: &str = "CONNECTED";
pub const CONNECTION_DISCONNECTED_ITEM: &str = "DISCONNECTED";

/// Number property holding the mount's target equatorial coordinates.
pub const MOUNT_EQUATORIAL_COORDINATES_PROPERTY: &str = "MOUNT_EQUATORIAL_COORDINATES";
pub const MOUNT_RA_ITEM: &str = "RA";
pub const MOUNT_DEC_ITEM: &str = "DEC";
