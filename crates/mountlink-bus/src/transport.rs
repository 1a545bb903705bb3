//! The transport seam between a client and the device-property bus.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Error;
use crate::names::{DEFAULT_SERVER_HOST, DEFAULT_SERVER_NAME, DEFAULT_SERVER_PORT};
use crate::property::{NumberChange, PropertyScope};
use crate::BusEvent;

/// Receiving half of the event channel handed out by
/// [`BusTransport::attach_client`].
pub type EventReceiver = mpsc::UnboundedReceiver<BusEvent>;

// ── ServerAddress ────────────────────────────────────────────────────

/// Where a bus server lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    /// Display name of the server, e.g. `indigosky`.
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.into(),
            host: DEFAULT_SERVER_HOST.into(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.host, self.port)
    }
}

/// Handle to an established server connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHandle {
    pub address: ServerAddress,
}

// ── BusTransport ─────────────────────────────────────────────────────

/// Operations a client can perform on the bus.
///
/// Every method returns as soon as the request has been handed to the
/// transport. None of them waits for the bus to act on it; the effects come
/// back later as [`BusEvent`]s on the receiver returned by
/// [`attach_client`](Self::attach_client). Once [`stop`](Self::stop) has been
/// called every method fails with [`Error::Stopped`].
pub trait BusTransport: Send + Sync {
    /// Establish transport-level connectivity to a bus server.
    fn connect_server(&self, address: &ServerAddress) -> Result<ServerHandle, Error>;

    /// Register a client. Events for it arrive on the returned receiver,
    /// starting with [`BusEvent::Attached`].
    fn attach_client(&self, client: &str) -> Result<EventReceiver, Error>;

    /// Unregister the client. A final [`BusEvent::Detached`] is delivered and
    /// the event channel closes.
    fn detach_client(&self, client: &str) -> Result<(), Error>;

    /// Ask the bus to (re)announce the properties in `scope`.
    fn enumerate_properties(&self, scope: &PropertyScope) -> Result<(), Error>;

    /// Ask a device to change the items of a number property.
    fn change_number_property(&self, change: NumberChange) -> Result<(), Error>;

    fn connect_device(&self, device: &str) -> Result<(), Error>;

    fn disconnect_device(&self, device: &str) -> Result<(), Error>;

    /// Shut the transport down.
    fn stop(&self) -> Result<(), Error>;
}
