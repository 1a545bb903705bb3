//! In-process mount simulator.
//!
//! Behaves like a bus server hosting a single mount driver: it answers
//! enumeration with the mount's properties, connects the mount after a short
//! delay when asked to, and echoes coordinate changes back as property
//! updates. All work happens on a background Tokio task; the
//! [`BusTransport`] methods only enqueue messages for it.
//!
//! ```rust,ignore
//! use mountlink_bus::{BusTransport, SimulatedBus, SimulatorConfig};
//!
//! let bus = SimulatedBus::start(SimulatorConfig::default());
//! let mut events = bus.attach_client("MountClient")?;
//! bus.enumerate_properties(&PropertyScope::All)?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::names::{
    CONNECTION_CONNECTED_ITEM, CONNECTION_DISCONNECTED_ITEM, CONNECTION_PROPERTY,
    DEFAULT_MOUNT_DEVICE, MOUNT_DEC_ITEM, MOUNT_EQUATORIAL_COORDINATES_PROPERTY, MOUNT_RA_ITEM,
};
use crate::property::{BusEvent, BusRequest, NumberChange, Property, PropertyScope};
use crate::transport::{BusTransport, EventReceiver, ServerAddress, ServerHandle};

// ── SimulatorConfig ──────────────────────────────────────────────────

/// Tuning for the simulated mount.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Device name the simulated mount publishes under.
    pub device: String,
    /// How long the mount takes to report itself connected. Default: 500ms.
    pub connect_delay: Duration,
    /// Whether the mount is already connected when the simulator starts.
    pub initially_connected: bool,
    /// Starting right ascension in hours. Default: 0 (home).
    pub ra: f64,
    /// Starting declination in degrees. Default: +90 (home).
    pub dec: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_MOUNT_DEVICE.into(),
            connect_delay: Duration::from_millis(500),
            initially_connected: false,
            ra: 0.0,
            dec: 90.0,
        }
    }
}

// ── SimulatedBus ─────────────────────────────────────────────────────

enum SimMessage {
    Attach(mpsc::UnboundedSender<BusEvent>),
    Detach,
    Request(BusRequest),
    Stop,
}

/// [`BusTransport`] backed by an in-process simulated mount.
///
/// Dropping the handle aborts the background task.
pub struct SimulatedBus {
    tx: mpsc::UnboundedSender<SimMessage>,
    client: Mutex<Option<String>>,
    stopped: AtomicBool,
    cancel: CancellationToken,
}

impl SimulatedBus {
    /// Spawn the simulator task. Must be called from within a Tokio runtime.
    pub fn start(config: SimulatorConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let mount = MountSimulator::new(config);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            simulator_loop(mount, rx, task_cancel).await;
        });

        Self {
            tx,
            client: Mutex::new(None),
            stopped: AtomicBool::new(false),
            cancel,
        }
    }

    fn send(&self, message: SimMessage) -> Result<(), Error> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(Error::Stopped);
        }
        self.tx.send(message).map_err(|_| Error::ChannelClosed)
    }
}

impl Drop for SimulatedBus {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl BusTransport for SimulatedBus {
    fn connect_server(&self, address: &ServerAddress) -> Result<ServerHandle, Error> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(Error::Stopped);
        }
        info!(server = %address, "using in-process mount simulator");
        Ok(ServerHandle {
            address: address.clone(),
        })
    }

    fn attach_client(&self, client: &str) -> Result<EventReceiver, Error> {
        let mut attached = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = attached.as_ref() {
            return Err(Error::AlreadyAttached {
                client: existing.clone(),
            });
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.send(SimMessage::Attach(event_tx))?;
        *attached = Some(client.to_owned());
        Ok(event_rx)
    }

    fn detach_client(&self, client: &str) -> Result<(), Error> {
        let mut attached = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if attached.is_none() {
            return Err(Error::NotAttached);
        }
        self.send(SimMessage::Detach)?;
        debug!(client, "detach requested");
        *attached = None;
        Ok(())
    }

    fn enumerate_properties(&self, scope: &PropertyScope) -> Result<(), Error> {
        self.send(SimMessage::Request(BusRequest::EnumerateProperties {
            scope: scope.clone(),
        }))
    }

    fn change_number_property(&self, change: NumberChange) -> Result<(), Error> {
        self.send(SimMessage::Request(BusRequest::ChangeNumber(change)))
    }

    fn connect_device(&self, device: &str) -> Result<(), Error> {
        self.send(SimMessage::Request(BusRequest::ConnectDevice {
            device: device.to_owned(),
        }))
    }

    fn disconnect_device(&self, device: &str) -> Result<(), Error> {
        self.send(SimMessage::Request(BusRequest::DisconnectDevice {
            device: device.to_owned(),
        }))
    }

    fn stop(&self) -> Result<(), Error> {
        // Queued behind any pending detach so the client still sees it.
        self.send(SimMessage::Stop)?;
        self.stopped.store(true, Ordering::Release);
        Ok(())
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn simulator_loop(
    mut mount: MountSimulator,
    mut rx: mpsc::UnboundedReceiver<SimMessage>,
    cancel: CancellationToken,
) {
    loop {
        let connect_at = mount.connect_at;
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep_until(connect_at.unwrap_or_else(Instant::now)),
                if connect_at.is_some() => mount.finish_connect(),
            message = rx.recv() => {
                match message {
                    None | Some(SimMessage::Stop) => break,
                    Some(SimMessage::Attach(events)) => mount.attach(events),
                    Some(SimMessage::Detach) => mount.detach(),
                    Some(SimMessage::Request(request)) => mount.handle(request),
                }
            }
        }
    }
    debug!("mount simulator exiting");
}

struct MountSimulator {
    config: SimulatorConfig,
    connected: bool,
    ra: f64,
    dec: f64,
    /// When a requested connect completes.
    connect_at: Option<Instant>,
    client: Option<mpsc::UnboundedSender<BusEvent>>,
}

impl MountSimulator {
    fn new(config: SimulatorConfig) -> Self {
        Self {
            connected: config.initially_connected,
            ra: config.ra,
            dec: config.dec,
            config,
            connect_at: None,
            client: None,
        }
    }

    fn attach(&mut self, events: mpsc::UnboundedSender<BusEvent>) {
        self.client = Some(events);
        self.emit(BusEvent::Attached);
    }

    fn detach(&mut self) {
        self.emit(BusEvent::Detached);
        self.client = None;
    }

    fn handle(&mut self, request: BusRequest) {
        match request {
            BusRequest::EnumerateProperties { scope } => {
                if !scope.covers(&self.config.device) {
                    return;
                }
                self.emit(BusEvent::PropertyDefined(self.connection_property()));
                if self.connected {
                    self.emit(BusEvent::PropertyDefined(self.coordinates_property()));
                }
            }
            BusRequest::ConnectDevice { device } => {
                if !self.owns(&device) {
                    return;
                }
                if self.connect_at.is_none() {
                    debug!(delay = ?self.config.connect_delay, "simulated mount connecting");
                    self.connect_at = Some(Instant::now() + self.config.connect_delay);
                }
            }
            BusRequest::DisconnectDevice { device } => {
                if !self.owns(&device) {
                    return;
                }
                self.connect_at = None;
                self.connected = false;
                info!(device = %self.config.device, "simulated mount disconnected");
                self.emit(BusEvent::PropertyUpdated(self.connection_property()));
            }
            BusRequest::ChangeNumber(change) => self.change_number(&change),
        }
    }

    fn finish_connect(&mut self) {
        self.connect_at = None;
        self.connected = true;
        info!(device = %self.config.device, "simulated mount connected");
        self.emit(BusEvent::PropertyUpdated(self.connection_property()));
        self.emit(BusEvent::PropertyDefined(self.coordinates_property()));
    }

    fn change_number(&mut self, change: &NumberChange) {
        if !self.owns(&change.device) {
            return;
        }
        if change.property != MOUNT_EQUATORIAL_COORDINATES_PROPERTY {
            debug!(property = %change.property, "simulated mount ignores property");
            return;
        }
        if !self.connected {
            warn!(
                device = %self.config.device,
                "coordinate change received while mount is disconnected, ignoring"
            );
            return;
        }

        if let Some(ra) = change.value(MOUNT_RA_ITEM) {
            self.ra = ra;
        }
        if let Some(dec) = change.value(MOUNT_DEC_ITEM) {
            self.dec = dec;
        }
        info!(ra = self.ra, dec = self.dec, "simulated mount slewing");
        self.emit(BusEvent::PropertyUpdated(self.coordinates_property()));
    }

    fn owns(&self, device: &str) -> bool {
        let owned = device == self.config.device;
        if !owned {
            debug!(device, "request for unknown device ignored");
        }
        owned
    }

    fn connection_property(&self) -> Property {
        Property::new(&self.config.device, CONNECTION_PROPERTY)
            .with_item(CONNECTION_CONNECTED_ITEM, self.connected)
            .with_item(CONNECTION_DISCONNECTED_ITEM, !self.connected)
    }

    fn coordinates_property(&self) -> Property {
        Property::new(&self.config.device, MOUNT_EQUATORIAL_COORDINATES_PROPERTY)
            .with_item(MOUNT_RA_ITEM, self.ra)
            .with_item(MOUNT_DEC_ITEM, self.dec)
    }

    fn emit(&mut self, event: BusEvent) {
        let Some(client) = self.client.as_ref() else {
            debug!(?event, "no client attached, dropping event");
            return;
        };
        if client.send(event).is_err() {
            debug!("client event receiver dropped");
            self.client = None;
        }
    }
}
