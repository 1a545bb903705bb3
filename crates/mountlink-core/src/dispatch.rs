// ── Property event dispatch ──
//
// Consumes the transport's event channel. The target device's connection
// property drives the state machine and its coordinates property feeds the
// position tracker. Everything else is dropped here.

use std::sync::Arc;

use mountlink_bus::names::{
    CONNECTION_CONNECTED_ITEM, CONNECTION_PROPERTY, MOUNT_EQUATORIAL_COORDINATES_PROPERTY,
};
use mountlink_bus::{BusEvent, BusTransport, EventReceiver, Property, PropertyScope};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::position::PositionTracker;
use crate::state::{ConnectionMachine, Reaction};

/// Routes bus events for one device to a [`ConnectionMachine`] and a
/// [`PositionTracker`].
pub struct EventDispatcher {
    device: String,
    bus: Arc<dyn BusTransport>,
    machine: Arc<ConnectionMachine>,
    position: Arc<PositionTracker>,
}

impl EventDispatcher {
    pub fn new(
        device: impl Into<String>,
        bus: Arc<dyn BusTransport>,
        machine: Arc<ConnectionMachine>,
        position: Arc<PositionTracker>,
    ) -> Self {
        Self {
            device: device.into(),
            bus,
            machine,
            position,
        }
    }

    /// Handle a single event. Never blocks.
    pub fn handle(&self, event: &BusEvent) {
        if let Some(property) = event.property() {
            if property.is(&self.device, MOUNT_EQUATORIAL_COORDINATES_PROPERTY) {
                self.track_position(property);
                return;
            }
        }

        match event {
            BusEvent::Attached => {
                info!("client attached to bus");
                if let Err(e) = self.bus.enumerate_properties(&PropertyScope::All) {
                    warn!(error = %e, "property enumeration request failed");
                }
            }
            BusEvent::PropertyDefined(property) => {
                let Some(connected) = self.connection_flag(property) else {
                    return;
                };
                match self.machine.on_defined(connected) {
                    Reaction::RequestConnect => {
                        info!(device = %self.device, "device reports disconnected, requesting connection");
                        if let Err(e) = self.bus.connect_device(&self.device) {
                            warn!(device = %self.device, error = %e, "connect request failed");
                        }
                    }
                    Reaction::Connected => {
                        info!(device = %self.device, "mount already connected");
                    }
                    Reaction::Unchanged => {
                        debug!(state = %self.machine.state(), "connection definition ignored");
                    }
                }
            }
            BusEvent::PropertyUpdated(property) => {
                let Some(connected) = self.connection_flag(property) else {
                    return;
                };
                if self.machine.on_updated(connected) == Reaction::Connected {
                    info!(device = %self.device, "mount connected");
                }
            }
            BusEvent::Detached => info!("client detached"),
        }
    }

    /// Consume `events` until the channel closes or `cancel` fires.
    pub async fn run(self, mut events: EventReceiver, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle(&event);
                }
            }
        }
        debug!("event dispatcher exiting");
    }

    fn track_position(&self, property: &Property) {
        if self.position.record(property) {
            if let Some(at) = self.position.latest() {
                debug!(device = %self.device, ra = at.ra, dec = at.dec, "mount position reported");
            }
        }
    }

    /// Connected-item value when `property` is the target's connection
    /// property. A missing item reads as "not connected".
    fn connection_flag(&self, property: &Property) -> Option<bool> {
        if !property.is(&self.device, CONNECTION_PROPERTY) {
            trace!(device = %property.device, property = %property.name, "event filtered");
            return None;
        }
        Some(
            property
                .switch(CONNECTION_CONNECTED_ITEM)
                .unwrap_or(false),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mountlink_bus::names::{MOUNT_DEC_ITEM, MOUNT_RA_ITEM};
    use mountlink_bus::{BusRequest, RecordingBus};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::position::Coordinates;
    use crate::state::ConnectionState;

    const MOUNT: &str = "Mount Simulator @ indigosky";

    fn setup() -> (Arc<RecordingBus>, Arc<ConnectionMachine>, EventDispatcher) {
        let (bus, machine, _position, dispatcher) = setup_with_position();
        (bus, machine, dispatcher)
    }

    fn setup_with_position() -> (
        Arc<RecordingBus>,
        Arc<ConnectionMachine>,
        Arc<PositionTracker>,
        EventDispatcher,
    ) {
        let bus = Arc::new(RecordingBus::new());
        let machine = Arc::new(ConnectionMachine::new());
        let position = Arc::new(PositionTracker::new());
        let dispatcher =
            EventDispatcher::new(MOUNT, bus.clone(), machine.clone(), position.clone());
        (bus, machine, position, dispatcher)
    }

    fn connection(device: &str, connected: bool) -> Property {
        Property::new(device, CONNECTION_PROPERTY)
            .with_item(CONNECTION_CONNECTED_ITEM, connected)
    }

    #[test]
    fn attach_requests_full_enumeration() {
        let (bus, machine, dispatcher) = setup();
        dispatcher.handle(&BusEvent::Attached);

        assert_eq!(
            bus.requests(),
            vec![BusRequest::EnumerateProperties {
                scope: PropertyScope::All
            }]
        );
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn disconnected_definition_issues_single_connect() {
        let (bus, machine, dispatcher) = setup();
        let event = BusEvent::PropertyDefined(connection(MOUNT, false));

        dispatcher.handle(&event);
        dispatcher.handle(&event);

        assert_eq!(
            bus.requests(),
            vec![BusRequest::ConnectDevice {
                device: MOUNT.into()
            }]
        );
        assert_eq!(machine.state(), ConnectionState::ConnectRequested);
    }

    #[test]
    fn connected_definition_needs_no_request() {
        let (bus, machine, dispatcher) = setup();
        dispatcher.handle(&BusEvent::PropertyDefined(connection(MOUNT, true)));

        assert!(bus.requests().is_empty());
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[test]
    fn connected_update_finishes_handshake() {
        let (_bus, machine, dispatcher) = setup();
        dispatcher.handle(&BusEvent::PropertyDefined(connection(MOUNT, false)));
        dispatcher.handle(&BusEvent::PropertyUpdated(connection(MOUNT, true)));

        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[test]
    fn other_device_never_changes_state() {
        let (bus, machine, dispatcher) = setup();
        dispatcher.handle(&BusEvent::PropertyDefined(connection("CCD Imager Simulator", false)));
        dispatcher.handle(&BusEvent::PropertyUpdated(connection("CCD Imager Simulator", true)));

        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert!(bus.requests().is_empty());
    }

    #[test]
    fn coordinates_never_touch_connection_state() {
        let (bus, machine, dispatcher) = setup();
        let coordinates = Property::new(MOUNT, MOUNT_EQUATORIAL_COORDINATES_PROPERTY)
            .with_item(MOUNT_RA_ITEM, 3.0)
            .with_item(CONNECTION_CONNECTED_ITEM, true);
        dispatcher.handle(&BusEvent::PropertyUpdated(coordinates));

        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert!(bus.requests().is_empty());
    }

    #[test]
    fn coordinate_reports_update_the_position() {
        let (_bus, _machine, position, dispatcher) = setup_with_position();
        let coordinates = |ra: f64, dec: f64| {
            Property::new(MOUNT, MOUNT_EQUATORIAL_COORDINATES_PROPERTY)
                .with_item(MOUNT_RA_ITEM, ra)
                .with_item(MOUNT_DEC_ITEM, dec)
        };

        dispatcher.handle(&BusEvent::PropertyDefined(coordinates(0.0, 90.0)));
        assert_eq!(position.latest(), Some(Coordinates { ra: 0.0, dec: 90.0 }));

        dispatcher.handle(&BusEvent::PropertyUpdated(coordinates(10.5, -20.25)));
        assert_eq!(
            position.latest(),
            Some(Coordinates {
                ra: 10.5,
                dec: -20.25
            })
        );
    }

    #[test]
    fn other_devices_coordinates_are_ignored() {
        let (_bus, _machine, position, dispatcher) = setup_with_position();
        dispatcher.handle(&BusEvent::PropertyUpdated(
            Property::new("Guider Mount", MOUNT_EQUATORIAL_COORDINATES_PROPERTY)
                .with_item(MOUNT_RA_ITEM, 1.0)
                .with_item(MOUNT_DEC_ITEM, 2.0),
        ));

        assert_eq!(position.latest(), None);
    }

    #[test]
    fn missing_connected_item_reads_as_disconnected() {
        let (bus, machine, dispatcher) = setup();
        dispatcher.handle(&BusEvent::PropertyDefined(Property::new(
            MOUNT,
            CONNECTION_PROPERTY,
        )));

        assert_eq!(machine.state(), ConnectionState::ConnectRequested);
        assert_eq!(bus.requests().len(), 1);
    }

    #[test]
    fn detach_is_only_logged() {
        let (bus, machine, dispatcher) = setup();
        dispatcher.handle(&BusEvent::Detached);

        assert!(bus.journal().is_empty());
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_drains_channel_until_detached() {
        let bus = Arc::new(RecordingBus::new());
        let machine = Arc::new(ConnectionMachine::new());
        let dispatcher = EventDispatcher::new(
            MOUNT,
            bus.clone(),
            machine.clone(),
            Arc::new(PositionTracker::new()),
        );

        let events = bus.attach_client("tester").unwrap();
        let mut state_rx = machine.subscribe();
        let task = tokio::spawn(dispatcher.run(events, CancellationToken::new()));

        bus.inject(BusEvent::PropertyDefined(connection(MOUNT, false)))
            .unwrap();
        bus.inject(BusEvent::PropertyUpdated(connection(MOUNT, true)))
            .unwrap();
        state_rx
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .unwrap();

        bus.detach_client("tester").unwrap();
        task.await.unwrap();

        assert_eq!(
            bus.requests(),
            vec![
                BusRequest::EnumerateProperties {
                    scope: PropertyScope::All
                },
                BusRequest::ConnectDevice {
                    device: MOUNT.into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (bus, _machine, dispatcher) = setup();
        let events = bus.attach_client("tester").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        dispatcher.run(events, cancel).await;
    }
}
