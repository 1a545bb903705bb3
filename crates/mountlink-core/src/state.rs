// ── Connection handshake ──
//
// Tracks whether the target device is ready for commands. Driven only by
// connection-property events; read by anyone. Transitions happen under the
// watch channel's lock, so a definition event racing another one can never
// issue two connect requests.

use tokio::sync::watch;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state of the target device, observable by consumers.
///
/// `Connected` is terminal for a session: a later "not connected" report
/// does not move it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    ConnectRequested,
    Connected,
}

/// What the caller has to do after feeding an event to the machine.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// State did not change.
    Unchanged,
    /// State moved to [`ConnectionState::Connected`].
    Connected,
    /// State moved to [`ConnectionState::ConnectRequested`]; the caller must
    /// send exactly one connect request for the device.
    RequestConnect,
}

// ── ConnectionMachine ────────────────────────────────────────────

/// The connection state machine.
///
/// Every transition completes synchronously inside the call that triggered
/// it; nothing here awaits.
#[derive(Debug)]
pub struct ConnectionMachine {
    state: watch::Sender<ConnectionState>,
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMachine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { state }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// The connection property was defined with `connected` as its
    /// connected-item value.
    pub fn on_defined(&self, connected: bool) -> Reaction {
        if connected {
            return self.mark_connected();
        }

        let requested = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::ConnectRequested;
                true
            } else {
                false
            }
        });

        if requested {
            Reaction::RequestConnect
        } else {
            Reaction::Unchanged
        }
    }

    /// The connection property was updated with `connected` as its
    /// connected-item value.
    pub fn on_updated(&self, connected: bool) -> Reaction {
        if connected {
            self.mark_connected()
        } else {
            Reaction::Unchanged
        }
    }

    fn mark_connected(&self) -> Reaction {
        let changed = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                false
            } else {
                *state = ConnectionState::Connected;
                true
            }
        });

        if changed {
            Reaction::Connected
        } else {
            Reaction::Unchanged
        }
    }
}
