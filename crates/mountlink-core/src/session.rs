// ── Session context ──
//
// Owns everything one client run shares between the command loop and the
// bus event task: the transport handle, the connection state machine, the
// reported position and the dispatcher task. Nothing here is
// process-global.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use mountlink_bus::{BusTransport, ServerHandle};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::SessionConfig;
use crate::dispatch::EventDispatcher;
use crate::error::CoreError;
use crate::executor::{Executor, Flow};
use crate::position::{Coordinates, PositionTracker};
use crate::state::{ConnectionMachine, ConnectionState};

/// A client session against one device.
///
/// Cheaply cloneable via `Arc<SessionInner>`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    bus: Arc<dyn BusTransport>,
    machine: Arc<ConnectionMachine>,
    position: Arc<PositionTracker>,
    executor: Executor,
    cancel: CancellationToken,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Create a session. Does NOT touch the bus; call
    /// [`connect_server`](Self::connect_server) and [`attach`](Self::attach).
    pub fn new(config: SessionConfig, bus: Arc<dyn BusTransport>) -> Self {
        let machine = Arc::new(ConnectionMachine::new());
        let executor = Executor::new(
            config.device.clone(),
            config.client_name.clone(),
            Arc::clone(&bus),
            Arc::clone(&machine),
        );

        Self {
            inner: Arc::new(SessionInner {
                config,
                bus,
                machine,
                position: Arc::new(PositionTracker::new()),
                executor,
                cancel: CancellationToken::new(),
                dispatcher: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Current connection state of the target device.
    pub fn state(&self) -> ConnectionState {
        self.inner.machine.state()
    }

    /// Observe connection state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.machine.subscribe()
    }

    /// Last position the mount reported, if any.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.inner.position.latest()
    }

    /// Observe position reports.
    pub fn subscribe_coordinates(&self) -> watch::Receiver<Option<Coordinates>> {
        self.inner.position.subscribe()
    }

    // ── Bus lifecycle ────────────────────────────────────────────

    /// Establish connectivity to the configured bus server.
    pub fn connect_server(&self) -> Result<ServerHandle, CoreError> {
        let server = &self.inner.config.server;
        let handle = self.inner.bus.connect_server(server)?;
        info!(server = %server, "connected to bus server");
        Ok(handle)
    }

    /// Attach to the bus and spawn the event dispatcher on the current
    /// Tokio runtime.
    pub async fn attach(&self) -> Result<(), CoreError> {
        let mut slot = self.inner.dispatcher.lock().await;
        if slot.is_some() {
            return Err(CoreError::AlreadyAttached);
        }

        let events = self.inner.bus.attach_client(&self.inner.config.client_name)?;
        let dispatcher = EventDispatcher::new(
            self.inner.config.device.clone(),
            Arc::clone(&self.inner.bus),
            Arc::clone(&self.inner.machine),
            Arc::clone(&self.inner.position),
        );
        let cancel = self.inner.cancel.child_token();
        *slot = Some(tokio::spawn(dispatcher.run(events, cancel)));

        debug!(client = %self.inner.config.client_name, "dispatcher started");
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Parse and run one operator line.
    pub fn execute_line(&self, line: &str, out: &mut impl Write) -> Result<Flow, CoreError> {
        self.execute(&Command::parse(line), out)
    }

    /// Run an already-parsed command.
    pub fn execute(&self, command: &Command, out: &mut impl Write) -> Result<Flow, CoreError> {
        debug!(?command, state = %self.state(), "executing command");
        Ok(self.inner.executor.execute(command, out)?)
    }

    // ── Teardown ─────────────────────────────────────────────────

    /// Leave the bus without asking the device to disconnect. Used when the
    /// command channel ends without an `exit`.
    pub fn close(&self) -> Result<(), CoreError> {
        let bus = &self.inner.bus;
        let detached = bus.detach_client(&self.inner.config.client_name);
        let stopped = bus.stop();
        detached?;
        stopped?;
        Ok(())
    }

    /// Wait for the dispatcher to drain the final events after a detach,
    /// cancelling it if that takes longer than `grace`.
    pub async fn finish(&self, grace: Duration) {
        let Some(mut handle) = self.inner.dispatcher.lock().await.take() else {
            return;
        };

        if tokio::time::timeout(grace, &mut handle).await.is_err() {
            warn!(grace_ms = grace.as_millis(), "dispatcher did not finish in time, cancelling");
            self.inner.cancel.cancel();
            let _ = handle.await;
        }
    }
}
