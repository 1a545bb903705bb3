// ── Command execution ──
//
// Turns a parsed `Command` into bus requests plus exactly one line of
// operator output. Slews are sent whether or not the mount has reported
// itself connected; the connection state is only consulted for logging.

use std::io::{self, Write};
use std::sync::Arc;

use mountlink_bus::names::{MOUNT_DEC_ITEM, MOUNT_EQUATORIAL_COORDINATES_PROPERTY, MOUNT_RA_ITEM};
use mountlink_bus::{BusTransport, NumberChange};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::state::ConnectionMachine;

/// What the read loop should do after a command ran.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session has been torn down; the process should exit with success.
    Exit,
}

/// Executes commands against one device on one bus.
pub struct Executor {
    device: String,
    client_name: String,
    bus: Arc<dyn BusTransport>,
    machine: Arc<ConnectionMachine>,
}

impl Executor {
    pub fn new(
        device: impl Into<String>,
        client_name: impl Into<String>,
        bus: Arc<dyn BusTransport>,
        machine: Arc<ConnectionMachine>,
    ) -> Self {
        Self {
            device: device.into(),
            client_name: client_name.into(),
            bus,
            machine,
        }
    }

    /// Run `command`, writing operator output to `out`.
    ///
    /// Bus failures are logged and do not end the loop. Only a failure to
    /// write the operator line is returned, and never for `Exit`.
    pub fn execute(&self, command: &Command, out: &mut impl Write) -> io::Result<Flow> {
        match command {
            Command::Slew { ra, dec } => {
                self.slew(*ra, *dec);
                report(
                    out,
                    format_args!(
                        "slewing mount to RA={} DEC={}",
                        two_decimals(*ra),
                        two_decimals(*dec)
                    ),
                )?;
                Ok(Flow::Continue)
            }
            Command::Exit => {
                if let Err(e) = report(out, format_args!("shutting down")) {
                    warn!(error = %e, "could not report shutdown");
                }
                self.shutdown();
                Ok(Flow::Exit)
            }
            Command::Unrecognized { raw } => {
                report(out, format_args!("unknown command: {raw}"))?;
                Ok(Flow::Continue)
            }
        }
    }

    fn slew(&self, ra: f64, dec: f64) {
        let state = self.machine.state();
        if !self.machine.is_connected() {
            debug!(%state, "slew requested before mount reported connected, sending anyway");
        }

        let change = NumberChange::new(&self.device, MOUNT_EQUATORIAL_COORDINATES_PROPERTY)
            .with_item(MOUNT_RA_ITEM, ra)
            .with_item(MOUNT_DEC_ITEM, dec);

        match self.bus.change_number_property(change) {
            Ok(()) => info!(device = %self.device, ra, dec, "slew request sent"),
            Err(e) => warn!(device = %self.device, error = %e, "slew request failed"),
        }
    }

    /// Ordered teardown: disconnect the device, detach the client, stop the
    /// transport. Each step runs even if an earlier one failed.
    pub fn shutdown(&self) {
        info!(device = %self.device, "shutting down session");

        if let Err(e) = self.bus.disconnect_device(&self.device) {
            warn!(device = %self.device, error = %e, "disconnect request failed");
        }
        if let Err(e) = self.bus.detach_client(&self.client_name) {
            warn!(client = %self.client_name, error = %e, "detach failed");
        }
        if let Err(e) = self.bus.stop() {
            warn!(error = %e, "stopping bus transport failed");
        }
    }
}

/// `%.2f`: Rust spells NaN as `NaN`, operators expect `nan`.
fn two_decimals(value: f64) -> String {
    if value.is_nan() {
        let nan = if value.is_sign_negative() { "-nan" } else { "nan" };
        nan.to_owned()
    } else {
        format!("{value:.2}")
    }
}

/// Write one operator line and flush it straight away.
fn report(out: &mut impl Write, line: std::fmt::Arguments<'_>) -> io::Result<()> {
    writeln!(out, "{line}")?;
    out.flush()
}
