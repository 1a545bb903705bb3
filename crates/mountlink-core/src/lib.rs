//! Client-side logic for driving a telescope mount over a device-property bus.
//!
//! The crate keeps these pieces in step:
//!
//! - **[`ConnectionMachine`]**: tracks whether the target mount is connected.
//!   It is fed exclusively by bus events and issues at most one connect
//!   request per session. The state lives in a `tokio::sync::watch` channel,
//!   so it can be read from the command loop while bus events update it from
//!   another thread.
//!
//! - **[`EventDispatcher`]**: consumes the event channel handed out by the
//!   transport, forwards the target device's connection property to the
//!   machine and its coordinates to a [`PositionTracker`].
//!
//! - **[`Command`] / [`Executor`]**: parse one operator line into a typed
//!   command and turn it into a bus request, or into the ordered shutdown
//!   sequence.
//!
//! [`Session`] is the context object tying them to one transport handle.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod position;
pub mod session;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::Command;
pub use config::SessionConfig;
pub use dispatch::EventDispatcher;
pub use error::CoreError;
pub use executor::{Executor, Flow};
pub use position::{Coordinates, PositionTracker};
pub use session::Session;
pub use state::{ConnectionMachine, ConnectionState, Reaction};
