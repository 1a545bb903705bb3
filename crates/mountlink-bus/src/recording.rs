//! A transport that records calls instead of talking to a server.
//!
//! Every call is appended to a journal in the order it was made, and events
//! can be pushed to the attached client by hand. Handy for exercising
//! client logic without a running bus.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::error::Error;
use crate::property::{BusEvent, BusRequest, NumberChange, PropertyScope};
use crate::transport::{BusTransport, EventReceiver, ServerAddress, ServerHandle};

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    ServerConnected(ServerAddress),
    Attached { client: String },
    Request(BusRequest),
    Detached { client: String },
    Stopped,
}

#[derive(Default)]
struct RecordingState {
    journal: Vec<JournalEntry>,
    client: Option<(String, mpsc::UnboundedSender<BusEvent>)>,
    stopped: bool,
}

/// Journal-keeping [`BusTransport`].
#[derive(Default)]
pub struct RecordingBus {
    state: Mutex<RecordingState>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call made so far, oldest first.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    /// Only the outgoing requests, oldest first.
    pub fn requests(&self) -> Vec<BusRequest> {
        self.lock()
            .journal
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Request(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Deliver `event` to the attached client.
    pub fn inject(&self, event: BusEvent) -> Result<(), Error> {
        let state = self.lock();
        let (_, tx) = state.client.as_ref().ok_or(Error::NotAttached)?;
        tx.send(event).map_err(|_| Error::ChannelClosed)
    }

    fn record(&self, request: BusRequest) -> Result<(), Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(Error::Stopped);
        }
        state.journal.push(JournalEntry::Request(request));
        Ok(())
    }
}

impl BusTransport for RecordingBus {
    fn connect_server(&self, address: &ServerAddress) -> Result<ServerHandle, Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(Error::Stopped);
        }
        state
            .journal
            .push(JournalEntry::ServerConnected(address.clone()));
        Ok(ServerHandle {
            address: address.clone(),
        })
    }

    fn attach_client(&self, client: &str) -> Result<EventReceiver, Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(Error::Stopped);
        }
        if let Some((attached, _)) = &state.client {
            return Err(Error::AlreadyAttached {
                client: attached.clone(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive, so the send cannot fail.
        let _ = tx.send(BusEvent::Attached);
        state.client = Some((client.to_owned(), tx));
        state.journal.push(JournalEntry::Attached {
            client: client.to_owned(),
        });
        Ok(rx)
    }

    fn detach_client(&self, client: &str) -> Result<(), Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(Error::Stopped);
        }
        let (_, tx) = state.client.take().ok_or(Error::NotAttached)?;
        let _ = tx.send(BusEvent::Detached);
        state.journal.push(JournalEntry::Detached {
            client: client.to_owned(),
        });
        Ok(())
    }

    fn enumerate_properties(&self, scope: &PropertyScope) -> Result<(), Error> {
        self.record(BusRequest::EnumerateProperties {
            scope: scope.clone(),
        })
    }

    fn change_number_property(&self, change: NumberChange) -> Result<(), Error> {
        self.record(BusRequest::ChangeNumber(change))
    }

    fn connect_device(&self, device: &str) -> Result<(), Error> {
        self.record(BusRequest::ConnectDevice {
            device: device.to_owned(),
        })
    }

    fn disconnect_device(&self, device: &str) -> Result<(), Error> {
        self.record(BusRequest::DisconnectDevice {
            device: device.to_owned(),
        })
    }

    fn stop(&self) -> Result<(), Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(Error::Stopped);
        }
        state.stopped = true;
        state.client = None;
        state.journal.push(JournalEntry::Stopped);
        Ok(())
    }
}
