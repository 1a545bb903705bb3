// mountlink-bus: the device-property bus as seen from a mount client

pub mod error;
pub mod names;
pub mod property;
pub mod recording;
pub mod simulator;
pub mod transport;

pub use error::Error;
pub use property::{BusEvent, BusRequest, ItemValue, NumberChange, Property, PropertyScope};
pub use recording::{JournalEntry, RecordingBus};
pub use simulator::{SimulatedBus, SimulatorConfig};
pub use transport::{BusTransport, EventReceiver, ServerAddress, ServerHandle};
