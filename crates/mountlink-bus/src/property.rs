//! Properties, bus events and outgoing requests.
//!
//! A [`Property`] is a named, device-scoped set of items. The bus reports
//! properties to the client through [`BusEvent`]s and the client asks the
//! bus to act through [`BusRequest`]s. Neither side waits for the other:
//! requests are fire-and-forget and their effects show up later as events.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── ItemValue ────────────────────────────────────────────────────────

/// Value of a single item inside a property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Switch(bool),
    Number(f64),
}

impl From<bool> for ItemValue {
    fn from(value: bool) -> Self {
        Self::Switch(value)
    }
}

impl From<f64> for ItemValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

// ── Property ─────────────────────────────────────────────────────────

/// A device-scoped property and its items, in the order the device
/// published them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub device: String,
    pub name: String,
    #[serde(default)]
    pub items: IndexMap<String, ItemValue>,
}

impl Property {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            items: IndexMap::new(),
        }
    }

    /// Builder-style item insertion.
    pub fn with_item(mut self, item: impl Into<String>, value: impl Into<ItemValue>) -> Self {
        self.items.insert(item.into(), value.into());
        self
    }

    /// True when this property belongs to `device` and is called `name`.
    pub fn is(&self, device: &str, name: &str) -> bool {
        self.device == device && self.name == name
    }

    /// Switch state of `item`, or `None` if the item is missing or numeric.
    pub fn switch(&self, item: &str) -> Option<bool> {
        match self.items.get(item)? {
            ItemValue::Switch(on) => Some(*on),
            ItemValue::Number(_) => None,
        }
    }

    /// Numeric value of `item`, or `None` if the item is missing or a switch.
    pub fn number(&self, item: &str) -> Option<f64> {
        match self.items.get(item)? {
            ItemValue::Number(value) => Some(*value),
            ItemValue::Switch(_) => None,
        }
    }
}

// ── BusEvent ─────────────────────────────────────────────────────────

/// Notification delivered by the bus to an attached client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "property", rename_all = "snake_case")]
pub enum BusEvent {
    /// The client has been registered on the bus.
    Attached,
    /// A property was announced, either spontaneously or in answer to an
    /// enumeration request.
    PropertyDefined(Property),
    /// Item values of an already-defined property changed.
    PropertyUpdated(Property),
    /// The client has been unregistered. No further events follow.
    Detached,
}

impl BusEvent {
    /// The property carried by a definition or update, if any.
    pub fn property(&self) -> Option<&Property> {
        match self {
            Self::PropertyDefined(property) | Self::PropertyUpdated(property) => Some(property),
            Self::Attached | Self::Detached => None,
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// Which properties an enumeration request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyScope {
    /// Every property of every device.
    All,
    /// Every property of one device.
    Device(String),
}

impl PropertyScope {
    pub fn covers(&self, device: &str) -> bool {
        match self {
            Self::All => true,
            Self::Device(name) => name == device,
        }
    }
}

/// Request to change the items of a number property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberChange {
    pub device: String,
    pub property: String,
    pub items: Vec<(String, f64)>,
}

impl NumberChange {
    pub fn new(device: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            property: property.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<String>, value: f64) -> Self {
        self.items.push((item.into(), value));
        self
    }

    pub fn value(&self, item: &str) -> Option<f64> {
        self.items
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, value)| *value)
    }
}

/// An outgoing request. The bus never answers a request directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum BusRequest {
    EnumerateProperties { scope: PropertyScope },
    ChangeNumber(NumberChange),
    ConnectDevice { device: String },
    DisconnectDevice { device: String },
}
