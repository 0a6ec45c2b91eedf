//! Protocol events emitted by fee assessment, minting and governance.

use serde::{Deserialize, Serialize};

pub const EVENT_FEE_ASSESSED: &str = "fee_assessed";
pub const EVENT_MINT: &str = "mint";
pub const EVENT_EXCLUDE_MESSAGE_TYPE: &str = "exclude_message_type";
pub const EVENT_INCLUDE_MESSAGE_TYPE: &str = "include_message_type";
pub const EVENT_PARAM_CHANGE: &str = "param_change";

pub const ATTR_TOTAL_FEE: &str = "total_fee";
pub const ATTR_SYSTEM_FEE: &str = "system_fee";
pub const ATTR_MINTED_AMOUNT: &str = "minted_amount";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_MESSAGE_TYPE: &str = "message_type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Ordered event buffer for a block or a single transaction.
#[derive(Debug, Clone, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Append everything buffered in `other`, preserving order.
    pub fn extend(&mut self, other: EventManager) {
        self.events.extend(other.events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
