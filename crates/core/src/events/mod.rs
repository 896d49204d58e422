//! Observability sink for state changes and retry counts.
//!
//! The core never talks to a telemetry back end directly. Components receive
//! an [`EventSink`] at construction and report opaque `(name, attributes)`
//! pairs through it; the application decides where they go.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key/value attributes attached to an event
pub type Attributes = BTreeMap<&'static str, String>;

/// Receiver of observability events
pub trait EventSink: Send + Sync {
    fn emit(&self, event_name: &str, attributes: &Attributes);
}

impl<F> EventSink for F
where
    F: Fn(&str, &Attributes) + Send + Sync,
{
    fn emit(&self, event_name: &str, attributes: &Attributes) {
        self(event_name, attributes)
    }
}

/// Shared, type-erased sink handle
pub type SharedSink = Arc<dyn EventSink>;

/// Build an attribute map from `(key, value)` pairs
pub fn attributes<const N: usize>(pairs: [(&'static str, String); N]) -> Attributes {
    BTreeMap::from(pairs)
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event_name: &str, _attributes: &Attributes) {}
}

/// Forwards events to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event_name: &str, attributes: &Attributes) {
        tracing::debug!(event = event_name, ?attributes, "tether event");
    }
}

/// A single captured event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub name: String,
    pub attributes: Attributes,
}

impl RecordedEvent {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Keeps every event in memory, for assertions in tests
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Recorded events with the given name, in emission order
    pub fn named(&self, event_name: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name == event_name)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event_name: &str, attributes: &Attributes) {
        self.events.lock().push(RecordedEvent {
            name: event_name.to_string(),
            attributes: attributes.clone(),
        });
    }
}
