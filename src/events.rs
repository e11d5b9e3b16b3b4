//! Fire-and-forget notification channel
use std::sync::Mutex;

pub trait EventSink {
    fn emit(&self, name: &str, payload: Vec<u8>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl EventSink for NoopEvents {
    fn emit(&self, _name: &str, _payload: Vec<u8>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit(&self, name: &str, payload: Vec<u8>) {
        tracing::info!(event = name, payload_len = payload.len(), "event emitted");
    }
}

/// Keeps every emitted event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    emitted: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn emitted(&self) -> Vec<(String, Vec<u8>)> {
        self.emitted
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, name: &str, payload: Vec<u8>) {
        // best effort, a poisoned buffer drops the event
        if let Ok(mut events) = self.emitted.lock() {
            events.push((name.to_owned(), payload));
        }
    }
}
