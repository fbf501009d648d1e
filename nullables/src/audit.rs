//! Recording audit sink for asserting on attempt history.

use facegate_liveness::{AuditEvent, AuditSink};
use std::sync::Mutex;

/// An audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event, in order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Outcome codes only, for terse assertions.
    pub fn outcomes(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.outcome).collect()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}
