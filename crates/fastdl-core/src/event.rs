//! Progress events and the sinks that carry them to an observer.
//!
//! The pipeline only ever talks to [`EventSink`]; binding it to a WebSocket,
//! a log or an in-memory buffer happens at the edges.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Kind of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Informational: section boundaries, skips, copies, compressions.
    Progress,
    /// A run-fatal failure or a trigger rejection.
    Error,
    /// Emitted once, after the last project finished.
    Done,
}

/// A single message for the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
}

impl ProgressEvent {
    pub fn progress(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Progress,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            message: message.into(),
        }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Done,
            message: message.into(),
        }
    }
}

/// Destination for progress events.
///
/// Emission never fails: a sink whose observer went away drops the event.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: ProgressEvent) {
        (**self).emit(event)
    }
}

impl EventSink for mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // A closed receiver means the observer disconnected; the run goes on.
        let _ = self.send(event);
    }
}

/// Writes events to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        match event.kind {
            EventKind::Progress => tracing::info!("{}", event.message),
            EventKind::Error => tracing::error!("{}", event.message),
            EventKind::Done => tracing::info!(done = true, "{}", event.message),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Messages of the given kind, in emission order.
    pub fn messages(&self, kind: EventKind) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}
