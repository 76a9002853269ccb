//! Port for append-only transcript logging.
//!
//! Defines the [`TranscriptLogger`] trait for recording task records
//! (per-subtask request/response pairs and task outcomes) to an
//! append-only log. The core writes records in arrival order and never
//! reads the log back.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the transcript in
//! a machine-readable format (JSONL).

use serde_json::Value;

/// A structured transcript event.
pub struct TranscriptEvent {
    /// Event type identifier (e.g., "subtask", "task").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl TranscriptEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for appending transcript events.
///
/// The `log` method is intentionally synchronous and non-fallible so a
/// failing sink never disrupts the dispatch loop.
pub trait TranscriptLogger: Send + Sync {
    fn log(&self, event: TranscriptEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoTranscriptLogger;

impl TranscriptLogger for NoTranscriptLogger {
    fn log(&self, _event: TranscriptEvent) {}
}
