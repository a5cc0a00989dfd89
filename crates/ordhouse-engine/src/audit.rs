//! Append-only audit log.
//!
//! Every mutating ledger operation records an event here and mirrors it to
//! the `tracing` pipeline. Events are never mutated after write; the
//! recovery/audit tooling consumes the list as-is.

use std::sync::{Mutex, PoisonError};

use ordhouse_types::AuditEvent;

/// In-process append-only event log.
#[derive(Debug, Default)]
pub struct AuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and mirror it to `tracing`.
    ///
    /// Callers pass pre-redacted details — see
    /// [`ordhouse_types::redact_address`].
    pub fn record(&self, event: &str, details: serde_json::Value) {
        tracing::info!(event, %details, "audit");
        // An append-only Vec stays consistent even if a writer panicked
        // mid-push on another thread, so poisoning is recoverable here.
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuditEvent::new(event, details));
    }

    /// Snapshot of all recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
