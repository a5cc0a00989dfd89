//! Audit event model — the append-only record every mutating operation
//! writes to.
//!
//! Events carry redacted detail payloads: full addresses never land in the
//! audit trail, only enough of each to correlate with wallet records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One security- or state-relevant event. Never mutated after write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    /// Snake-case event name, e.g. `bid_payment_confirmed`.
    pub event: String,
    /// Redacted, structured details for the recovery/audit tooling.
    pub details: serde_json::Value,
}

impl AuditEvent {
    #[must_use]
    pub fn new(event: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            details,
        }
    }
}

/// Redact an address for audit/log output: keep the prefix and the last
/// four characters, drop the middle.
#[must_use]
pub fn redact_address(address: &str) -> String {
    if address.len() <= 12 {
        return "[redacted]".to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
