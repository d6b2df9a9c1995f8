//! Audit trail port
//!
//! Compliance-relevant operations (auth, acknowledgment, cancellations,
//! SLA breaches) are recorded through this sink. Recording is
//! fire-and-forget; an audit failure never fails the operation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A single audit record
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub id: Uuid,
    pub action: String,
    pub connector: String,
    pub occurred_at: DateTime<Utc>,
    pub outcome: AuditOutcome,
    pub detail: Value,
}

/// Result of the audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditEvent {
    /// Build a record timestamped now.
    #[must_use]
    pub fn new(action: &str, connector: &str, outcome: AuditOutcome, detail: Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            action: action.to_string(),
            connector: connector.to_string(),
            occurred_at: Utc::now(),
            outcome,
            detail,
        }
    }
}

/// Destination for audit records
pub trait AuditSink: Send + Sync {
    /// Record an event. Must not block or fail the caller.
    fn record(&self, event: AuditEvent);
}
