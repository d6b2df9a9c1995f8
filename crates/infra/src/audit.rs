//! Audit sink implementations

use prato_core::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{info, warn};

/// Audit sink that emits structured tracing events.
///
/// The platform's log pipeline ships these to the compliance store;
/// nothing is buffered locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match event.outcome {
            AuditOutcome::Success => info!(
                target: "audit",
                id = %event.id,
                action = %event.action,
                connector = %event.connector,
                detail = %event.detail,
                "audit"
            ),
            AuditOutcome::Failure => warn!(
                target: "audit",
                id = %event.id,
                action = %event.action,
                connector = %event.connector,
                detail = %event.detail,
                "audit"
            ),
        }
    }
}

/// Audit sink that discards everything. For tests and tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
