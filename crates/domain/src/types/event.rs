//! Order events delivered through the partner's polling protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single order event returned by the polling endpoint.
///
/// Events are never deleted; acknowledgment flips the flag exactly once.
/// The raw payload is kept verbatim so downstream consumers can read
/// fields this connector does not model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub order_id: Option<String>,
    pub merchant_id: String,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub acknowledged: bool,
}

impl Event {
    /// Mark this event as acknowledged. Idempotent.
    pub fn mark_acknowledged(&mut self) {
        self.acknowledged = true;
    }
}
