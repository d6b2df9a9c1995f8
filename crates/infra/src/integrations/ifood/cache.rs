//! Merchant status caches
//!
//! The partner asks integrators to cache merchant status for 5 minutes
//! and availability documents for 1 hour rather than hammering the
//! status endpoints. Both caches are keyed by merchant id.

use std::time::Duration;

use moka::sync::Cache;
use prato_domain::StoreStatus;
use serde_json::Value;

pub struct StatusCache {
    status: Cache<String, StoreStatus>,
    availability: Cache<String, Value>,
}

impl StatusCache {
    #[must_use]
    pub fn new(status_ttl: Duration, availability_ttl: Duration) -> Self {
        Self {
            status: Cache::builder().max_capacity(64).time_to_live(status_ttl).build(),
            availability: Cache::builder().max_capacity(64).time_to_live(availability_ttl).build(),
        }
    }

    pub fn status(&self, merchant_id: &str) -> Option<StoreStatus> {
        self.status.get(merchant_id)
    }

    pub fn put_status(&self, merchant_id: &str, status: StoreStatus) {
        self.status.insert(merchant_id.to_string(), status);
    }

    pub fn availability(&self, merchant_id: &str) -> Option<Value> {
        self.availability.get(merchant_id)
    }

    pub fn put_availability(&self, merchant_id: &str, doc: Value) {
        self.availability.insert(merchant_id.to_string(), doc);
    }

    /// Drop everything; used when the store state is known to have changed.
    pub fn invalidate(&self, merchant_id: &str) {
        self.status.invalidate(merchant_id);
        self.availability.invalidate(merchant_id);
    }
}
