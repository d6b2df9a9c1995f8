//! Marketplace connector port interfaces

use std::collections::HashMap;

use async_trait::async_trait;
use prato_domain::{
    CancellationReason, Event, Order, Result, Revenue, RevenuePeriod, StoreStatus,
};

/// Uniform surface every marketplace connector exposes.
///
/// Implementations own their auth, rate limiting and dedup internally;
/// callers only see normalized domain types.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Poll the marketplace for new order events.
    ///
    /// Returned events are deduplicated; every event appears at most once
    /// across the connector's lifetime.
    async fn poll_events(&self) -> Result<Vec<Event>>;

    /// Acknowledge processed events so the marketplace stops redelivering
    /// them. Events are marked locally only after the marketplace accepts
    /// the acknowledgment.
    async fn acknowledge_events(&self, events: &mut [Event]) -> Result<()>;

    /// Current store status as the marketplace sees it.
    async fn get_store_status(&self) -> Result<StoreStatus>;

    /// Fetch and normalize the full payloads for the orders referenced by
    /// the given events.
    async fn get_orders(&self, events: &[Event]) -> Result<Vec<Order>>;

    /// Confirm an order.
    async fn confirm_order(&self, order_id: &str) -> Result<()>;

    /// Cancel an order with a marketplace-accepted reason code.
    async fn cancel_order(&self, order_id: &str, reason_code: &str) -> Result<()>;

    /// Financial summary for a reporting period.
    async fn get_revenue(&self, period: RevenuePeriod) -> Result<Revenue>;

    /// Cancellation reasons the marketplace accepts.
    async fn cancellation_reasons(&self) -> Result<Vec<CancellationReason>>;

    /// Push item availability/stock to the marketplace catalog.
    async fn update_inventory(&self, items: &[serde_json::Value]) -> Result<()>;

    /// Release the connector's resources. Further calls fail.
    async fn close(&self) -> Result<()>;
}

/// Source of API credentials and other secrets.
///
/// Keeps secret storage (vault, env, keychain) out of the connector.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Fetch a named secret bundle as key/value pairs.
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>>;
}
