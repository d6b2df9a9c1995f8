//! Wire-format types for the iFood merchant API
//!
//! The partner uses camelCase JSON throughout. These structs stay
//! private to the integration; everything leaving this module is a
//! normalized domain type.

use prato_domain::{CancellationReason, TopItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OAuth token endpoint response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Polling endpoint response. Events stay raw; mapping happens in the
/// poller so one malformed event never fails the batch.
#[derive(Debug, Default, Deserialize)]
pub struct PollingResponse {
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Acknowledgment request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgmentRequest {
    pub event_ids: Vec<String>,
}

/// Cancellation reasons endpoint response
#[derive(Debug, Default, Deserialize)]
pub struct ReasonsResponse {
    #[serde(default)]
    pub reasons: Vec<CancellationReason>,
}

/// Merchant orders listing response
#[derive(Debug, Default, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<Value>,
}

/// Sales report inside the financial endpoint response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub total_orders: i64,
    #[serde(default)]
    pub top_items: Vec<TopItem>,
}

/// Financial sales endpoint response
#[derive(Debug, Default, Deserialize)]
pub struct SalesResponse {
    #[serde(default)]
    pub sales: SalesReport,
}
