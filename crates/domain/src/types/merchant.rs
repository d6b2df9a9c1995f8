//! Merchant status and financial summary types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized store state.
///
/// The partner reports `AVAILABLE`/`UNAVAILABLE`/`BUSY`/`OFFLINE`; the
/// rest of the system only cares about open/closed/paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Open,
    Closed,
    Paused,
    Unknown,
}

impl StoreState {
    /// Map a partner state string to the normalized state.
    #[must_use]
    pub fn from_partner_state(state: &str) -> Self {
        match state {
            "AVAILABLE" => Self::Open,
            "UNAVAILABLE" | "OFFLINE" => Self::Closed,
            "BUSY" => Self::Paused,
            _ => Self::Unknown,
        }
    }
}

/// Current store status as seen by the marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub status: StoreState,
    pub connector: String,
    pub updated_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Reporting period for financial summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenuePeriod {
    Today,
    Week,
    Month,
}

impl RevenuePeriod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Best-selling item within a reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopItem {
    pub name: String,
    pub quantity: i64,
    pub revenue: f64,
}

/// Financial summary for a reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revenue {
    pub period: RevenuePeriod,
    pub total_revenue: f64,
    pub total_orders: i64,
    pub average_ticket: f64,
    pub top_items: Vec<TopItem>,
    pub connector: String,
    pub generated_at: DateTime<Utc>,
}

/// A cancellation reason the partner accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReason {
    pub code: String,
    pub description: String,
    pub category: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn partner_states_map_to_normalized_states() {
        assert_eq!(StoreState::from_partner_state("AVAILABLE"), StoreState::Open);
        assert_eq!(StoreState::from_partner_state("UNAVAILABLE"), StoreState::Closed);
        assert_eq!(StoreState::from_partner_state("OFFLINE"), StoreState::Closed);
        assert_eq!(StoreState::from_partner_state("BUSY"), StoreState::Paused);
        assert_eq!(StoreState::from_partner_state("SOMETHING_NEW"), StoreState::Unknown);
    }
}
