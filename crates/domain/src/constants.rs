//! Domain constants
//!
//! Centralized location for partner endpoints, rate limits and the
//! per-operation latency budgets the partner's certification measures.

use std::time::Duration;

/// Partner merchant API base URL
pub const IFOOD_BASE_URL: &str = "https://merchant-api.ifood.com.br";

/// OAuth token endpoint path (relative to the base URL)
pub const IFOOD_AUTH_PATH: &str = "/authentication/v1.0/oauth/token";

// Rate limiting
pub const MAX_REQUESTS_PER_MINUTE: usize = 60;
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

// Deduplication registry bound (the partner's redelivery window is finite)
pub const DEFAULT_DEDUP_CAPACITY: usize = 10_000;

// Caching
pub const STATUS_CACHE_TTL: Duration = Duration::from_secs(300);
pub const AVAILABILITY_CACHE_TTL: Duration = Duration::from_secs(3600);

// Acknowledgment retry
pub const ACK_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// A per-operation latency budget.
///
/// The budget doubles as the request deadline and as the observed SLA:
/// a completed call that exceeds it is logged as a breach but never failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaBudget {
    pub operation: &'static str,
    pub budget: Duration,
}

pub const SLA_AUTH: SlaBudget = SlaBudget { operation: "auth", budget: Duration::from_secs(10) };
pub const SLA_POLLING: SlaBudget =
    SlaBudget { operation: "polling", budget: Duration::from_secs(5) };
pub const SLA_CONFIRMATION: SlaBudget =
    SlaBudget { operation: "confirmation", budget: Duration::from_secs(2) };
pub const SLA_ACKNOWLEDGMENT: SlaBudget =
    SlaBudget { operation: "acknowledgment", budget: Duration::from_secs(1) };
pub const SLA_DEFAULT: SlaBudget =
    SlaBudget { operation: "default", budget: Duration::from_secs(30) };
