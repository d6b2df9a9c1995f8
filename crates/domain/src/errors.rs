//! Error types used throughout the connector

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Prato
///
/// Transient conditions the transport recovers from internally (a single
/// 429, a single 401) never surface through this type; everything else
/// carries enough context (endpoint, status, elapsed time) for the caller
/// to log and audit.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PratoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Partner API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Timeout after {elapsed_ms}ms: {method} {path}")]
    Timeout { method: String, path: String, elapsed_ms: u64 },

    #[error("Acknowledgment failed: {0}")]
    Ack(String),

    #[error("Webhook signature rejected: {0}")]
    Signature(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Prato operations
pub type Result<T> = std::result::Result<T, PratoError>;
