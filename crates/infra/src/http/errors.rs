//! Partner API error classification
//!
//! Maps HTTP failures onto domain errors, with the retry metadata the
//! transport needs.

use std::fmt;

use prato_domain::PratoError;
use reqwest::StatusCode;

/// Error category for partner API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication failed (401, 403)
    Authentication,
    /// Rate limit exceeded (429)
    RateLimited,
    /// Invalid request or data (remaining 4xx)
    Validation,
    /// Partner server error (5xx)
    ServerUnavailable,
    /// Unclassified
    Unknown,
}

impl ApiErrorCategory {
    /// True if the transport may retry this failure within a request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Authentication | Self::RateLimited | Self::ServerUnavailable)
    }
}

impl fmt::Display for ApiErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Validation => write!(f, "validation"),
            Self::ServerUnavailable => write!(f, "server unavailable"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A classified partner API failure
#[derive(Debug, Clone)]
pub struct ApiError {
    category: ApiErrorCategory,
    status: u16,
    body: String,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Classify a non-success HTTP response.
    #[must_use]
    pub fn from_response(status: StatusCode, body: String, retry_after_secs: Option<u64>) -> Self {
        let category = match status.as_u16() {
            401 | 403 => ApiErrorCategory::Authentication,
            429 => ApiErrorCategory::RateLimited,
            400..=499 => ApiErrorCategory::Validation,
            500..=599 => ApiErrorCategory::ServerUnavailable,
            _ => ApiErrorCategory::Unknown,
        };
        Self { category, status: status.as_u16(), body, retry_after_secs }
    }

    #[must_use]
    pub fn category(&self) -> ApiErrorCategory {
        self.category
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    /// `Retry-After` value for 429 responses; 60s when the header is
    /// absent or unparseable.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after_secs.unwrap_or(60)
    }

    /// Convert to the domain error type.
    #[must_use]
    pub fn into_domain_error(self) -> PratoError {
        match self.category {
            ApiErrorCategory::Authentication => {
                PratoError::Auth(format!("partner rejected credentials ({}): {}", self.status, self.body))
            }
            ApiErrorCategory::RateLimited => {
                PratoError::RateLimited { retry_after_secs: self.retry_after_secs() }
            }
            _ => PratoError::Api { status: self.status, body: self.body },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HTTP {})", self.category, self.status)
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for PratoError {
    fn from(err: ApiError) -> Self {
        err.into_domain_error()
    }
}
