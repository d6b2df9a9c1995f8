//! OAuth credentials and token types
//!
//! The partner uses plain OAuth 2.0 client-credentials with an optional
//! refresh token. Tokens are value types: the token manager replaces the
//! whole value on refresh rather than mutating fields in place.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Partner API credentials
///
/// Immutable once loaded from the secrets provider; cached for the
/// connector's lifetime.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub merchant_id: String,
    pub webhook_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("merchant_id", &self.merchant_id)
            .field("webhook_secret", &"<redacted>")
            .finish()
    }
}

/// OAuth 2.0 access token with validity window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,

    /// Some providers do not issue a refresh token on every exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer" for OAuth 2.0)
    pub token_type: String,

    /// When this token was issued (UTC)
    pub issued_at: DateTime<Utc>,

    /// Absolute expiration timestamp (UTC)
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token whose validity window starts now.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        token_type: String,
        expires_in_secs: i64,
    ) -> Self {
        let issued_at = Utc::now();
        Self {
            access_token,
            refresh_token,
            token_type,
            issued_at,
            expires_at: issued_at + Duration::seconds(expires_in_secs.max(0)),
        }
    }

    /// Create a token with an explicit validity window.
    ///
    /// Used by tests that need to position "now" inside the lifetime.
    #[must_use]
    pub fn with_validity(
        access_token: String,
        refresh_token: Option<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            issued_at,
            expires_at,
        }
    }

    /// True once the expiration timestamp has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// True once 80% of the token lifetime has elapsed.
    ///
    /// The partner expects clients to refresh proactively at this point
    /// rather than riding tokens to expiry.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        let lifetime = self.expires_at - self.issued_at;
        let refresh_at = self.expires_at - lifetime / 5;
        Utc::now() >= refresh_at
    }

    /// Seconds until the token expires (negative if already expired).
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }

    /// `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn token_with_lifetime(elapsed_secs: i64, total_secs: i64) -> AccessToken {
        let now = Utc::now();
        AccessToken::with_validity(
            "access".to_string(),
            Some("refresh".to_string()),
            now - Duration::seconds(elapsed_secs),
            now + Duration::seconds(total_secs - elapsed_secs),
        )
    }

    #[test]
    fn fresh_token_is_not_expired_and_not_due_for_refresh() {
        let token = token_with_lifetime(0, 10_800);
        assert!(!token.is_expired());
        assert!(!token.needs_refresh());
    }

    #[test]
    fn token_past_expiry_is_expired() {
        let token = token_with_lifetime(200, 100);
        assert!(token.is_expired());
    }

    #[test]
    fn token_needs_refresh_after_eighty_percent_of_lifetime() {
        // 81 of 100 seconds elapsed
        let token = token_with_lifetime(81, 100);
        assert!(!token.is_expired());
        assert!(token.needs_refresh());
    }

    #[test]
    fn token_below_refresh_threshold_does_not_need_refresh() {
        // 79 of 100 seconds elapsed
        let token = token_with_lifetime(79, 100);
        assert!(!token.needs_refresh());
    }

    #[test]
    fn authorization_header_joins_type_and_token() {
        let token =
            AccessToken::new("abc123".to_string(), None, "Bearer".to_string(), 3600);
        assert_eq!(token.authorization_header(), "Bearer abc123");
    }

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = Credentials {
            client_id: "cid".to_string(),
            client_secret: "super-secret".to_string(),
            merchant_id: "m-1".to_string(),
            webhook_secret: "hook-secret".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("cid"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("hook-secret"));
    }
}
