//! OAuth 2.0 token management for the iFood merchant API
//!
//! The partner issues 3-hour access tokens and 7-day refresh tokens via
//! a form-encoded client-credentials exchange. Tokens are refreshed
//! proactively once 80% of the lifetime has elapsed; a failed refresh
//! falls back to a full re-authentication.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use prato_common::SlidingWindowLimiter;
use prato_core::{AuditEvent, AuditOutcome, AuditSink, SecretsProvider};
use prato_domain::constants::SLA_AUTH;
use prato_domain::{AccessToken, Credentials, PratoError, Result};
use serde_json::json;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};

use super::types::TokenResponse;
use super::CONNECTOR;
use crate::http::TokenSource;

/// Manages the connector's OAuth session.
///
/// Token replacement is atomic: a refresh swaps the whole value under
/// the write lock, so readers never observe a half-updated token.
pub struct TokenManager {
    http: reqwest::Client,
    auth_url: String,
    limiter: Arc<SlidingWindowLimiter>,
    secrets: Arc<dyn SecretsProvider>,
    secret_name: String,
    audit: Arc<dyn AuditSink>,
    credentials: OnceCell<Credentials>,
    token: RwLock<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(
        http: reqwest::Client,
        auth_url: String,
        limiter: Arc<SlidingWindowLimiter>,
        secrets: Arc<dyn SecretsProvider>,
        secret_name: String,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            http,
            auth_url,
            limiter,
            secrets,
            secret_name,
            audit,
            credentials: OnceCell::new(),
            token: RwLock::new(None),
        }
    }

    /// Credentials from the secrets provider, loaded once and cached.
    pub async fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .get_or_try_init(|| async {
                let bundle = self.secrets.get_secret(&self.secret_name).await?;
                let field = |key: &str| {
                    bundle.get(key).cloned().ok_or_else(|| {
                        PratoError::Config(format!("secret bundle missing field: {key}"))
                    })
                };
                Ok(Credentials {
                    client_id: field("client_id")?,
                    client_secret: field("client_secret")?,
                    merchant_id: field("merchant_id")?,
                    webhook_secret: field("webhook_secret")?,
                })
            })
            .await
    }

    /// A valid token, authenticating or refreshing as needed.
    pub async fn ensure_fresh(&self) -> Result<AccessToken> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if !token.is_expired() && !token.needs_refresh() {
                    return Ok(token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = guard.as_ref() {
            if !token.is_expired() && !token.needs_refresh() {
                return Ok(token.clone());
            }
        }

        let refresh_token =
            guard.as_ref().filter(|t| !t.is_expired()).and_then(|t| t.refresh_token.clone());

        let new_token = match refresh_token {
            Some(rt) => match self.refresh(&rt).await {
                Ok(token) => token,
                Err(err) => {
                    warn!(error = %err, "token refresh failed, re-authenticating");
                    self.authenticate().await?
                }
            },
            None => self.authenticate().await?,
        };

        *guard = Some(new_token.clone());
        Ok(new_token)
    }

    async fn authenticate(&self) -> Result<AccessToken> {
        let creds = self.credentials().await?;
        info!("authenticating with partner oauth");
        let form = [
            ("grantType", "client_credentials"),
            ("clientId", creds.client_id.as_str()),
            ("clientSecret", creds.client_secret.as_str()),
        ];
        self.token_request(&form, "auth").await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        let creds = self.credentials().await?;
        info!("refreshing access token");
        let form = [
            ("grantType", "refresh_token"),
            ("clientId", creds.client_id.as_str()),
            ("refreshToken", refresh_token),
        ];
        let mut token = self.token_request(&form, "token_refresh").await?;
        // Some exchanges omit the refresh token; keep the old one.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    async fn token_request(&self, form: &[(&str, &str)], action: &str) -> Result<AccessToken> {
        self.limiter.acquire().await;

        let started = Instant::now();
        let result =
            self.http.post(&self.auth_url).timeout(SLA_AUTH.budget).form(form).send().await;
        let elapsed = started.elapsed();

        let response = match result {
            Ok(r) => r,
            Err(err) => {
                self.audit.record(AuditEvent::new(
                    action,
                    CONNECTOR,
                    AuditOutcome::Failure,
                    json!({"error": err.to_string()}),
                ));
                if err.is_timeout() {
                    return Err(PratoError::Timeout {
                        method: "POST".to_string(),
                        path: self.auth_url.clone(),
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
                return Err(PratoError::Network(err.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.audit.record(AuditEvent::new(
                action,
                CONNECTOR,
                AuditOutcome::Failure,
                json!({"status": status.as_u16()}),
            ));
            return Err(PratoError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let wire: TokenResponse = response
            .json()
            .await
            .map_err(|e| PratoError::Auth(format!("decoding token response: {e}")))?;
        let token =
            AccessToken::new(wire.access_token, wire.refresh_token, wire.token_type, wire.expires_in);

        self.audit.record(AuditEvent::new(
            action,
            CONNECTOR,
            AuditOutcome::Success,
            json!({"expires_in_secs": token.seconds_until_expiry()}),
        ));
        info!(expires_at = %token.expires_at, "token obtained");
        Ok(token)
    }

    #[cfg(test)]
    pub(crate) async fn install_token(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }
}

#[async_trait]
impl TokenSource for TokenManager {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.ensure_fresh().await?.authorization_header())
    }

    async fn force_reauthenticate(&self) -> Result<()> {
        let mut guard = self.token.write().await;
        let token = self.authenticate().await?;
        *guard = Some(token);
        Ok(())
    }
}
