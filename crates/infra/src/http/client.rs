//! Rate-limited, authenticated HTTP transport
//!
//! Every partner API call goes through [`Transport`]: it waits for a
//! rate limit slot, attaches a fresh bearer token, applies the
//! operation's latency budget as the request timeout, and records
//! budget overruns in the audit trail.
//!
//! One in-request retry is allowed for 401 (after forcing a token
//! refresh) and 429 (after honoring `Retry-After`). Everything else is
//! classified and returned to the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use prato_common::SlidingWindowLimiter;
use prato_core::{AuditEvent, AuditOutcome, AuditSink};
use prato_domain::constants::SlaBudget;
use prato_domain::{PratoError, Result};
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::errors::ApiError;

/// Source of bearer tokens for outbound requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// `Authorization` header value, refreshing proactively if needed.
    async fn bearer_token(&self) -> Result<String>;

    /// Discard the cached token and authenticate from scratch. Called
    /// when the partner rejects a token the client thought was valid.
    async fn force_reauthenticate(&self) -> Result<()>;
}

/// Authenticated transport bound to one partner API base URL.
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    limiter: Arc<SlidingWindowLimiter>,
    tokens: Arc<dyn TokenSource>,
    audit: Arc<dyn AuditSink>,
    connector: String,
}

// Initial try plus one retry for 401/429.
const MAX_ATTEMPTS: usize = 2;

impl Transport {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        limiter: Arc<SlidingWindowLimiter>,
        tokens: Arc<dyn TokenSource>,
        audit: Arc<dyn AuditSink>,
        connector: &str,
    ) -> Self {
        Self { http, base_url, limiter, tokens, audit, connector: connector.to_string() }
    }

    /// GET returning deserialized JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, sla: SlaBudget) -> Result<T> {
        let response = self.execute(Method::GET, path, sla, None, &[]).await?;
        decode(response, path).await
    }

    /// GET with extra headers, returning `None` on an empty response.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        sla: SlaBudget,
        headers: &[(&str, String)],
    ) -> Result<Option<T>> {
        let response = self.execute(Method::GET, path, sla, None, headers).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let text = response
            .text()
            .await
            .map_err(|e| PratoError::Network(format!("reading response body: {e}")))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| PratoError::Internal(format!("decoding response from {path}: {e}")))
    }

    /// POST returning deserialized JSON.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        sla: SlaBudget,
        body: &Value,
    ) -> Result<T> {
        let response = self.execute(Method::POST, path, sla, Some(body), &[]).await?;
        decode(response, path).await
    }

    /// POST where the response body does not matter (202-style APIs).
    pub async fn post_empty(&self, path: &str, sla: SlaBudget, body: Option<&Value>) -> Result<()> {
        self.execute(Method::POST, path, sla, body, &[]).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        sla: SlaBudget,
        body: Option<&Value>,
        headers: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 0..MAX_ATTEMPTS {
            self.limiter.acquire().await;
            let auth = self.tokens.bearer_token().await?;

            let mut builder =
                self.http.request(method.clone(), &url).timeout(sla.budget).header(AUTHORIZATION, auth);
            for (name, value) in headers {
                builder = builder.header(*name, value);
            }
            if let Some(json_body) = body {
                builder = builder.json(json_body);
            }

            let started = Instant::now();
            let result = builder.send().await;
            let elapsed = started.elapsed();
            self.observe_sla(&method, path, sla, elapsed);

            let response = match result {
                Ok(r) => r,
                Err(err) if err.is_timeout() => {
                    return Err(PratoError::Timeout {
                        method: method.to_string(),
                        path: path.to_string(),
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
                Err(err) => return Err(PratoError::Network(err.to_string())),
            };

            let status = response.status();
            debug!(%method, path, %status, elapsed_ms = elapsed.as_millis() as u64, "partner api request");

            if status.is_success() {
                return Ok(response);
            }

            let retry_after = parse_retry_after(response.headers());
            let body_text = response.text().await.unwrap_or_default();
            let api_err = ApiError::from_response(status, body_text, retry_after);

            if status == StatusCode::UNAUTHORIZED && attempt + 1 < MAX_ATTEMPTS {
                warn!(path, "token rejected, re-authenticating");
                self.tokens.force_reauthenticate().await?;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS && attempt + 1 < MAX_ATTEMPTS {
                let wait = api_err.retry_after_secs();
                warn!(path, wait_secs = wait, "partner rate limit hit, backing off");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            return Err(api_err.into());
        }

        Err(PratoError::Internal("transport exhausted attempts without a result".to_string()))
    }

    fn observe_sla(&self, method: &Method, path: &str, sla: SlaBudget, elapsed: Duration) {
        if elapsed <= sla.budget {
            return;
        }
        warn!(
            operation = sla.operation,
            %method,
            path,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = sla.budget.as_millis() as u64,
            "latency budget exceeded"
        );
        self.audit.record(AuditEvent::new(
            "sla_breach",
            &self.connector,
            AuditOutcome::Failure,
            json!({
                "operation": sla.operation,
                "method": method.as_str(),
                "path": path,
                "elapsed_ms": elapsed.as_millis() as u64,
                "budget_ms": sla.budget.as_millis() as u64,
            }),
        ));
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PratoError::Internal(format!("decoding response from {path}: {e}")))
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.parse().ok()
}
