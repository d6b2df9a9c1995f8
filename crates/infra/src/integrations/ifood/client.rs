//! iFood merchant API client
//!
//! Owns the authenticated transport, the dedup registry and the status
//! caches, and exposes the partner operations with domain types. The
//! higher-level [`IfoodConnector`](super::connector::IfoodConnector)
//! adapts this client to the platform's connector port.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prato_common::{SlidingWindowConfig, SlidingWindowLimiter};
use prato_core::{AuditEvent, AuditOutcome, AuditSink, SecretsProvider};
use prato_domain::constants::{RATE_WINDOW, SLA_CONFIRMATION, SLA_DEFAULT, SLA_POLLING};
use prato_domain::{
    CancellationReason, Event, PratoError, Result, StoreState, StoreStatus,
};
use serde_json::{json, Value};
use tracing::info;

use super::auth::TokenManager;
use super::cache::StatusCache;
use super::events::{Acknowledger, EventDeduplicator, EventPoller};
use super::types::{OrdersResponse, ReasonsResponse, SalesReport, SalesResponse};
use super::{webhook, CONNECTOR};
use crate::config::IfoodConfig;
use crate::http::{TokenSource, Transport};

pub struct IfoodClient {
    transport: Arc<Transport>,
    poller: EventPoller,
    acknowledger: Acknowledger,
    caches: StatusCache,
    audit: Arc<dyn AuditSink>,
    merchant_id: String,
    webhook_secret: String,
    closed: AtomicBool,
}

impl IfoodClient {
    /// Build a client: load credentials, wire up the rate limiter, the
    /// token manager and the transport.
    pub async fn connect(
        config: IfoodConfig,
        secrets: Arc<dyn SecretsProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        config.validate()?;
        config.log_config();

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(SLA_DEFAULT.budget)
            .build()
            .map_err(|e| PratoError::Config(format!("building http client: {e}")))?;

        let limiter = Arc::new(
            SlidingWindowLimiter::new(SlidingWindowConfig {
                max_requests: config.max_requests_per_minute,
                window: RATE_WINDOW,
            })
            .map_err(PratoError::Config)?,
        );

        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            config.auth_url.clone(),
            limiter.clone(),
            secrets,
            config.secret_name.clone(),
            audit.clone(),
        ));
        let creds = tokens.credentials().await?.clone();

        let transport = Arc::new(Transport::new(
            http,
            config.base_url.clone(),
            limiter,
            tokens as Arc<dyn TokenSource>,
            audit.clone(),
            CONNECTOR,
        ));

        let dedup = Arc::new(EventDeduplicator::new(config.dedup_capacity));
        let poller =
            EventPoller::new(transport.clone(), dedup.clone(), creds.merchant_id.clone());
        let acknowledger = Acknowledger::new(
            transport.clone(),
            dedup,
            audit.clone(),
            config.ack_retry_backoff,
        );
        let caches = StatusCache::new(config.status_cache_ttl, config.availability_cache_ttl);

        info!(merchant_id = %creds.merchant_id, "ifood client ready");
        Ok(Self {
            transport,
            poller,
            acknowledger,
            caches,
            audit,
            merchant_id: creds.merchant_id,
            webhook_secret: creds.webhook_secret,
            closed: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PratoError::Config("connector is closed".to_string()));
        }
        Ok(())
    }

    /// One polling pass over the event stream.
    pub async fn poll_events(&self) -> Result<Vec<Event>> {
        self.ensure_open()?;
        self.poller.poll().await
    }

    /// Acknowledge a batch of polled events.
    pub async fn acknowledge_events(&self, events: &mut [Event]) -> Result<()> {
        self.ensure_open()?;
        self.acknowledger.acknowledge(events).await
    }

    /// Normalized store status, served from cache when fresh.
    ///
    /// A status-cache miss always hits the partner endpoint; the
    /// longer-lived availability cache is refreshed as a side effect but
    /// never stands in for a live status read.
    pub async fn get_store_status(&self) -> Result<StoreStatus> {
        self.ensure_open()?;
        if let Some(status) = self.caches.status(&self.merchant_id) {
            return Ok(status);
        }

        let raw = self.fetch_status_document().await?;
        let state = raw.get("state").and_then(Value::as_str).unwrap_or("UNKNOWN");
        let status = StoreStatus {
            status: StoreState::from_partner_state(state),
            connector: CONNECTOR.to_string(),
            updated_at: Utc::now(),
            reason: raw
                .get("unavailabilityReason")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        self.caches.put_status(&self.merchant_id, status.clone());
        Ok(status)
    }

    /// Raw availability document, served from the long-lived cache.
    ///
    /// For consumers that only care about the slow-moving availability
    /// fields; [`get_store_status`](Self::get_store_status) is the live
    /// read.
    pub async fn availability_document(&self) -> Result<Value> {
        self.ensure_open()?;
        if let Some(doc) = self.caches.availability(&self.merchant_id) {
            return Ok(doc);
        }
        self.fetch_status_document().await
    }

    async fn fetch_status_document(&self) -> Result<Value> {
        let path = format!("/order/v1.0/merchants/{}/status", self.merchant_id);
        let doc: Value = self.transport.get_json(&path, SLA_POLLING).await?;
        self.caches.put_availability(&self.merchant_id, doc.clone());
        Ok(doc)
    }

    /// Raw order document by id.
    pub async fn get_order(&self, order_id: &str) -> Result<Value> {
        self.ensure_open()?;
        let path = format!("/order/v1.0/orders/{order_id}");
        self.transport.get_json(&path, SLA_DEFAULT).await
    }

    /// Raw order documents for this merchant, optionally filtered by status.
    pub async fn orders(&self, status: Option<&str>) -> Result<Vec<Value>> {
        self.ensure_open()?;
        let mut path = format!("/order/v1.0/merchants/{}/orders", self.merchant_id);
        if let Some(status) = status {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("status", status)
                .finish();
            path = format!("{path}?{query}");
        }
        let response: OrdersResponse = self.transport.get_json(&path, SLA_POLLING).await?;
        Ok(response.orders)
    }

    /// Confirm an order within the confirmation latency budget.
    pub async fn confirm_order(&self, order_id: &str) -> Result<()> {
        self.ensure_open()?;
        let path = format!("/order/v1.0/orders/{order_id}/confirm");
        self.transport.post_empty(&path, SLA_CONFIRMATION, None).await?;
        self.audit.record(AuditEvent::new(
            "order_confirmation",
            CONNECTOR,
            AuditOutcome::Success,
            json!({"order_id": order_id}),
        ));
        info!(order_id, "order confirmed");
        Ok(())
    }

    /// Cancel an order with a partner-accepted reason code.
    pub async fn cancel_order(&self, order_id: &str, reason_code: &str) -> Result<()> {
        self.ensure_open()?;
        if reason_code.trim().is_empty() {
            return Err(PratoError::InvalidInput(
                "cancellation requires a reason code".to_string(),
            ));
        }
        let path = format!("/order/v1.0/orders/{order_id}/cancel");
        let body = json!({"reason": reason_code});
        self.transport.post_empty(&path, SLA_CONFIRMATION, Some(&body)).await?;
        self.audit.record(AuditEvent::new(
            "order_cancellation",
            CONNECTOR,
            AuditOutcome::Success,
            json!({"order_id": order_id, "reason": reason_code}),
        ));
        info!(order_id, reason_code, "order cancelled");
        Ok(())
    }

    /// Cancellation reasons the partner accepts.
    pub async fn cancellation_reasons(&self) -> Result<Vec<CancellationReason>> {
        self.ensure_open()?;
        let response: ReasonsResponse =
            self.transport.get_json("/order/v1.0/cancellationReasons", SLA_POLLING).await?;
        Ok(response.reasons)
    }

    /// Sales report for a date range from the financial endpoint.
    pub async fn sales(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<SalesReport> {
        self.ensure_open()?;
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("startDate", &start.to_rfc3339())
            .append_pair("endDate", &end.to_rfc3339())
            .finish();
        let path =
            format!("/financial/v1.0/merchants/{}/sales?{}", self.merchant_id, query);
        let response: SalesResponse = self.transport.get_json(&path, SLA_POLLING).await?;
        Ok(response.sales)
    }

    /// Push catalog items through the ingestion endpoint.
    pub async fn update_inventory(&self, items: &[Value]) -> Result<()> {
        self.ensure_open()?;
        if items.is_empty() {
            return Ok(());
        }
        let path = format!("/item/v1.0/ingestion/{}?reset=false", self.merchant_id);
        let body = json!({"items": items});
        self.transport.post_empty(&path, SLA_CONFIRMATION, Some(&body)).await?;
        info!(count = items.len(), "inventory update submitted");
        Ok(())
    }

    /// Begin picking for an order. Must precede [`end_separation`](Self::end_separation).
    pub async fn start_separation(&self, order_id: &str) -> Result<()> {
        self.ensure_open()?;
        let path = format!("/order/v1.0/orders/{order_id}/startSeparation");
        self.transport.post_empty(&path, SLA_CONFIRMATION, None).await
    }

    /// Finish picking for an order.
    pub async fn end_separation(&self, order_id: &str) -> Result<()> {
        self.ensure_open()?;
        let path = format!("/order/v1.0/orders/{order_id}/endSeparation");
        self.transport.post_empty(&path, SLA_CONFIRMATION, None).await
    }

    /// Verify a webhook delivery against this merchant's secret.
    #[must_use]
    pub fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool {
        webhook::verify_signature(&self.webhook_secret, payload, signature)
    }

    /// Mark the client closed. Subsequent calls fail with a config error.
    pub async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.audit.record(AuditEvent::new(
            "connector_closed",
            CONNECTOR,
            AuditOutcome::Success,
            json!({"merchant_id": self.merchant_id}),
        ));
        info!("ifood client closed");
        Ok(())
    }
}
