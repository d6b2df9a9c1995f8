//! Event polling, deduplication and acknowledgment
//!
//! The partner redelivers events until they are acknowledged, and
//! certification requires that redeliveries never reach downstream
//! consumers twice. The dedup registry is the source of truth: an event
//! id enters it only after the partner has accepted the acknowledgment,
//! so a crash between poll and ack results in redelivery, never loss.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use prato_core::{AuditEvent, AuditOutcome, AuditSink};
use prato_domain::constants::{SLA_ACKNOWLEDGMENT, SLA_POLLING};
use prato_domain::{Event, PratoError, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::types::{AcknowledgmentRequest, PollingResponse};
use super::CONNECTOR;
use crate::http::Transport;

pub const POLLING_PATH: &str = "/order/v1.0/events:polling";
pub const ACK_PATH: &str = "/order/v1.0/events/acknowledgment";

/// Bounded registry of acknowledged event ids.
///
/// Insertion order is tracked so the registry evicts its oldest entries
/// when full. The capacity comfortably exceeds the partner's redelivery
/// window, so eviction never reintroduces a live duplicate.
pub struct EventDeduplicator {
    capacity: usize,
    inner: Mutex<DedupInner>,
}

struct DedupInner {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl EventDeduplicator {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(DedupInner {
                seen: HashSet::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().seen.contains(id)
    }

    pub fn insert(&self, id: String) {
        let mut inner = self.lock();
        if inner.seen.contains(&id) {
            return;
        }
        if inner.seen.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.seen.remove(&oldest);
            }
        }
        inner.seen.insert(id.clone());
        inner.order.push_back(id);
    }

    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DedupInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("dedup registry lock poisoned");
                poisoned.into_inner()
            }
        }
    }
}

/// Polls the partner's event stream for one merchant.
pub struct EventPoller {
    transport: Arc<Transport>,
    dedup: Arc<EventDeduplicator>,
    merchant_id: String,
}

impl EventPoller {
    pub fn new(transport: Arc<Transport>, dedup: Arc<EventDeduplicator>, merchant_id: String) -> Self {
        Self { transport, dedup, merchant_id }
    }

    /// One polling pass: fetch, filter to our merchant, drop duplicates.
    pub async fn poll(&self) -> Result<Vec<Event>> {
        let headers = [("x-polling-merchants", self.merchant_id.clone())];
        let response: Option<PollingResponse> =
            self.transport.get_optional(POLLING_PATH, SLA_POLLING, &headers).await?;
        let raw_events = response.map(|r| r.events).unwrap_or_default();

        let mut events = Vec::new();
        for raw in &raw_events {
            let Some(event) = map_event(raw) else {
                warn!("discarding malformed event payload");
                continue;
            };
            if event.merchant_id != self.merchant_id {
                debug!(event_id = %event.id, merchant = %event.merchant_id, "skipping foreign merchant event");
                continue;
            }
            if self.dedup.contains(&event.id) {
                info!(event_id = %event.id, "duplicate event discarded");
                continue;
            }
            events.push(event);
        }

        info!(received = raw_events.len(), delivered = events.len(), "polled events");
        Ok(events)
    }
}

fn map_event(raw: &Value) -> Option<Event> {
    let id = raw.get("id")?.as_str()?.to_string();
    let event_type = raw
        .get("type")
        .or_else(|| raw.get("fullCode"))
        .or_else(|| raw.get("code"))
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();
    let order_id = raw.get("orderId").and_then(Value::as_str).map(str::to_string);
    let merchant_id =
        raw.get("merchantId").and_then(Value::as_str).unwrap_or_default().to_string();
    let created_at = raw
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(Event {
        id,
        event_type,
        order_id,
        merchant_id,
        created_at,
        payload: raw.clone(),
        acknowledged: false,
    })
}

/// Acknowledges polled events with the partner.
pub struct Acknowledger {
    transport: Arc<Transport>,
    dedup: Arc<EventDeduplicator>,
    audit: Arc<dyn AuditSink>,
    retry_backoff: Duration,
}

impl Acknowledger {
    pub fn new(
        transport: Arc<Transport>,
        dedup: Arc<EventDeduplicator>,
        audit: Arc<dyn AuditSink>,
        retry_backoff: Duration,
    ) -> Self {
        Self { transport, dedup, audit, retry_backoff }
    }

    /// Acknowledge every unacknowledged event in the batch.
    ///
    /// Ids already in the dedup registry are never re-submitted; their
    /// events are marked locally and skipped. The rest are marked and
    /// registered only after the partner accepts the batch. One retry is
    /// attempted before the failure is surfaced as [`PratoError::Ack`].
    pub async fn acknowledge(&self, events: &mut [Event]) -> Result<()> {
        let mut ids = Vec::new();
        for event in events.iter_mut() {
            if event.acknowledged {
                continue;
            }
            if self.dedup.contains(&event.id) {
                info!(event_id = %event.id, "event already acknowledged, skipping");
                event.mark_acknowledged();
                continue;
            }
            if !ids.contains(&event.id) {
                ids.push(event.id.clone());
            }
        }
        if ids.is_empty() {
            debug!("nothing to acknowledge");
            return Ok(());
        }

        let body = serde_json::to_value(AcknowledgmentRequest { event_ids: ids.clone() })
            .map_err(|e| PratoError::Internal(format!("encoding acknowledgment: {e}")))?;

        if let Err(first) = self.send(&body).await {
            warn!(error = %first, "acknowledgment failed, retrying once");
            tokio::time::sleep(self.retry_backoff).await;
            if let Err(second) = self.send(&body).await {
                self.audit.record(AuditEvent::new(
                    "event_acknowledgment",
                    CONNECTOR,
                    AuditOutcome::Failure,
                    json!({"count": ids.len(), "error": second.to_string()}),
                ));
                return Err(PratoError::Ack(format!(
                    "acknowledgment failed after retry: {second}"
                )));
            }
        }

        for event in events.iter_mut() {
            if !event.acknowledged {
                self.dedup.insert(event.id.clone());
                event.mark_acknowledged();
            }
        }

        self.audit.record(AuditEvent::new(
            "event_acknowledgment",
            CONNECTOR,
            AuditOutcome::Success,
            json!({"count": ids.len()}),
        ));
        info!(count = ids.len(), "acknowledged events");
        Ok(())
    }

    async fn send(&self, body: &Value) -> Result<()> {
        self.transport.post_empty(ACK_PATH, SLA_ACKNOWLEDGMENT, Some(body)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use prato_common::{SlidingWindowConfig, SlidingWindowLimiter};
    use prato_core::testing::RecordingAuditSink;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::TokenSource;

    struct StaticTokens;

    #[async_trait]
    impl TokenSource for StaticTokens {
        async fn bearer_token(&self) -> Result<String> {
            Ok("Bearer test".to_string())
        }

        async fn force_reauthenticate(&self) -> Result<()> {
            Ok(())
        }
    }

    fn transport(base_url: String, audit: Arc<RecordingAuditSink>) -> Arc<Transport> {
        let limiter = Arc::new(
            SlidingWindowLimiter::new(SlidingWindowConfig::default()).expect("limiter config"),
        );
        Arc::new(Transport::new(
            reqwest::Client::new(),
            base_url,
            limiter,
            Arc::new(StaticTokens),
            audit,
            CONNECTOR,
        ))
    }

    fn event_json(id: &str, merchant: &str) -> Value {
        json!({
            "id": id,
            "type": "PLACED",
            "orderId": format!("order-{id}"),
            "merchantId": merchant,
            "createdAt": "2026-08-26T12:00:00Z"
        })
    }

    #[test]
    fn dedup_registry_tracks_membership() {
        let dedup = EventDeduplicator::new(100);
        assert!(!dedup.contains("e1"));
        dedup.insert("e1".to_string());
        assert!(dedup.contains("e1"));
        dedup.insert("e1".to_string());
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn dedup_registry_evicts_oldest_at_capacity() {
        let dedup = EventDeduplicator::new(3);
        for id in ["a", "b", "c"] {
            dedup.insert(id.to_string());
        }
        dedup.insert("d".to_string());

        assert_eq!(dedup.len(), 3);
        assert!(!dedup.contains("a"));
        assert!(dedup.contains("b"));
        assert!(dedup.contains("d"));
    }

    #[tokio::test]
    async fn poll_filters_foreign_merchants_and_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(POLLING_PATH))
            .and(header("x-polling-merchants", "m-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [
                    event_json("e1", "m-1"),
                    event_json("e2", "m-other"),
                    event_json("e3", "m-1"),
                    {"garbage": true},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        dedup.insert("e3".to_string());
        let poller =
            EventPoller::new(transport(server.uri(), audit), dedup, "m-1".to_string());

        let events = poller.poll().await.expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e1");
        assert_eq!(events[0].event_type, "PLACED");
        assert_eq!(events[0].order_id.as_deref(), Some("order-e1"));
        assert!(!events[0].acknowledged);
    }

    #[tokio::test]
    async fn poll_handles_empty_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(POLLING_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let poller =
            EventPoller::new(transport(server.uri(), audit), dedup, "m-1".to_string());

        let events = poller.poll().await.expect("events");
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn acknowledge_empty_batch_sends_nothing() {
        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        // No mock server mounted: a request would fail loudly.
        let ack = Acknowledger::new(
            transport("http://127.0.0.1:9".to_string(), audit),
            dedup,
            Arc::new(RecordingAuditSink::new()),
            Duration::from_millis(1),
        );

        let mut events: Vec<Event> = Vec::new();
        ack.acknowledge(&mut events).await.expect("no-op");
    }

    #[tokio::test]
    async fn acknowledge_marks_events_and_registers_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ACK_PATH))
            .and(body_string_contains("eventIds"))
            .and(body_string_contains("e1"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let ack = Acknowledger::new(
            transport(server.uri(), audit.clone()),
            dedup.clone(),
            audit.clone(),
            Duration::from_millis(1),
        );

        let mut events =
            vec![map_event(&event_json("e1", "m-1")).expect("event")];
        ack.acknowledge(&mut events).await.expect("ack");

        assert!(events[0].acknowledged);
        assert!(dedup.contains("e1"));
        assert_eq!(audit.count("event_acknowledgment"), 1);
    }

    #[tokio::test]
    async fn acknowledge_retries_once_then_succeeds() {
        let server = MockServer::start().await;
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        Mock::given(method("POST"))
            .and(path(ACK_PATH))
            .respond_with(move |_req: &wiremock::Request| {
                if hits_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(202)
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let ack = Acknowledger::new(
            transport(server.uri(), audit.clone()),
            dedup.clone(),
            audit,
            Duration::from_millis(1),
        );

        let mut events = vec![map_event(&event_json("e1", "m-1")).expect("event")];
        ack.acknowledge(&mut events).await.expect("ack after retry");
        assert!(events[0].acknowledged);
        assert!(dedup.contains("e1"));
    }

    #[tokio::test]
    async fn acknowledge_failure_leaves_events_unmarked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ACK_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let ack = Acknowledger::new(
            transport(server.uri(), audit.clone()),
            dedup.clone(),
            audit,
            Duration::from_millis(1),
        );

        let mut events = vec![map_event(&event_json("e1", "m-1")).expect("event")];
        let result = ack.acknowledge(&mut events).await;
        assert!(matches!(result, Err(PratoError::Ack(_))));
        assert!(!events[0].acknowledged);
        assert!(!dedup.contains("e1"));
    }

    #[tokio::test]
    async fn registered_ids_are_never_resubmitted_across_batches() {
        let server = MockServer::start().await;
        // A second request carrying e1 would hit this mock again and
        // fail its expectation.
        Mock::given(method("POST"))
            .and(path(ACK_PATH))
            .and(body_string_contains("e1"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ACK_PATH))
            .and(body_string_contains("e2"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let ack = Acknowledger::new(
            transport(server.uri(), audit.clone()),
            dedup.clone(),
            audit,
            Duration::from_millis(1),
        );

        let mut first = vec![map_event(&event_json("e1", "m-1")).expect("event")];
        ack.acknowledge(&mut first).await.expect("ack");

        // A fresh instance of e1 arrives alongside a new event: only e2
        // goes out, but both end up marked.
        let mut second = vec![
            map_event(&event_json("e1", "m-1")).expect("event"),
            map_event(&event_json("e2", "m-1")).expect("event"),
        ];
        ack.acknowledge(&mut second).await.expect("ack");

        assert!(second.iter().all(|e| e.acknowledged));
        assert_eq!(dedup.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_ids_within_a_batch_are_submitted_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ACK_PATH))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let ack = Acknowledger::new(
            transport(server.uri(), audit.clone()),
            dedup.clone(),
            audit,
            Duration::from_millis(1),
        );

        let mut events = vec![
            map_event(&event_json("e1", "m-1")).expect("event"),
            map_event(&event_json("e1", "m-1")).expect("event"),
        ];
        ack.acknowledge(&mut events).await.expect("ack");
        assert!(events.iter().all(|e| e.acknowledged));
        assert_eq!(dedup.len(), 1);
    }

    #[tokio::test]
    async fn already_acknowledged_events_are_skipped() {
        let audit = Arc::new(RecordingAuditSink::new());
        let dedup = Arc::new(EventDeduplicator::new(100));
        let ack = Acknowledger::new(
            transport("http://127.0.0.1:9".to_string(), audit.clone()),
            dedup,
            audit,
            Duration::from_millis(1),
        );

        let mut event = map_event(&event_json("e1", "m-1")).expect("event");
        event.mark_acknowledged();
        let mut events = vec![event];
        // Whole batch already acknowledged: no request is attempted.
        ack.acknowledge(&mut events).await.expect("no-op");
    }
}
