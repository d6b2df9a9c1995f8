//! Connector port implementation for iFood

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use prato_core::{AuditSink, Connector, SecretsProvider};
use prato_domain::{
    CancellationReason, Event, Order, PratoError, Result, Revenue, RevenuePeriod, StoreStatus,
};
use serde_json::Value;

use super::client::IfoodClient;
use super::orders::parse_order;
use super::CONNECTOR;
use crate::config::IfoodConfig;

/// [`Connector`] adapter over [`IfoodClient`].
pub struct IfoodConnector {
    client: IfoodClient,
}

impl IfoodConnector {
    pub async fn connect(
        config: IfoodConfig,
        secrets: Arc<dyn SecretsProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        Ok(Self { client: IfoodClient::connect(config, secrets, audit).await? })
    }

    /// The underlying client, for partner-specific operations the port
    /// does not cover (picking, webhook verification).
    #[must_use]
    pub fn client(&self) -> &IfoodClient {
        &self.client
    }

    fn period_range(period: RevenuePeriod) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        let start = match period {
            RevenuePeriod::Today => end
                .with_hour(0)
                .and_then(|t| t.with_minute(0))
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(end),
            RevenuePeriod::Week => end - Duration::days(7),
            RevenuePeriod::Month => end - Duration::days(30),
        };
        (start, end)
    }
}

#[async_trait]
impl Connector for IfoodConnector {
    async fn poll_events(&self) -> Result<Vec<Event>> {
        self.client.poll_events().await
    }

    async fn acknowledge_events(&self, events: &mut [Event]) -> Result<()> {
        self.client.acknowledge_events(events).await
    }

    async fn get_store_status(&self) -> Result<StoreStatus> {
        self.client.get_store_status().await
    }

    async fn get_orders(&self, events: &[Event]) -> Result<Vec<Order>> {
        let mut order_ids: Vec<&str> =
            events.iter().filter_map(|e| e.order_id.as_deref()).collect();
        order_ids.sort_unstable();
        order_ids.dedup();

        let fetches = order_ids.into_iter().map(|order_id| async move {
            let raw = self.client.get_order(order_id).await?;
            parse_order(&raw)
        });
        futures::future::try_join_all(fetches).await
    }

    async fn confirm_order(&self, order_id: &str) -> Result<()> {
        self.client.confirm_order(order_id).await
    }

    async fn cancel_order(&self, order_id: &str, reason_code: &str) -> Result<()> {
        self.client.cancel_order(order_id, reason_code).await
    }

    async fn get_revenue(&self, period: RevenuePeriod) -> Result<Revenue> {
        let (start, end) = Self::period_range(period);
        let sales = self.client.sales(start, end).await?;
        let average_ticket = if sales.total_orders > 0 {
            sales.total_revenue / sales.total_orders as f64
        } else {
            0.0
        };
        Ok(Revenue {
            period,
            total_revenue: sales.total_revenue,
            total_orders: sales.total_orders,
            average_ticket,
            top_items: sales.top_items,
            connector: CONNECTOR.to_string(),
            generated_at: Utc::now(),
        })
    }

    async fn cancellation_reasons(&self) -> Result<Vec<CancellationReason>> {
        self.client.cancellation_reasons().await
    }

    async fn update_inventory(&self, items: &[Value]) -> Result<()> {
        for item in items {
            if !item.is_object() {
                return Err(PratoError::InvalidInput(
                    "inventory items must be objects".to_string(),
                ));
            }
        }
        self.client.update_inventory(items).await
    }

    async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}
