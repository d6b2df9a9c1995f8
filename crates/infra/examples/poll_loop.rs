//! Minimal polling loop against the live partner API.
//!
//! Credentials come from the environment (`IFOOD_CLIENT_ID`,
//! `IFOOD_CLIENT_SECRET`, `IFOOD_MERCHANT_ID`, `IFOOD_WEBHOOK_SECRET`).
//!
//! ```sh
//! cargo run -p prato-infra --example poll_loop
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use prato_core::Connector;
use prato_infra::{EnvSecretsProvider, IfoodConfig, IfoodConnector, TracingAuditSink};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = IfoodConfig::from_env()?;
    let connector = IfoodConnector::connect(
        config,
        Arc::new(EnvSecretsProvider::default()),
        Arc::new(TracingAuditSink),
    )
    .await?;

    let status = connector.get_store_status().await?;
    info!(status = ?status.status, "store status");

    loop {
        let mut events = connector.poll_events().await?;
        if !events.is_empty() {
            let orders = connector.get_orders(&events).await?;
            for order in &orders {
                info!(order_id = %order.id, total = order.total, "new order");
            }
            connector.acknowledge_events(&mut events).await?;
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
}
