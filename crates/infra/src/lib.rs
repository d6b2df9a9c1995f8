//! # Prato Infra
//!
//! Infrastructure layer: HTTP transport, configuration, audit sinks and
//! the marketplace connector implementations.

pub mod audit;
pub mod config;
pub mod http;
pub mod integrations;

pub use audit::{NoopAuditSink, TracingAuditSink};
pub use config::{EnvSecretsProvider, IfoodConfig};
pub use integrations::ifood::{IfoodClient, IfoodConnector};
