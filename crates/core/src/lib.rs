//! # Prato Core
//!
//! Port interfaces between the connector implementations and the rest of
//! the platform.
//!
//! ## Architecture Principles
//! - Only depends on `prato-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod audit;
pub mod connector_ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use audit::{AuditEvent, AuditOutcome, AuditSink};
pub use connector_ports::{Connector, SecretsProvider};
