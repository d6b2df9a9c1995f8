//! iFood marketplace integration
//!
//! Layout mirrors the partner API surface: [`auth`] owns the OAuth2
//! token lifecycle, [`events`] polling and acknowledgment, [`orders`]
//! payload parsing, [`cache`] merchant status caching and [`webhook`]
//! delivery signatures. [`client`] wires them together and
//! [`connector`] adapts the result to the [`prato_core::Connector`]
//! port.

pub mod auth;
pub mod cache;
pub mod client;
pub mod connector;
pub mod events;
pub mod orders;
pub mod types;
pub mod webhook;

pub use client::IfoodClient;
pub use connector::IfoodConnector;

/// Connector name stamped on events, orders and audit records.
pub(crate) const CONNECTOR: &str = "ifood";
