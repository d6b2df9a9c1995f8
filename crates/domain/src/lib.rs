//! # Prato Domain
//!
//! Business domain types and models for the Prato marketplace connector.
//!
//! This crate contains:
//! - Normalized order/event/merchant data types
//! - Domain error types and Result definitions
//! - Domain constants (SLA budgets, partner endpoints, limits)
//!
//! ## Architecture
//! - No dependencies on other Prato crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{PratoError, Result};
pub use types::event::Event;
pub use types::merchant::{
    CancellationReason, Revenue, RevenuePeriod, StoreState, StoreStatus, TopItem,
};
pub use types::order::{
    Address, Coupon, Customer, Order, OrderItem, OrderMetadata, OrderTiming, OrderType, Payment,
    PaymentMethod,
};
pub use types::token::{AccessToken, Credentials};
