//! Shared infrastructure for the Prato connectors
//!
//! Provides the time abstraction used for deterministic tests and the
//! resilience primitives (rate limiting) the HTTP layer builds on.

pub mod resilience;
pub mod time;

pub use resilience::{SlidingWindowConfig, SlidingWindowLimiter};
pub use time::{Clock, MockClock, SystemClock};
