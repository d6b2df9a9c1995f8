//! Resilience primitives for outbound API traffic

pub mod rate_limiter;

pub use rate_limiter::{SlidingWindowConfig, SlidingWindowLimiter};
