//! HTTP transport for partner APIs

pub mod client;
pub mod errors;

pub use client::{Transport, TokenSource};
pub use errors::{ApiError, ApiErrorCategory};
