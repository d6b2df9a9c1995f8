//! Sliding-window rate limiter for partner API quotas
//!
//! The partner enforces a per-minute request quota; exceeding it returns
//! 429 responses that count against merchant standing. This limiter keeps
//! an exact timestamp window so the client never sends a request the
//! quota would reject.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::time::{Clock, SystemClock};

/// Configuration for the sliding-window limiter
#[derive(Debug, Clone)]
pub struct SlidingWindowConfig {
    /// Maximum number of requests inside one window
    pub max_requests: usize,
    /// Window length
    pub window: Duration,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self { max_requests: 60, window: Duration::from_secs(60) }
    }
}

impl SlidingWindowConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("window must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Sliding-window rate limiter
///
/// Tracks the timestamp of every request inside the current window.
/// Unlike a token bucket it never over-admits after idle periods: at
/// most `max_requests` timestamps can fall inside any window of the
/// configured length.
pub struct SlidingWindowLimiter<C: Clock = SystemClock> {
    config: SlidingWindowConfig,
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    clock: Arc<C>,
}

impl<C: Clock> SlidingWindowLimiter<C> {
    /// Create a limiter with a custom clock.
    pub fn with_clock(config: SlidingWindowConfig, clock: C) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            timestamps: Arc::new(Mutex::new(VecDeque::with_capacity(config.max_requests))),
            clock: Arc::new(clock),
            config,
        })
    }

    /// Reserve a slot in the window.
    ///
    /// Returns `Duration::ZERO` when the request may proceed now, in
    /// which case the slot is already recorded. Otherwise returns how
    /// long the caller must wait before trying again; nothing is
    /// recorded in that case.
    pub fn reserve(&self) -> Duration {
        let now = self.clock.now();

        let mut window = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("rate limiter window lock poisoned");
                poisoned.into_inner()
            }
        };

        // Drop timestamps that have slid out of the window
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.config.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.config.max_requests {
            window.push_back(now);
            return Duration::ZERO;
        }

        // Window is full. Wait until the oldest entry slides out.
        let wait = match window.front() {
            Some(oldest) => self.config.window.saturating_sub(now.duration_since(*oldest)),
            None => Duration::ZERO,
        };
        debug!(wait_ms = wait.as_millis() as u64, "rate limit window full");
        wait
    }

    /// Acquire a slot, sleeping as long as the window requires.
    pub async fn acquire(&self) {
        loop {
            let wait = self.reserve();
            if wait.is_zero() {
                return;
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of requests currently inside the window.
    pub fn in_flight(&self) -> usize {
        let now = self.clock.now();
        let mut window = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.config.window {
                window.pop_front();
            } else {
                break;
            }
        }
        window.len()
    }
}

impl SlidingWindowLimiter<SystemClock> {
    /// Create a limiter with the system clock.
    pub fn new(config: SlidingWindowConfig) -> Result<Self, String> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Clone for SlidingWindowLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            timestamps: Arc::clone(&self.timestamps),
            clock: Arc::clone(&self.clock),
        }
    }
}
