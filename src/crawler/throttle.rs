//! Fixed-delay request throttling
//!
//! No jitter and no backoff: every `wait` sleeps for the same configured
//! duration.

use std::time::Duration;

/// Enforces a fixed pause between consecutive requests
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleeps for the configured delay
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        tokio::time::sleep(self.delay).await;
    }
}
