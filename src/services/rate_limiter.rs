//! Throttling for marketplace calls within a sync run.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Blocks until the caller is permitted to make the next external call.
    async fn acquire(&self);
}

/// Enforces a fixed minimum gap between consecutive permits.
///
/// The mutex is held across the sleep, so workers sharing one limiter leave
/// the full gap between any two marketplace calls regardless of pool width.
pub struct FixedDelayLimiter {
    min_gap: Duration,
    last_permit: Mutex<Option<Instant>>,
}

impl FixedDelayLimiter {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_permit: Mutex::new(None),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

#[async_trait]
impl RateLimiter for FixedDelayLimiter {
    async fn acquire(&self) {
        if self.min_gap.is_zero() {
            return;
        }

        let mut last_permit = self.last_permit.lock().await;
        if let Some(prev) = *last_permit {
            let elapsed = prev.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap - elapsed).await;
            }
        }
        *last_permit = Some(Instant::now());
    }
}
