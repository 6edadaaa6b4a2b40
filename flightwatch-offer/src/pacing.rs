use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Gate every upstream call passes through before it is sent. One instance is
/// shared by every search in the process.
#[async_trait]
pub trait CallPacer: Send + Sync {
    async fn acquire(&self);
}

/// Token bucket with a burst of one: at most one call per `min_interval`.
pub struct TokenBucketPacer {
    limiter: DefaultDirectRateLimiter,
    min_interval: Duration,
}

impl TokenBucketPacer {
    /// Returns `None` for a zero interval, which governor cannot express.
    pub fn new(min_interval: Duration) -> Option<Self> {
        let quota = Quota::with_period(min_interval)?;
        Some(Self {
            limiter: RateLimiter::direct(quota),
            min_interval,
        })
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl CallPacer for TokenBucketPacer {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

/// No pacing at all. For stubs and tests.
pub struct Unpaced;

#[async_trait]
impl CallPacer for Unpaced {
    async fn acquire(&self) {}
}
