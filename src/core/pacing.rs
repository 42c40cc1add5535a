use crate::domain::model::PacingPolicy;
use crate::domain::ports::Pacer;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// 令牌桶速率的允許範圍 (每秒請求數)
pub const MIN_RATE_PER_SECOND: f64 = 0.001;
pub const MAX_RATE_PER_SECOND: f64 = 1_000_000.0;

impl PacingPolicy {
    pub fn build(&self) -> Box<dyn Pacer> {
        match self {
            PacingPolicy::FixedInterval { every, delay } => {
                Box::new(FixedIntervalPacer::new(*every, *delay))
            }
            PacingPolicy::TokenBucket {
                rate_per_second,
                burst,
            } => Box::new(TokenBucketPacer::new(*rate_per_second, *burst)),
        }
    }
}

/// 每 `every` 筆請求前暫停固定時間，不看伺服器的限流回應
#[derive(Debug, Clone)]
pub struct FixedIntervalPacer {
    every: usize,
    delay: Duration,
    pauses: usize,
}

impl FixedIntervalPacer {
    pub fn new(every: usize, delay: Duration) -> Self {
        Self {
            every,
            delay,
            pauses: 0,
        }
    }

    pub fn should_pause(&self, index: usize) -> bool {
        self.every > 0 && index > 0 && index % self.every == 0
    }

    pub fn pauses(&self) -> usize {
        self.pauses
    }
}

#[async_trait]
impl Pacer for FixedIntervalPacer {
    async fn pace(&mut self, index: usize) {
        if self.should_pause(index) {
            tracing::debug!("⏸️ Pacing: sleeping {:?} before record {}", self.delay, index + 1);
            tokio::time::sleep(self.delay).await;
            self.pauses += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenBucketPacer {
    capacity: f64,
    tokens: f64,
    refill_per_second: f64,
    last_refill: Instant,
    waits: usize,
}

impl TokenBucketPacer {
    /// 一開始桶子是滿的；`burst` 至少為 1，速率限制在允許範圍內 (NaN 視為最小值)
    pub fn new(rate_per_second: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            capacity,
            tokens: capacity,
            refill_per_second: rate_per_second
                .max(MIN_RATE_PER_SECOND)
                .min(MAX_RATE_PER_SECOND),
            last_refill: Instant::now(),
            waits: 0,
        }
    }

    pub fn waits(&self) -> usize {
        self.waits
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }
}

#[async_trait]
impl Pacer for TokenBucketPacer {
    async fn pace(&mut self, index: usize) {
        self.refill();
        if self.tokens < 1.0 {
            let seconds = (1.0 - self.tokens) / self.refill_per_second;
            match Duration::try_from_secs_f64(seconds) {
                Ok(wait) => {
                    tracing::debug!(
                        "⏸️ Token bucket empty: waiting {:?} before record {}",
                        wait,
                        index + 1
                    );
                    tokio::time::sleep(wait).await;
                    self.refill();
                    self.waits += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Invalid token bucket wait of {}s, not pausing: {}",
                        seconds,
                        e
                    );
                }
            }
        }
        self.tokens = (self.tokens - 1.0).max(0.0);
    }
}
