use rand::Rng;
use std::time::Duration;

/// Delay schedule for rate-limited (HTTP 429) retries.
///
/// The delay doubles each attempt from `base_ms` and never exceeds
/// `max_ms`, jitter included. Jitter spreads otherwise synchronized
/// retries apart.
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
    jitter_percent: u64,
}

impl ExponentialBackoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            jitter_percent: 10,
        }
    }

    /// Jitter spread as a percentage of the capped delay; 0 disables it
    pub fn with_jitter(mut self, jitter_percent: u64) -> Self {
        self.jitter_percent = jitter_percent;
        self
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        let mut delay_ms = doubled.min(self.max_ms);

        if self.jitter_percent > 0 {
            let spread = delay_ms * self.jitter_percent / 100;
            delay_ms += rand::thread_rng().gen_range(0..=spread);
        }

        // The cap is a hard ceiling, jitter included
        Duration::from_millis(delay_ms.min(self.max_ms))
    }
}
