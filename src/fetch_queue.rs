//! Concurrency-limited, retrying scheduler for outbound fetches.
//!
//! Every stage that reaches the network goes through one shared
//! [`FetchQueue`] instance, so the concurrency cap and pacing apply across
//! the whole scan rather than per call site. The queue owns all of its
//! counters; there is no module-level state.

use crate::backoff::ExponentialBackoff;
use crate::config::Config;
use crate::network::FetchError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, warn};

/// Tuning knobs for a fetch queue
#[derive(Debug, Clone)]
pub struct FetchQueueConfig {
    /// Maximum operations in flight at once, across all callers
    pub max_concurrent: usize,
    /// Minimum gap between successive admissions; also the fixed delay
    /// between non-429 retry attempts
    pub min_spacing: Duration,
    /// Total attempts per submission (1 initial + N-1 retries)
    pub max_retries: u32,
    /// Base delay of the 429 backoff regime
    pub rate_limit_base: Duration,
    /// Cap of the 429 backoff regime
    pub rate_limit_max: Duration,
}

impl Default for FetchQueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: Config::MAX_CONCURRENT_FETCHES,
            min_spacing: Duration::from_millis(Config::MIN_REQUEST_SPACING_MS),
            max_retries: Config::MAX_RETRIES,
            rate_limit_base: Duration::from_millis(Config::RATE_LIMIT_BASE_DELAY_MS),
            rate_limit_max: Duration::from_millis(Config::RATE_LIMIT_MAX_DELAY_MS),
        }
    }
}

/// Bounded fetch queue with same-key serialization and two retry regimes.
///
/// A submission holds one concurrency slot for its whole lifetime,
/// including retries - a retrying request never frees capacity for a burst
/// of new ones.
pub struct FetchQueue {
    semaphore: Semaphore,
    in_flight: Mutex<HashSet<String>>,
    next_admission: Mutex<Option<Instant>>,
    active: AtomicUsize,
    config: FetchQueueConfig,
}

impl FetchQueue {
    pub fn new() -> Self {
        Self::with_config(FetchQueueConfig::default())
    }

    pub fn with_config(config: FetchQueueConfig) -> Self {
        Self {
            semaphore: Semaphore::new(config.max_concurrent.max(1)),
            in_flight: Mutex::new(HashSet::new()),
            next_admission: Mutex::new(None),
            active: AtomicUsize::new(0),
            config,
        }
    }

    /// Number of operations currently executing
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Run `op` under the queue's concurrency, pacing and retry policy.
    ///
    /// `key` is the normalized URL being fetched. While an operation for a
    /// key is in flight, later submissions for the same key wait for it to
    /// finish before running their own - no speculative duplicate fetch.
    ///
    /// Successive admissions are spaced at least `min_spacing` apart, even
    /// when submitted simultaneously from an idle queue.
    ///
    /// On failure the operation is retried up to the configured attempt
    /// count: HTTP 429 backs off exponentially, other transient failures
    /// wait the fixed spacing delay, permanent failures return immediately.
    /// After exhausting retries the last error is propagated.
    pub async fn submit<T, F, Fut>(&self, key: &str, op: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        // Same-key serialization: wait until no operation for this key is
        // in flight, then claim it.
        loop {
            if self.in_flight.lock().insert(key.to_string()) {
                break;
            }
            debug!(key, "waiting for in-flight fetch of same key");
            sleep(Duration::from_millis(Config::IN_FLIGHT_POLL_MS)).await;
        }
        let _key_guard = KeyGuard {
            set: &self.in_flight,
            key: key.to_string(),
        };

        // One slot per submission, held across retries. The semaphore is
        // never closed.
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("fetch queue semaphore closed");

        // Each admission claims a slot and pushes the next one out by the
        // spacing interval, so waiters from idle cannot burst up to the
        // cap or wake together.
        let slot = {
            let mut next = self.next_admission.lock();
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.config.min_spacing);
            slot
        };
        sleep_until(slot).await;

        self.active.fetch_add(1, Ordering::SeqCst);
        let _active_guard = ActiveGuard(&self.active);

        let backoff =
            ExponentialBackoff::new(
                self.config.rate_limit_base.as_millis() as u64,
                self.config.rate_limit_max.as_millis() as u64,
            );
        let mut rate_limited_attempts: u32 = 0;
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(key, attempt, error = %e, "fetch attempt failed");

                    if !e.is_retryable() || attempt + 1 >= self.config.max_retries {
                        return Err(e);
                    }

                    match e {
                        FetchError::RateLimited => {
                            let delay = backoff.delay(rate_limited_attempts);
                            rate_limited_attempts += 1;
                            debug!(key, delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                            sleep(delay).await;
                        }
                        _ => sleep(self.config.min_spacing).await,
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Network("max retries exceeded".to_string())))
    }
}

impl Default for FetchQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the in-flight key when the submission finishes or is cancelled
struct KeyGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
