use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// A rate that cannot drive a limiter (zero, negative, NaN or infinite).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Rate limit must be a positive number of requests per second, got {0}")]
pub struct InvalidRate(pub f64);

/// Token bucket shared by every outbound request.
///
/// The bucket holds `max(1, floor(rate))` tokens and starts full, so a
/// cold start may burst one second's worth of calls. A consumed token comes
/// back once its window has elapsed (one second, or `1 / rate` seconds for
/// rates below one), which bounds every sliding window to the configured
/// rate rather than to burst plus refill.
///
/// Above one request per second the fractional part is not used: 2.5
/// grants two calls per second. Rates too small for the window to fit in
/// a [`Duration`] are rejected.
///
/// Cloning is cheap and yields a handle to the same bucket. Waiters queue
/// on a fair mutex and are served in arrival order.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    rate: f64,
    capacity: usize,
    window: Duration,
    /// Grant instants of the tokens currently out of the bucket, oldest first.
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(rate: f64) -> Result<Self, InvalidRate> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(InvalidRate(rate));
        }

        let capacity = (rate.floor() as usize).max(1);
        // Rates so small that one token outlives `Duration` are unusable
        let window = Duration::try_from_secs_f64(capacity as f64 / rate)
            .map_err(|_| InvalidRate(rate))?
            .max(Duration::from_secs(1));

        Ok(Self {
            inner: Arc::new(Bucket {
                rate,
                capacity,
                window,
                granted: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            }),
        })
    }

    /// Configured requests per second.
    pub fn rate(&self) -> f64 {
        self.inner.rate
    }

    /// Maximum number of grants inside one window.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Waits for a token and consumes it.
    pub async fn acquire(&self) {
        let bucket = &*self.inner;
        // Held across the sleep so later callers queue behind this one.
        let mut granted = bucket.granted.lock().await;

        loop {
            let now = Instant::now();
            while granted
                .front()
                .is_some_and(|at| now.duration_since(*at) >= bucket.window)
            {
                granted.pop_front();
            }

            if granted.len() < bucket.capacity {
                granted.push_back(now);
                return;
            }

            let Some(&oldest) = granted.front() else {
                continue;
            };
            let ready_at = oldest + bucket.window;
            tracing::trace!(
                wait_ms = ready_at.saturating_duration_since(now).as_millis() as u64,
                capacity = bucket.capacity,
                "Rate limiter saturated, waiting for a token"
            );
            tokio::time::sleep_until(ready_at).await;
        }
    }

    /// Tokens that could be granted right now without waiting.
    pub async fn available(&self) -> usize {
        let bucket = &*self.inner;
        let granted = bucket.granted.lock().await;
        let now = Instant::now();
        let in_flight = granted
            .iter()
            .filter(|at| now.duration_since(**at) < bucket.window)
            .count();
        bucket.capacity.saturating_sub(in_flight)
    }
}
