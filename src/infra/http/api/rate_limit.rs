use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub(crate) const METRIC_RATE_LIMIT_REJECTED: &str = "libris_rate_limit_rejected_total";

/// Process-wide token bucket. Every request draws from the same bucket,
/// regardless of caller.
#[derive(Debug)]
pub struct TokenBucket {
    rate_per_sec: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Starts full, holding `burst` tokens and refilling at `rate_per_sec`.
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self::starting_at(rate_per_sec, burst, Instant::now())
    }

    fn starting_at(rate_per_sec: u32, burst: u32, now: Instant) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            rate_per_sec: f64::from(rate_per_sec),
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Refill for the time elapsed since the last check, then take one token
    /// if available. The lock is held only for this arithmetic.
    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.rate_per_sec).min(self.capacity);
        state.last_refill = now.max(state.last_refill);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whole seconds until at least one token is available again.
    pub fn retry_after_secs(&self) -> u64 {
        if self.rate_per_sec <= 0.0 {
            return 1;
        }
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let missing = (1.0 - state.tokens).max(0.0);
        Duration::from_secs_f64(missing / self.rate_per_sec)
            .as_secs_f64()
            .ceil()
            .max(1.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_burst_then_rejects() {
        let start = Instant::now();
        let bucket = TokenBucket::starting_at(100, 150, start);

        for _ in 0..150 {
            assert!(bucket.allow_at(start));
        }
        assert!(!bucket.allow_at(start));
    }

    #[test]
    fn refills_at_sustained_rate() {
        let start = Instant::now();
        let bucket = TokenBucket::starting_at(10, 5, start);
        for _ in 0..5 {
            assert!(bucket.allow_at(start));
        }
        assert!(!bucket.allow_at(start));

        // 10 tokens/s: 100ms buys exactly one request.
        let later = start + Duration::from_millis(100);
        assert!(bucket.allow_at(later));
        assert!(!bucket.allow_at(later));
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let start = Instant::now();
        let bucket = TokenBucket::starting_at(100, 3, start);
        let much_later = start + Duration::from_secs(60);

        for _ in 0..3 {
            assert!(bucket.allow_at(much_later));
        }
        assert!(!bucket.allow_at(much_later));
    }

    #[test]
    fn at_most_rate_requests_per_second_after_burst() {
        let start = Instant::now();
        let bucket = TokenBucket::starting_at(20, 1, start);
        assert!(bucket.allow_at(start));

        let mut admitted = 0;
        for ms in 1..=1000u64 {
            if bucket.allow_at(start + Duration::from_millis(ms)) {
                admitted += 1;
            }
        }
        assert!(admitted <= 20, "admitted {admitted}");
        assert!(admitted >= 19, "admitted {admitted}");
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let bucket = TokenBucket::new(100, 1);
        assert!(bucket.allow());
        assert_eq!(bucket.retry_after_secs(), 1);
    }
}
