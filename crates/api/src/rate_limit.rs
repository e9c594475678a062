use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request log per client key.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    inner: Arc<Mutex<Buckets>>,
    window: Duration,
    max_requests: usize,
}

#[derive(Debug)]
struct Buckets {
    queues: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Buckets {
                queues: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            window,
            max_requests,
        }
    }

    /// Records a request for `key`, or returns how long until the oldest request in the
    /// window expires.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut guard = self.inner.lock();
        let buckets = &mut *guard;

        // Keys that went quiet for a whole window are dropped once per window.
        if now.saturating_duration_since(buckets.last_sweep) >= self.window {
            let window = self.window;
            buckets.queues.retain(|_, queue| {
                queue
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
            buckets.last_sweep = now;
        }

        let queue = buckets.queues.entry(key.to_string()).or_default();
        while let Some(front) = queue.front() {
            if now.saturating_duration_since(*front) >= self.window {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.max_requests {
            let retry_after = queue
                .front()
                .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(self.window);
            if queue.is_empty() {
                buckets.queues.remove(key);
            }
            return Err(retry_after);
        }

        queue.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked_keys(limiter: &IpRateLimiter) -> usize {
        limiter.inner.lock().queues.len()
    }

    #[test]
    fn blocks_after_max_requests_per_key() {
        let limiter = IpRateLimiter::new(Duration::from_secs(60), 2);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn window_expiry_frees_capacity() {
        let limiter = IpRateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();
        assert!(limiter.check_at("ip", start).is_ok());

        let retry = limiter
            .check_at("ip", start + Duration::from_secs(4))
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(6));

        assert!(limiter.check_at("ip", start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn quiet_keys_are_evicted() {
        let limiter = IpRateLimiter::new(Duration::from_secs(10), 5);
        let start = Instant::now();
        for n in 0..100 {
            assert!(limiter.check_at(&format!("198.51.100.{n}"), start).is_ok());
        }
        assert_eq!(tracked_keys(&limiter), 100);

        assert!(limiter
            .check_at("203.0.113.9", start + Duration::from_secs(11))
            .is_ok());
        assert_eq!(tracked_keys(&limiter), 1);
    }

    #[test]
    fn zero_capacity_always_blocks() {
        let limiter = IpRateLimiter::new(Duration::from_secs(5), 0);
        assert_eq!(limiter.check("ip"), Err(Duration::from_secs(5)));
        assert_eq!(tracked_keys(&limiter), 0);
    }
}
