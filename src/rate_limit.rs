/// Fixed-window rate limiting for form submissions.
///
/// Keyed by client identifier (forwarded IP). One shared table for the whole
/// process, owned by a [`RateLimiter`] that is created at startup and
/// injected through `AppState`. `DashMap`'s entry API serializes concurrent
/// updates to the same key, so counts never skip under parallel requests.
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Window state for one client key.
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the window resets, rounded up, for the `Retry-After`
    /// response header.
    pub fn retry_after_secs(&self) -> i64 {
        let millis = (self.reset_at - Utc::now()).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis as f64 / 1000.0).ceil() as i64
        }
    }
}

pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Limiter for the contact form: 5 requests per 15 minutes per client.
    pub fn for_submissions() -> Self {
        Self::new(Duration::minutes(15), 5)
    }

    /// Counts a request against `key` and decides whether it is allowed.
    ///
    /// A fresh or expired window resets the count to 1; otherwise the count
    /// increments until the cap, after which calls are rejected until
    /// `reset_at` passes. Expired entries behave as fresh on access, so the
    /// periodic sweep is purely a memory bound, not a correctness need.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Utc::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_at: now + self.window,
            });

        if now > entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return RateLimitDecision {
                allowed: true,
                reset_at: entry.reset_at,
            };
        }

        if entry.count >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                reset_at: entry.reset_at,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            reset_at: entry.reset_at,
        }
    }

    /// Drops entries whose window has passed. Returns how many were purged.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at > now);
        before - self.entries.len()
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_exactly_max_requests_per_window() {
        let limiter = RateLimiter::for_submissions();

        for i in 0..5 {
            let decision = limiter.check("1.2.3.4");
            assert!(decision.allowed, "request {} should be allowed", i + 1);
        }

        let decision = limiter.check("1.2.3.4");
        assert!(!decision.allowed);
        assert!(decision.retry_after_secs() > 0);
        assert!(decision.retry_after_secs() <= 15 * 60);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::for_submissions();

        for _ in 0..5 {
            assert!(limiter.check("1.2.3.4").allowed);
        }
        assert!(!limiter.check("1.2.3.4").allowed);
        assert!(limiter.check("5.6.7.8").allowed);
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let limiter = RateLimiter::new(Duration::milliseconds(30), 2);

        assert!(limiter.check("client").allowed);
        assert!(limiter.check("client").allowed);
        assert!(!limiter.check("client").allowed);

        std::thread::sleep(std::time::Duration::from_millis(50));

        // Expired window behaves like a fresh one
        assert!(limiter.check("client").allowed);
        assert!(limiter.check("client").allowed);
        assert!(!limiter.check("client").allowed);
    }

    #[test]
    fn test_sweep_purges_only_expired_entries() {
        let limiter = RateLimiter::new(Duration::milliseconds(30), 5);
        limiter.check("stale");

        std::thread::sleep(std::time::Duration::from_millis(50));
        limiter.check("fresh");

        assert_eq!(limiter.entry_count(), 2);
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.entry_count(), 1);
        assert_eq!(limiter.sweep(), 0);
    }

    #[test]
    fn test_concurrent_checks_never_overcount() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::for_submissions());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                let mut allowed = 0;
                for _ in 0..10 {
                    if limiter.check("shared").allowed {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 5);
    }
}
