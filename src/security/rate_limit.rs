//! Sliding-window attempt limiting.
//!
//! Attempts are recorded as unix-second timestamps in the session under one
//! key per (action, client). Filtering on every check is what expires old
//! attempts; the janitor only reclaims memory.
//!
//! Callers must hold the session lock across the whole call: the
//! read-filter-append sequence is only atomic because the session is.

use std::sync::Arc;

use crate::config::RateLimitPolicy;
use crate::security::clock::{Clock, SystemClock};
use crate::session::{SessionScope, SessionValue};

/// Session keys owned by the limiter start with this prefix.
pub const RATE_LIMIT_PREFIX: &str = "rate_limit_";

/// Identifies one attempt counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub action: String,
    pub client: String,
}

impl RateLimitKey {
    pub fn new(action: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            client: client.into(),
        }
    }

    pub fn session_key(&self) -> String {
        format!("{}{}_{}", RATE_LIMIT_PREFIX, self.action, self.client)
    }
}

/// Admit/deny decisions against per-session attempt lists.
#[derive(Clone)]
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Record an attempt if the window still has room.
    ///
    /// - `limit == 0` never admits.
    /// - `window_secs == 0` always admits. Config validation rejects it at
    ///   startup, so reaching this branch means a hand-built policy.
    pub fn check_and_record<S: SessionScope + ?Sized>(
        &self,
        session: &mut S,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
    ) -> bool {
        if policy.limit == 0 {
            return false;
        }
        if policy.window_secs == 0 {
            tracing::warn!(action = %key.action, "Rate limit window is zero; admitting");
            return true;
        }

        let now = self.clock.now_secs();
        let slot = key.session_key();
        let mut attempts = in_window(session.get(&slot), now, policy.window_secs);

        if attempts.len() >= policy.limit as usize {
            session.set(&slot, SessionValue::Timestamps(attempts));
            return false;
        }

        attempts.push(now);
        session.set(&slot, SessionValue::Timestamps(attempts));
        true
    }

    /// Seconds until the oldest counted attempt leaves the window, if the
    /// key is currently saturated.
    pub fn retry_after<S: SessionScope + ?Sized>(
        &self,
        session: &S,
        key: &RateLimitKey,
        policy: &RateLimitPolicy,
    ) -> Option<u64> {
        if policy.limit == 0 || policy.window_secs == 0 {
            return None;
        }
        let now = self.clock.now_secs();
        let attempts = in_window(session.get(&key.session_key()), now, policy.window_secs);
        if attempts.len() < policy.limit as usize {
            return None;
        }
        let oldest = attempts.iter().min().copied()?;
        Some((oldest + policy.window_secs).saturating_sub(now).max(1))
    }
}

fn in_window(value: Option<&SessionValue>, now: u64, window_secs: u64) -> Vec<u64> {
    value
        .and_then(SessionValue::as_timestamps)
        .map(|ts| {
            ts.iter()
                .copied()
                .filter(|&t| now.saturating_sub(t) < window_secs)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::clock::ManualClock;
    use crate::session::SessionData;
    use std::sync::Mutex;
    use std::thread;

    fn login_policy() -> RateLimitPolicy {
        RateLimitPolicy {
            limit: 5,
            window_secs: 300,
        }
    }

    #[test]
    fn test_sliding_window() {
        let clock = ManualClock::new(10_000);
        let limiter = RateLimiter::new(Arc::new(clock.clone()));
        let key = RateLimitKey::new("login", "203.0.113.7");
        let mut session = SessionData::new();

        for _ in 0..5 {
            assert!(limiter.check_and_record(&mut session, &key, &login_policy()));
            clock.advance(10);
        }
        assert!(!limiter.check_and_record(&mut session, &key, &login_policy()));

        // 300s after the first attempt it no longer counts
        clock.set(10_300);
        assert!(limiter.check_and_record(&mut session, &key, &login_policy()));
    }

    #[test]
    fn test_denied_attempt_is_not_recorded() {
        let clock = ManualClock::new(0);
        let limiter = RateLimiter::new(Arc::new(clock.clone()));
        let key = RateLimitKey::new("login", "ip");
        let mut session = SessionData::new();
        let policy = RateLimitPolicy { limit: 2, window_secs: 60 };

        assert!(limiter.check_and_record(&mut session, &key, &policy));
        assert!(limiter.check_and_record(&mut session, &key, &policy));
        for _ in 0..10 {
            assert!(!limiter.check_and_record(&mut session, &key, &policy));
        }
        let stored = session.get(&key.session_key()).unwrap().as_timestamps().unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(Arc::new(ManualClock::new(0)));
        let mut session = SessionData::new();
        let policy = RateLimitPolicy { limit: 1, window_secs: 60 };

        assert!(limiter.check_and_record(&mut session, &RateLimitKey::new("login", "a"), &policy));
        assert!(limiter.check_and_record(&mut session, &RateLimitKey::new("login", "b"), &policy));
        assert!(limiter.check_and_record(&mut session, &RateLimitKey::new("logout", "a"), &policy));
        assert!(!limiter.check_and_record(&mut session, &RateLimitKey::new("login", "a"), &policy));
    }

    #[test]
    fn test_zero_limit_denies_and_zero_window_admits() {
        let limiter = RateLimiter::new(Arc::new(ManualClock::new(0)));
        let key = RateLimitKey::new("login", "ip");
        let mut session = SessionData::new();

        let closed = RateLimitPolicy { limit: 0, window_secs: 300 };
        assert!(!limiter.check_and_record(&mut session, &key, &closed));

        let open = RateLimitPolicy { limit: 1, window_secs: 0 };
        for _ in 0..5 {
            assert!(limiter.check_and_record(&mut session, &key, &open));
        }
    }

    #[test]
    fn test_corrupt_slot_counts_as_empty() {
        let limiter = RateLimiter::new(Arc::new(ManualClock::new(0)));
        let key = RateLimitKey::new("login", "ip");
        let mut session = SessionData::new();
        session.set(&key.session_key(), SessionValue::Text("garbage".into()));
        assert!(limiter.check_and_record(&mut session, &key, &login_policy()));
    }

    #[test]
    fn test_retry_after() {
        let clock = ManualClock::new(1_000);
        let limiter = RateLimiter::new(Arc::new(clock.clone()));
        let key = RateLimitKey::new("login", "ip");
        let mut session = SessionData::new();
        let policy = RateLimitPolicy { limit: 1, window_secs: 300 };

        assert_eq!(limiter.retry_after(&session, &key, &policy), None);
        assert!(limiter.check_and_record(&mut session, &key, &policy));
        clock.advance(100);
        assert_eq!(limiter.retry_after(&session, &key, &policy), Some(200));
    }

    #[test]
    fn test_concurrent_attempts_admit_exactly_limit() {
        let limiter = RateLimiter::new(Arc::new(ManualClock::new(5_000)));
        let session = Arc::new(Mutex::new(SessionData::new()));
        let key = RateLimitKey::new("login", "198.51.100.1");
        let policy = login_policy();

        let handles: Vec<_> = (0..(policy.limit + 20))
            .map(|_| {
                let limiter = limiter.clone();
                let session = session.clone();
                let key = key.clone();
                let policy = policy.clone();
                thread::spawn(move || {
                    let mut guard = session.lock().unwrap();
                    limiter.check_and_record(&mut *guard, &key, &policy)
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, policy.limit as usize);
    }
}
