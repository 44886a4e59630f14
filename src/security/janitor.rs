//! Session housekeeping for rate-limit state.
//!
//! Runs on every session access. It removes timestamps older than the
//! housekeeping horizon and drops attempt lists that end up empty, so an idle
//! session does not keep one entry per (action, client) it ever saw.

use std::sync::Arc;

use crate::security::clock::{Clock, SystemClock};
use crate::security::rate_limit::RATE_LIMIT_PREFIX;
use crate::session::{SessionScope, SessionValue};

#[derive(Clone)]
pub struct SessionJanitor {
    clock: Arc<dyn Clock>,
}

impl Default for SessionJanitor {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl SessionJanitor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Drop rate-limit timestamps at least `max_age_secs` old.
    ///
    /// Returns how many timestamps were removed. Keys outside the rate-limit
    /// namespace are left alone.
    pub fn prune<S: SessionScope + ?Sized>(&self, session: &mut S, max_age_secs: u64) -> usize {
        let now = self.clock.now_secs();
        let mut removed = 0;

        for key in session.keys() {
            if !key.starts_with(RATE_LIMIT_PREFIX) {
                continue;
            }
            let Some(timestamps) = session.get(&key).and_then(SessionValue::as_timestamps) else {
                continue;
            };

            let before = timestamps.len();
            let kept: Vec<u64> = timestamps
                .iter()
                .copied()
                .filter(|&t| now.saturating_sub(t) < max_age_secs)
                .collect();
            removed += before - kept.len();

            if kept.is_empty() {
                session.remove(&key);
            } else if kept.len() != before {
                session.set(&key, SessionValue::Timestamps(kept));
            }
        }

        if removed > 0 {
            tracing::trace!(removed, "Pruned stale rate-limit entries");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitPolicy;
    use crate::security::clock::ManualClock;
    use crate::security::rate_limit::{RateLimitKey, RateLimiter};
    use crate::session::SessionData;

    #[test]
    fn test_prune_removes_old_and_empty_lists() {
        let clock = ManualClock::new(10_000);
        let janitor = SessionJanitor::new(Arc::new(clock));
        let mut session = SessionData::new();
        session.set("rate_limit_login_a", SessionValue::Timestamps(vec![1_000, 9_990]));
        session.set("rate_limit_login_b", SessionValue::Timestamps(vec![10, 20]));
        session.set("csrf_token", SessionValue::Text("keep".into()));

        assert_eq!(janitor.prune(&mut session, 3_600), 3);
        assert_eq!(
            session.get("rate_limit_login_a").unwrap().as_timestamps(),
            Some(&[9_990u64][..])
        );
        assert!(session.get("rate_limit_login_b").is_none());
        assert_eq!(session.text("csrf_token"), Some("keep"));
    }

    #[test]
    fn test_prune_on_empty_session() {
        let janitor = SessionJanitor::default();
        let mut session = SessionData::new();
        assert_eq!(janitor.prune(&mut session, 3_600), 0);
        assert!(session.is_empty());
    }

    #[test]
    fn test_prune_leaves_foreign_values_under_prefix() {
        let janitor = SessionJanitor::new(Arc::new(ManualClock::new(0)));
        let mut session = SessionData::new();
        session.set("rate_limit_note", SessionValue::Text("x".into()));
        assert_eq!(janitor.prune(&mut session, 10), 0);
        assert!(session.get("rate_limit_note").is_some());
    }

    #[test]
    fn test_prune_does_not_change_decisions() {
        let clock = ManualClock::new(50_000);
        let limiter = RateLimiter::new(Arc::new(clock.clone()));
        let janitor = SessionJanitor::new(Arc::new(clock.clone()));
        let policy = RateLimitPolicy { limit: 3, window_secs: 300 };
        let key = RateLimitKey::new("login", "ip");

        let mut pruned = SessionData::new();
        let mut untouched = SessionData::new();

        for step in 0..40 {
            janitor.prune(&mut pruned, 3_600);
            let a = limiter.check_and_record(&mut pruned, &key, &policy);
            let b = limiter.check_and_record(&mut untouched, &key, &policy);
            assert_eq!(a, b, "diverged at step {step}");
            clock.advance(if step % 7 == 0 { 400 } else { 45 });
        }
    }
}
