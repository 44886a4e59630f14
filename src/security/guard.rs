//! Gate for state-changing actions.
//!
//! ```text
//! rate limit (deny → audit + RateLimited)
//!     → CSRF check (fail → audit + CsrfInvalid)
//!     → caller proceeds
//! ```
//!
//! Each failure is terminal for the request. The caller must hold the session
//! lock for the whole call.

use thiserror::Error;

use crate::audit::{AuditContext, AuditLog, RequestMeta, SecurityEvent};
use crate::config::RateLimitPolicy;
use crate::observability::metrics;
use crate::security::csrf::TokenStore;
use crate::security::rate_limit::{RateLimitKey, RateLimiter};
use crate::session::SessionScope;

/// Why a protected action was refused before it ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("rate limit exceeded for {action}")]
    RateLimited {
        action: String,
        retry_after: Option<u64>,
    },

    /// Covers both a missing session token and a mismatched one.
    #[error("CSRF token rejected")]
    CsrfInvalid,
}

#[derive(Clone)]
pub struct ActionGuard {
    tokens: TokenStore,
    limiter: RateLimiter,
    audit: AuditLog,
}

impl ActionGuard {
    pub fn new(tokens: TokenStore, limiter: RateLimiter, audit: AuditLog) -> Self {
        Self {
            tokens,
            limiter,
            audit,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Run the rate-limit and CSRF checks for `action`.
    ///
    /// Without a `policy` only the CSRF check applies.
    pub fn authorize<S: SessionScope + ?Sized>(
        &self,
        session: &mut S,
        meta: &RequestMeta,
        action: &str,
        policy: Option<&RateLimitPolicy>,
        csrf_candidate: Option<&str>,
    ) -> Result<(), GuardError> {
        if let Some(policy) = policy {
            let key = RateLimitKey::new(action, meta.client_ip.as_str());
            if !self.limiter.check_and_record(session, &key, policy) {
                let retry_after = self.limiter.retry_after(session, &key, policy);
                tracing::warn!(action, client_ip = %meta.client_ip, "Rate limit exceeded");
                metrics::record_rate_limited(action);
                self.audit.record(
                    meta,
                    SecurityEvent::RateLimitExceeded {
                        action: action.to_string(),
                    },
                    AuditContext::new().with("action", action),
                );
                return Err(GuardError::RateLimited {
                    action: action.to_string(),
                    retry_after,
                });
            }
        }

        if !self.tokens.verify(session, csrf_candidate) {
            tracing::warn!(action, client_ip = %meta.client_ip, "CSRF token rejected");
            metrics::record_csrf_rejected(action);
            self.audit.record(
                meta,
                SecurityEvent::CsrfTokenInvalid,
                AuditContext::new().with("action", action),
            );
            return Err(GuardError::CsrfInvalid);
        }

        Ok(())
    }
}
