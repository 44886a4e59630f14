//! Per-session CSRF tokens.
//!
//! One secret per session, created on first demand and kept for the life of
//! the session. Forms embed it in the `csrf_token` field and state-changing
//! requests must echo it back.

use subtle::ConstantTimeEq;

use crate::security::random::random_hex;
use crate::session::{SessionScope, SessionValue};

/// Session key the secret is stored under.
pub const CSRF_SESSION_KEY: &str = "csrf_token";

/// Form field the secret travels in.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Smallest accepted secret size (256 bits).
pub const MIN_TOKEN_BYTES: usize = 32;

/// Issues and checks CSRF tokens.
#[derive(Debug, Clone)]
pub struct TokenStore {
    token_bytes: usize,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self {
            token_bytes: MIN_TOKEN_BYTES,
        }
    }
}

impl TokenStore {
    /// Secrets shorter than [`MIN_TOKEN_BYTES`] are raised to the minimum.
    pub fn new(token_bytes: usize) -> Self {
        Self {
            token_bytes: token_bytes.max(MIN_TOKEN_BYTES),
        }
    }

    /// Return the session's token, generating it on first use.
    pub fn issue<S: SessionScope + ?Sized>(&self, session: &mut S) -> String {
        if let Some(existing) = session.get(CSRF_SESSION_KEY).and_then(SessionValue::as_text) {
            if !existing.is_empty() {
                return existing.to_string();
            }
        }

        let token = random_hex(self.token_bytes);
        session.set(CSRF_SESSION_KEY, SessionValue::Text(token.clone()));
        tracing::debug!("CSRF token issued");
        token
    }

    /// Constant-time check of `candidate` against the session's token.
    ///
    /// A session without a token and a wrong candidate are indistinguishable
    /// to the caller.
    pub fn verify<S: SessionScope + ?Sized>(&self, session: &S, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return false;
        };
        let Some(stored) = session.get(CSRF_SESSION_KEY).and_then(SessionValue::as_text) else {
            return false;
        };
        if stored.is_empty() {
            return false;
        }
        stored.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}
