//! Admin login.
//!
//! ```text
//! START
//!     → rate limit (deny → audit, RateLimited)
//!     → CSRF (fail → audit, CsrfInvalid)
//!     → field check (empty → MissingCredentials)
//!     → credential check (fail → audit admin_login_failed)
//!     → audit admin_login_success, session marked as admin
//! ```
//!
//! Nothing is retried; the client has to send a new request.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::admin::credentials::{AdminIdentity, CredentialVerifier};
use crate::audit::{AuditContext, RequestMeta, SecurityEvent};
use crate::config::RateLimitPolicy;
use crate::observability::metrics;
use crate::security::guard::{ActionGuard, GuardError};
use crate::security::input::{validate_fields, FieldRule, Sanitize};
use crate::session::{SessionScope, SessionValue, ADMIN_ID_KEY, ADMIN_USERNAME_KEY};

/// Rate-limit action name for login attempts.
pub const LOGIN_ACTION: &str = "login";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("username or password missing")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,
}

/// What the login form submitted.
#[derive(Debug, Clone, Copy)]
pub struct LoginAttempt<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub csrf_token: Option<&'a str>,
}

/// Run one login attempt against `session`.
///
/// The caller holds the session lock for the duration.
pub fn attempt_login<S: SessionScope + ?Sized>(
    guard: &ActionGuard,
    verifier: &dyn CredentialVerifier,
    policy: &RateLimitPolicy,
    session: &mut S,
    meta: &RequestMeta,
    attempt: LoginAttempt<'_>,
) -> Result<AdminIdentity, LoginError> {
    if let Err(e) = guard.authorize(session, meta, LOGIN_ACTION, Some(policy), attempt.csrf_token) {
        metrics::record_login("rejected");
        return Err(e.into());
    }

    let mut fields = BTreeMap::new();
    fields.insert("username".to_string(), attempt.username.to_string());
    fields.insert("password".to_string(), attempt.password.to_string());
    let checked = validate_fields(
        &fields,
        &[
            (
                "username",
                FieldRule {
                    sanitize: Sanitize::String,
                    required: true,
                    ..Default::default()
                },
            ),
            (
                "password",
                FieldRule {
                    required: true,
                    ..Default::default()
                },
            ),
        ],
    );
    if !checked.is_ok() {
        return Err(LoginError::MissingCredentials);
    }
    let username = checked.data.get("username").map(String::as_str).unwrap_or_default();

    match verifier.verify(username, attempt.password) {
        Some(identity) => {
            session.set(ADMIN_ID_KEY, SessionValue::Text(identity.id.clone()));
            session.set(ADMIN_USERNAME_KEY, SessionValue::Text(identity.username.clone()));
            metrics::record_login("success");
            tracing::info!(username = %identity.username, client_ip = %meta.client_ip, "Admin logged in");
            guard.audit().record(
                meta,
                SecurityEvent::LoginSuccess,
                AuditContext::new()
                    .with("admin_id", identity.id.as_str())
                    .with("username", identity.username.as_str()),
            );
            Ok(identity)
        }
        None => {
            metrics::record_login("failure");
            tracing::warn!(client_ip = %meta.client_ip, "Admin login failed");
            guard.audit().record(
                meta,
                SecurityEvent::LoginFailed,
                AuditContext::new().with("username", username),
            );
            Err(LoginError::InvalidCredentials)
        }
    }
}
