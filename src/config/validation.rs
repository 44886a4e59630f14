//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, token size, horizon vs windows)
//! - Validate addresses and header values before the server starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BoardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;

use crate::config::schema::{BoardConfig, RateLimitPolicy};
use crate::security::csrf::MIN_TOKEN_BYTES;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &BoardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let session = &config.session;
    if session.cookie_name.is_empty()
        || !session
            .cookie_name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        errors.push(ValidationError::new(
            "session.cookie_name",
            "must be non-empty and use only letters, digits, '_' or '-'",
        ));
    }
    if session.idle_timeout_secs == 0 {
        errors.push(ValidationError::new("session.idle_timeout_secs", "must be greater than 0"));
    }
    if session.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("session.sweep_interval_secs", "must be greater than 0"));
    }

    let security = &config.security;
    if security.csrf_token_bytes < MIN_TOKEN_BYTES {
        errors.push(ValidationError::new(
            "security.csrf_token_bytes",
            format!("must be at least {MIN_TOKEN_BYTES}"),
        ));
    }
    if security.password_min_length == 0 {
        errors.push(ValidationError::new(
            "security.password_min_length",
            "must be greater than 0",
        ));
    }
    check_policy("security.login", &security.login, &mut errors);
    check_policy("security.admin_actions", &security.admin_actions, &mut errors);
    if security.cleanup_horizon_secs < security.longest_window_secs() {
        errors.push(ValidationError::new(
            "security.cleanup_horizon_secs",
            format!(
                "must be at least the longest rate-limit window ({}s)",
                security.longest_window_secs()
            ),
        ));
    }
    for proxy in &security.trusted_proxies {
        if proxy.trim().parse::<IpAddr>().is_err() {
            errors.push(ValidationError::new(
                "security.trusted_proxies",
                format!("'{proxy}' is not an IP address"),
            ));
        }
    }
    if security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    let headers = &security.headers;
    for (field, value) in [
        ("security.headers.admin_csp", &headers.admin_csp),
        ("security.headers.public_csp", &headers.public_csp),
        ("security.headers.referrer_policy", &headers.referrer_policy),
    ] {
        if value.trim().is_empty() || HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(field, "must be a non-empty valid header value"));
        }
    }

    if config.audit.log_path.trim().is_empty() {
        errors.push(ValidationError::new("audit.log_path", "must not be empty"));
    }
    if config.audit.queue_capacity == 0 {
        errors.push(ValidationError::new("audit.queue_capacity", "must be greater than 0"));
    }

    let digest = &config.admin.password_sha256;
    if !digest.is_empty() && (digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit())) {
        errors.push(ValidationError::new(
            "admin.password_sha256",
            "must be empty or 64 hex characters",
        ));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "must be 'pretty' or 'json'",
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_policy(field: &str, policy: &RateLimitPolicy, errors: &mut Vec<ValidationError>) {
    if policy.limit == 0 {
        errors.push(ValidationError::new(
            &format!("{field}.limit"),
            "must be greater than 0 (0 would block every attempt)",
        ));
    }
    if policy.window_secs == 0 {
        errors.push(ValidationError::new(
            &format!("{field}.window_secs"),
            "must be greater than 0 (0 would disable the limit)",
        ));
    }
}
