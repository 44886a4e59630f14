//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults, so an empty file is a valid configuration.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::security::headers::{DEFAULT_ADMIN_CSP, DEFAULT_PUBLIC_CSP, DEFAULT_REFERRER_POLICY};

/// Root configuration for the announcement board.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BoardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Session cookie and expiry settings.
    pub session: SessionConfig,

    /// CSRF, rate limiting and header policy.
    pub security: SecurityConfig,

    /// Security audit log.
    pub audit: AuditConfig,

    /// Admin credential.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session id.
    pub cookie_name: String,

    /// Sessions untouched for this long are discarded.
    pub idle_timeout_secs: u64,

    /// How often idle sessions are swept.
    pub sweep_interval_secs: u64,

    /// Mark the cookie `Secure` (HTTPS deployments).
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "announcement_board_session".to_string(),
            idle_timeout_secs: 1440,
            sweep_interval_secs: 60,
            secure_cookie: false,
        }
    }
}

/// Attempts allowed per sliding window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Maximum attempts inside the window.
    pub limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: 5,
            window_secs: 300,
        }
    }
}

/// Security response header values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// Content-Security-Policy for `/admin` pages.
    pub admin_csp: String,

    /// Content-Security-Policy for public pages.
    pub public_csp: String,

    /// Referrer-Policy for every response.
    pub referrer_policy: String,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            admin_csp: DEFAULT_ADMIN_CSP.to_string(),
            public_csp: DEFAULT_PUBLIC_CSP.to_string(),
            referrer_policy: DEFAULT_REFERRER_POLICY.to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Random bytes per CSRF secret (minimum 32).
    pub csrf_token_bytes: usize,

    /// Rate-limit timestamps older than this are pruned from sessions.
    pub cleanup_horizon_secs: u64,

    /// Peers whose `X-Forwarded-For` entries are believed.
    pub trusted_proxies: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Minimum length enforced by the password strength rules.
    pub password_min_length: usize,

    /// Login attempts per client.
    pub login: RateLimitPolicy,

    /// Create/edit/delete attempts per client.
    pub admin_actions: RateLimitPolicy,

    /// Response header values.
    pub headers: HeadersConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csrf_token_bytes: 32,
            cleanup_horizon_secs: 3600,
            trusted_proxies: Vec::new(),
            max_body_size: 64 * 1024,
            password_min_length: 6,
            login: RateLimitPolicy::default(),
            admin_actions: RateLimitPolicy {
                limit: 30,
                window_secs: 60,
            },
            headers: HeadersConfig::default(),
        }
    }
}

impl SecurityConfig {
    /// Parsed trusted proxies. Validation rejects unparseable entries.
    pub fn trusted_proxy_ips(&self) -> Vec<IpAddr> {
        self.trusted_proxies
            .iter()
            .filter_map(|p| p.trim().parse().ok())
            .collect()
    }

    /// Longest window of any configured rate limit.
    pub fn longest_window_secs(&self) -> u64 {
        self.login.window_secs.max(self.admin_actions.window_secs)
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// JSON-lines file receiving audit records.
    pub log_path: String,

    /// Records buffered ahead of the writer before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: "logs/security.log".to_string(),
            queue_capacity: 1024,
        }
    }
}

/// Admin credential configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin login name.
    pub username: String,

    /// Salt mixed into the password digest.
    pub password_salt: String,

    /// Hex SHA-256 of `password_salt || password` (see `board-cli hash-password`).
    /// Empty disables admin login.
    pub password_sha256: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password_salt: String::new(),
            password_sha256: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
