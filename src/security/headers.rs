//! Security response headers.
//!
//! # Responsibilities
//! - Classify requests as public or admin
//! - Produce the header set for each class
//!
//! # Design Decisions
//! - The policy is built once at startup; header values are validated there
//! - `headers_for` is pure and covers every class, so the middleware can apply
//!   it to error responses too
//! - Admin pages load styles and scripts from the CDNs the console uses;
//!   public pages get the stricter policy

use axum::http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
    X_XSS_PROTECTION,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderName, HeaderValue};

use crate::config::HeadersConfig;

/// Which surface a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    Public,
    Admin,
}

impl RequestClass {
    pub fn from_path(path: &str) -> Self {
        if path == "/admin" || path.contains("/admin/") {
            RequestClass::Admin
        } else {
            RequestClass::Public
        }
    }
}

/// Header sets per request class.
#[derive(Debug, Clone)]
pub struct SecurityHeaderPolicy {
    admin_csp: HeaderValue,
    public_csp: HeaderValue,
    referrer_policy: HeaderValue,
}

/// CSP for the admin console.
pub const DEFAULT_ADMIN_CSP: &str = "default-src 'self' 'unsafe-inline' 'unsafe-eval' \
https://cdn.jsdelivr.net https://cdnjs.cloudflare.com; img-src 'self' data: https:;";

/// CSP for public pages.
pub const DEFAULT_PUBLIC_CSP: &str = "default-src 'self'; \
style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://cdnjs.cloudflare.com https://fonts.googleapis.com; \
script-src 'self' https://cdn.jsdelivr.net; font-src 'self' https://cdnjs.cloudflare.com https://fonts.gstatic.com; \
img-src 'self' data: https:; frame-ancestors 'none'";

pub const DEFAULT_REFERRER_POLICY: &str = "strict-origin-when-cross-origin";

impl Default for SecurityHeaderPolicy {
    fn default() -> Self {
        Self {
            admin_csp: HeaderValue::from_static(DEFAULT_ADMIN_CSP),
            public_csp: HeaderValue::from_static(DEFAULT_PUBLIC_CSP),
            referrer_policy: HeaderValue::from_static(DEFAULT_REFERRER_POLICY),
        }
    }
}

impl SecurityHeaderPolicy {
    pub fn from_config(config: &HeadersConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            admin_csp: HeaderValue::from_str(&config.admin_csp)?,
            public_csp: HeaderValue::from_str(&config.public_csp)?,
            referrer_policy: HeaderValue::from_str(&config.referrer_policy)?,
        })
    }

    pub fn headers_for(&self, class: RequestClass) -> Vec<(HeaderName, HeaderValue)> {
        let csp = match class {
            RequestClass::Admin => self.admin_csp.clone(),
            RequestClass::Public => self.public_csp.clone(),
        };

        vec![
            (X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
            (REFERRER_POLICY, self.referrer_policy.clone()),
            (CONTENT_SECURITY_POLICY, csp),
        ]
    }
}
