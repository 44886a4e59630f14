//! Security layer of the announcement board's admin console.
//!
//! CSRF tokens, sliding-window rate limiting, session hygiene, security
//! response headers and an append-only audit trail, served through Axum.

pub mod admin;
pub mod audit;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod session;

pub use config::BoardConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
