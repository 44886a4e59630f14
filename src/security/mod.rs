//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every response:
//!     → headers.rs (frame denial, nosniff, referrer policy, CSP)
//!
//! Every session access:
//!     → janitor.rs (drop stale rate-limit timestamps)
//!
//! State-changing request:
//!     → client_ip.rs (who is asking)
//!     → guard.rs
//!         → rate_limit.rs (sliding window per action + client)
//!         → csrf.rs (constant-time token check)
//!     → audit trail on every refusal
//! ```
//!
//! # Design Decisions
//! - Fail closed: any failed check ends the request
//! - Components take the session explicitly; nothing reads ambient state
//! - Refusals look the same to the client whatever the internal reason

pub mod client_ip;
pub mod clock;
pub mod csrf;
pub mod guard;
pub mod headers;
pub mod input;
pub mod janitor;
pub mod password;
pub mod random;
pub mod rate_limit;

pub use client_ip::ClientIpResolver;
pub use clock::{Clock, ManualClock, SystemClock};
pub use csrf::TokenStore;
pub use guard::{ActionGuard, GuardError};
pub use headers::{RequestClass, SecurityHeaderPolicy};
pub use janitor::SessionJanitor;
pub use rate_limit::{RateLimitKey, RateLimiter};
