//! Request middleware.
//!
//! ```text
//! request → security_headers → session (admin routes) → handler
//!                 ↑                                          │
//!                 └──────────── headers applied ◀────────────┘
//! ```

pub mod security_headers;
pub mod session;

pub use security_headers::security_headers_middleware;
pub use session::session_middleware;
