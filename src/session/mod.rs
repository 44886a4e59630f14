//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → cookie.rs (extract presented id)
//!     → store.rs (load or create, per-session mutex)
//!     → scope.rs (SessionScope handed to security components)
//!     → cookie.rs (Set-Cookie for new or rotated ids)
//! ```
//!
//! # Design Decisions
//! - Security components only see the `SessionScope` trait
//! - Session contents are serialized per session, never globally
//! - Idle expiry belongs to the store, not to the security layer

pub mod cookie;
pub mod scope;
pub mod store;

pub use scope::{SessionData, SessionScope, SessionValue};
pub use store::{SessionHandle, SessionStore};

/// Session key holding the logged-in admin's id.
pub const ADMIN_ID_KEY: &str = "admin_id";

/// Session key holding the logged-in admin's username.
pub const ADMIN_USERNAME_KEY: &str = "admin_username";
