//! Admin console surface.
//!
//! # Routes
//! - `GET /admin/login`: login form data with the session's CSRF token
//! - `POST /admin/login`: guarded login, redirects to the dashboard
//! - `POST /admin/logout`: guarded, admin only
//! - `GET /admin/dashboard`: admin only

pub mod auth;
pub mod credentials;
pub mod handlers;
pub mod login;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::require_admin;
use self::handlers::*;
use crate::http::server::AppState;

pub use credentials::{AdminIdentity, CredentialVerifier, StaticCredentials};
pub use login::LoginError;

pub const LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

pub fn setup_admin_router() -> Router<AppState> {
    let protected = Router::new()
        .route(DASHBOARD_PATH, get(dashboard))
        .route("/admin/logout", post(logout))
        .layer(middleware::from_fn(require_admin));

    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login))
        .merge(protected)
}
