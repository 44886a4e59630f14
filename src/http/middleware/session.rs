//! Session binding.
//!
//! # Responsibilities
//! - Resolve the session cookie to a [`SessionHandle`]
//! - Prune stale rate-limit timestamps on every session access
//! - Resolve the client address into a [`RequestMeta`]
//! - Issue the cookie for sessions created by this request
//!
//! # Design Decisions
//! - Handlers get the session and metadata as request extensions
//! - A response that already sets a cookie (login rotation, logout) is left
//!   alone

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::audit::RequestMeta;
use crate::http::server::AppState;
use crate::session::cookie::{find_cookie, session_cookie};

pub async fn session_middleware(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = find_cookie(request.headers(), &state.config.session.cookie_name);
    let (session, created) = state.sessions.load_or_create(presented);

    let pruned = {
        let mut data = session.lock();
        state
            .janitor
            .prune(&mut *data, state.config.security.cleanup_horizon_secs)
    };
    if pruned > 0 {
        tracing::debug!(pruned, "Pruned stale rate-limit timestamps");
    }

    let client_ip = state.client_ip.resolve(peer, request.headers());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let meta = RequestMeta::new(client_ip.to_string(), user_agent);

    let session_id = session.id().to_string();
    request.extensions_mut().insert(session);
    request.extensions_mut().insert(meta);

    let mut response = next.run(request).await;

    if created && !response.headers().contains_key(header::SET_COOKIE) {
        if let Some(cookie) = session_cookie(&state.config.session, &session_id) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}
