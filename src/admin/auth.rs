use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use crate::admin::LOGIN_PATH;
use crate::session::{SessionHandle, ADMIN_ID_KEY};

/// Let through sessions that carry an admin id; send the rest to the login page.
pub async fn require_admin(
    Extension(session): Extension<SessionHandle>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authenticated = session.lock().text(ADMIN_ID_KEY).is_some();
    if authenticated {
        next.run(request).await
    } else {
        tracing::debug!(path = %request.uri().path(), "Unauthenticated admin request");
        Redirect::to(LOGIN_PATH).into_response()
    }
}
