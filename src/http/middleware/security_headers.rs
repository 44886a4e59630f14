//! Security response headers.
//!
//! Runs outside everything that can produce a response on its own (timeouts,
//! body limits, auth redirects), so error responses carry the headers too.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::security::{RequestClass, SecurityHeaderPolicy};

pub async fn security_headers_middleware(
    State(policy): State<Arc<SecurityHeaderPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let class = RequestClass::from_path(request.uri().path());
    let mut response = next.run(request).await;

    // insert, not append: a handler-set value must not produce a duplicate
    let headers = response.headers_mut();
    for (name, value) in policy.headers_for(class) {
        headers.insert(name, value);
    }
    response
}
