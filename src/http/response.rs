//! Error-to-response mapping.
//!
//! # Design Decisions
//! - Bodies are short, fixed strings; internal reasons never reach the client
//! - Rate-limit refusals carry `Retry-After` when the window end is known

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::admin::login::LoginError;
use crate::security::GuardError;

pub const RATE_LIMITED_MESSAGE: &str = "Too many attempts. Please try again later.";
pub const CSRF_INVALID_MESSAGE: &str = "Invalid security token. Please try again.";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both username and password.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::RateLimited { retry_after, .. } => {
                let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE).into_response();
                if let Some(secs) = retry_after {
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
                response
            }
            GuardError::CsrfInvalid => (StatusCode::FORBIDDEN, CSRF_INVALID_MESSAGE).into_response(),
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            LoginError::Guard(e) => e.into_response(),
            LoginError::MissingCredentials => {
                (StatusCode::BAD_REQUEST, MISSING_CREDENTIALS_MESSAGE).into_response()
            }
            LoginError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = GuardError::RateLimited {
            action: "login".into(),
            retry_after: Some(42),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_login_error_statuses() {
        assert_eq!(
            LoginError::Guard(GuardError::CsrfInvalid).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LoginError::MissingCredentials.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LoginError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
