use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::login::{attempt_login, LoginAttempt};
use crate::admin::{DASHBOARD_PATH, LOGIN_PATH};
use crate::audit::{AuditContext, RequestMeta, SecurityEvent};
use crate::http::server::AppState;
use crate::security::csrf::CSRF_FORM_FIELD;
use crate::session::cookie::{expired_cookie, session_cookie};
use crate::session::{SessionHandle, ADMIN_ID_KEY, ADMIN_USERNAME_KEY};

/// Rate-limit action name for logout.
pub const LOGOUT_ACTION: &str = "logout";

#[derive(Serialize)]
pub struct LoginFormView {
    pub csrf_field: &'static str,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub csrf_token: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardView {
    pub username: String,
    pub csrf_token: String,
    pub active_sessions: usize,
    pub audit_failures: u64,
}

pub async fn login_form(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Response {
    let token = {
        let mut data = session.lock();
        if data.text(ADMIN_ID_KEY).is_some() {
            None
        } else {
            Some(state.guard.tokens().issue(&mut *data))
        }
    };

    match token {
        Some(csrf_token) => Json(LoginFormView {
            csrf_field: CSRF_FORM_FIELD,
            csrf_token,
        })
        .into_response(),
        None => Redirect::to(DASHBOARD_PATH).into_response(),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Extension(meta): Extension<RequestMeta>,
    Form(form): Form<LoginForm>,
) -> Response {
    let outcome = {
        let mut data = session.lock();
        attempt_login(
            &state.guard,
            state.credentials.as_ref(),
            &state.config.security.login,
            &mut *data,
            &meta,
            LoginAttempt {
                username: &form.username,
                password: &form.password,
                csrf_token: form.csrf_token.as_deref(),
            },
        )
    };

    match outcome {
        Ok(_) => {
            let rotated = state.sessions.rotate(&session);
            let mut response = Redirect::to(DASHBOARD_PATH).into_response();
            if let Some(cookie) = session_cookie(&state.config.session, rotated.id()) {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Extension(meta): Extension<RequestMeta>,
    Form(form): Form<ActionForm>,
) -> Response {
    let outcome = {
        let mut data = session.lock();
        state
            .guard
            .authorize(
                &mut *data,
                &meta,
                LOGOUT_ACTION,
                Some(&state.config.security.admin_actions),
                form.csrf_token.as_deref(),
            )
            .map(|()| data.text(ADMIN_USERNAME_KEY).unwrap_or_default().to_string())
    };

    let username = match outcome {
        Ok(username) => username,
        Err(e) => return e.into_response(),
    };

    state.sessions.destroy(session.id());
    tracing::info!(username = %username, client_ip = %meta.client_ip, "Admin logged out");
    state.guard.audit().record(
        &meta,
        SecurityEvent::Logout,
        AuditContext::new().with("username", username),
    );

    let mut response = Redirect::to(LOGIN_PATH).into_response();
    if let Some(cookie) = expired_cookie(&state.config.session) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Json<DashboardView> {
    let (username, csrf_token) = {
        let mut data = session.lock();
        let username = data.text(ADMIN_USERNAME_KEY).unwrap_or_default().to_string();
        (username, state.guard.tokens().issue(&mut *data))
    };

    Json(DashboardView {
        username,
        csrf_token,
        active_sessions: state.sessions.len(),
        audit_failures: state.guard.audit().failure_count(),
    })
}
