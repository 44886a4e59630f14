//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeouts, body limits,
//!   security headers, sessions on admin routes only)
//! - Build the security components from configuration
//! - Sweep idle sessions in the background
//! - Bind server to listener and stop on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{self, CredentialVerifier};
use crate::audit::AuditLog;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::{BoardConfig, ConfigError};
use crate::http::middleware::{security_headers_middleware, session_middleware};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::security::{
    ActionGuard, ClientIpResolver, Clock, RateLimiter, SecurityHeaderPolicy, SessionJanitor,
    SystemClock, TokenStore,
};
use crate::session::SessionStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BoardConfig>,
    pub sessions: SessionStore,
    pub guard: ActionGuard,
    pub janitor: SessionJanitor,
    pub client_ip: Arc<ClientIpResolver>,
    pub credentials: Arc<dyn CredentialVerifier>,
}

/// HTTP server for the announcement board.
pub struct HttpServer {
    router: Router,
    sessions: SessionStore,
    config: Arc<BoardConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: BoardConfig,
        audit: AuditLog,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(config, audit, credentials, Arc::new(SystemClock))
    }

    /// Like [`HttpServer::new`], with the clock rate limiting and pruning read.
    pub fn with_clock(
        config: BoardConfig,
        audit: AuditLog,
        credentials: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let headers = SecurityHeaderPolicy::from_config(&config.security.headers).map_err(|e| {
            ConfigError::Validation(vec![ValidationError {
                field: "security.headers".to_string(),
                message: e.to_string(),
            }])
        })?;

        let config = Arc::new(config);
        let sessions = SessionStore::new(Duration::from_secs(config.session.idle_timeout_secs));
        let guard = ActionGuard::new(
            TokenStore::new(config.security.csrf_token_bytes),
            RateLimiter::new(clock.clone()),
            audit,
        );

        let state = AppState {
            config: config.clone(),
            sessions: sessions.clone(),
            guard,
            janitor: SessionJanitor::new(clock),
            client_ip: Arc::new(ClientIpResolver::new(config.security.trusted_proxy_ips())),
            credentials,
        };

        let router = Self::build_router(&config, state, Arc::new(headers));
        Ok(Self {
            router,
            sessions,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &BoardConfig,
        state: AppState,
        headers: Arc<SecurityHeaderPolicy>,
    ) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .merge(
                admin::setup_admin_router()
                    .layer(middleware::from_fn_with_state(state.clone(), session_middleware)),
            )
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(headers, security_headers_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request),
                        )
                    }))
                    .layer(propagate_request_id_layer()),
            )
            .with_state(state)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = tokio::spawn(sweep_sessions(
            self.sessions.clone(),
            Duration::from_secs(self.config.session.sweep_interval_secs),
            shutdown.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }
}

async fn sweep_sessions(
    sessions: SessionStore,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sessions.sweep_idle();
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[derive(Serialize)]
pub struct IndexView {
    pub name: &'static str,
    pub version: &'static str,
}

async fn index() -> Json<IndexView> {
    Json(IndexView {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health() -> &'static str {
    "ok"
}
