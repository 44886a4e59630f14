//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use board_guard::admin::{AdminIdentity, CredentialVerifier};
use board_guard::audit::{AuditLog, MemorySink};
use board_guard::config::BoardConfig;
use board_guard::http::HttpServer;
use board_guard::lifecycle::Shutdown;
use board_guard::security::ManualClock;
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::Response;
use serde_json::Value;
use tokio::net::TcpListener;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Secret123";
pub const COOKIE_NAME: &str = "announcement_board_session";

/// Accepts one account and counts how often it was asked.
#[derive(Default)]
pub struct CountingVerifier {
    calls: AtomicUsize,
}

impl CountingVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialVerifier for CountingVerifier {
    fn verify(&self, username: &str, password: &str) -> Option<AdminIdentity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (username == ADMIN_USER && password == ADMIN_PASSWORD).then(|| AdminIdentity {
            id: "1".to_string(),
            username: ADMIN_USER.to_string(),
        })
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: MemorySink,
    pub verifier: Arc<CountingVerifier>,
    pub clock: ManualClock,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Event names written to the audit log so far, in order.
    pub fn audit_events(&self) -> Vec<String> {
        self.audit_records()
            .iter()
            .map(|record| record["event"].as_str().unwrap().to_string())
            .collect()
    }

    pub fn audit_records(&self) -> Vec<Value> {
        self.sink
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port with an inline in-memory audit log.
pub async fn start_server(configure: impl FnOnce(&mut BoardConfig)) -> TestServer {
    let mut config = BoardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    configure(&mut config);

    let sink = MemorySink::new();
    let verifier = Arc::new(CountingVerifier::default());
    let clock = ManualClock::new(1_700_000_000);
    let server = HttpServer::with_clock(
        config,
        AuditLog::inline(Arc::new(sink.clone())),
        verifier.clone(),
        Arc::new(clock.clone()),
    )
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, stopped).await;
    });

    TestServer {
        addr,
        sink,
        verifier,
        clock,
        shutdown,
    }
}

/// A client that keeps the session cookie and never follows redirects.
pub struct Browser {
    client: reqwest::Client,
    pub cookie: Option<String>,
    pub extra_headers: HeaderMap,
}

impl Browser {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .build()
            .unwrap();
        Self {
            client,
            cookie: None,
            extra_headers: HeaderMap::new(),
        }
    }

    pub async fn get(&mut self, url: &str) -> Response {
        let request = self.decorate(self.client.get(url));
        let response = request.send().await.unwrap();
        self.remember(&response);
        response
    }

    pub async fn post_form(&mut self, url: &str, form: &[(&str, &str)]) -> Response {
        let request = self.decorate(self.client.post(url).form(form));
        let response = request.send().await.unwrap();
        self.remember(&response);
        response
    }

    /// Fetch the login page and return its CSRF token.
    pub async fn csrf_token(&mut self, server: &TestServer) -> String {
        let response = self.get(&server.url("/admin/login")).await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["csrf_token"].as_str().unwrap().to_string()
    }

    pub async fn login(&mut self, server: &TestServer, password: &str, token: &str) -> Response {
        self.post_form(
            &server.url("/admin/login"),
            &[
                ("username", ADMIN_USER),
                ("password", password),
                ("csrf_token", token),
            ],
        )
        .await
    }

    fn decorate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.headers(self.extra_headers.clone());
        match &self.cookie {
            Some(id) => request.header(COOKIE, format!("{}={}", COOKIE_NAME, id)),
            None => request,
        }
    }

    fn remember(&mut self, response: &Response) {
        let Some(value) = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        else {
            return;
        };
        let pair = value.split(';').next().unwrap_or_default();
        if let Some((name, id)) = pair.split_once('=') {
            if name == COOKIE_NAME {
                self.cookie = (!id.is_empty() && !value.contains("Max-Age=0")).then(|| id.to_string());
            }
        }
    }
}
