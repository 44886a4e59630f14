//! Metrics collection and exposition.
//!
//! # Metrics
//! - `board_rate_limited_total` (counter): refused attempts by action
//! - `board_csrf_rejected_total` (counter): CSRF refusals by action
//! - `board_logins_total` (counter): login outcomes
//! - `board_audit_failures_total` (counter): audit records lost, by reason
//! - `board_active_sessions` (gauge): sessions held by the store
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so library code
//!   and tests can call these freely

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited(action: &str) {
    metrics::counter!("board_rate_limited_total", "action" => action.to_string()).increment(1);
}

pub fn record_csrf_rejected(action: &str) {
    metrics::counter!("board_csrf_rejected_total", "action" => action.to_string()).increment(1);
}

pub fn record_login(outcome: &'static str) {
    metrics::counter!("board_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_audit_failure(reason: &'static str) {
    metrics::counter!("board_audit_failures_total", "reason" => reason).increment(1);
}

pub fn record_active_sessions(count: usize) {
    metrics::gauge!("board_active_sessions").set(count as f64);
}
