//! Security audit trail.
//!
//! # Data Flow
//! ```text
//! Protected action outcome
//!     → AuditLog::record (stamp time, ip, user agent)
//!     → one JSON object per line
//!     → inline sink (tests, CLI) or bounded queue → writer thread → sink
//! ```
//!
//! # Design Decisions
//! - Recording never fails the caller; sink problems are counted, logged and
//!   exported as a metric
//! - A full queue drops the record instead of blocking the request
//! - Records are immutable once written; there is no update or delete

pub mod sink;
pub mod summary;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::observability::metrics;
pub use sink::{AuditSink, FileSink, MemorySink};

/// Timestamp layout of the `timestamp` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who made the request being audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub client_ip: String,
    pub user_agent: String,
}

impl RequestMeta {
    pub fn new(client_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Security-relevant occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityEvent {
    LoginSuccess,
    LoginFailed,
    CsrfTokenInvalid,
    RateLimitExceeded { action: String },
    Logout,
}

impl SecurityEvent {
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            SecurityEvent::LoginSuccess => Cow::Borrowed("admin_login_success"),
            SecurityEvent::LoginFailed => Cow::Borrowed("admin_login_failed"),
            SecurityEvent::CsrfTokenInvalid => Cow::Borrowed("csrf_token_invalid"),
            SecurityEvent::RateLimitExceeded { action } => {
                Cow::Owned(format!("{action}_rate_limit_exceeded"))
            }
            SecurityEvent::Logout => Cow::Borrowed("admin_logout"),
        }
    }
}

/// Flat key-value details attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditContext(BTreeMap<String, String>);

impl AuditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub ip: String,
    pub user_agent: String,
    pub event: String,
    pub data: AuditContext,
}

/// Why a record did not reach the sink.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    SinkUnavailable(#[from] std::io::Error),

    #[error("audit queue full")]
    QueueFull,

    #[error("audit writer stopped")]
    WriterStopped,

    #[error("audit record not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AuditError {
    fn reason(&self) -> &'static str {
        match self {
            AuditError::SinkUnavailable(_) => "sink_unavailable",
            AuditError::QueueFull => "queue_full",
            AuditError::WriterStopped => "writer_stopped",
            AuditError::Serialize(_) => "serialize",
        }
    }
}

#[derive(Clone)]
enum Delivery {
    Inline(Arc<dyn AuditSink>),
    Queued(mpsc::Sender<String>),
}

/// Handle used by request handlers to record events.
#[derive(Clone)]
pub struct AuditLog {
    delivery: Delivery,
    failures: Arc<AtomicU64>,
}

impl AuditLog {
    /// Write each record synchronously on the calling thread.
    pub fn inline(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            delivery: Delivery::Inline(sink),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue records to a dedicated writer thread.
    ///
    /// The writer exits once every clone of the returned log is dropped.
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
        let failures = Arc::new(AtomicU64::new(0));
        let writer_failures = failures.clone();

        let handle = tokio::task::spawn_blocking(move || {
            while let Some(line) = rx.blocking_recv() {
                if let Err(e) = sink.append(&line) {
                    note_failure(&writer_failures, &AuditError::SinkUnavailable(e));
                }
            }
            tracing::debug!("Audit writer stopped");
        });

        (
            Self {
                delivery: Delivery::Queued(tx),
                failures,
            },
            handle,
        )
    }

    /// Append one event. Never fails the caller.
    pub fn record(&self, meta: &RequestMeta, event: SecurityEvent, context: AuditContext) {
        let record = AuditRecord {
            timestamp: chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            ip: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
            event: event.name().into_owned(),
            data: context,
        };

        tracing::info!(
            event = %record.event,
            client_ip = %record.ip,
            "Security event"
        );

        if let Err(e) = self.deliver(&record) {
            note_failure(&self.failures, &e);
        }
    }

    fn deliver(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;
        match &self.delivery {
            Delivery::Inline(sink) => sink.append(&line).map_err(AuditError::from),
            Delivery::Queued(tx) => tx.try_send(line).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => AuditError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => AuditError::WriterStopped,
            }),
        }
    }

    /// Records lost so far.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

fn note_failure(failures: &AtomicU64, error: &AuditError) {
    failures.fetch_add(1, Ordering::Relaxed);
    metrics::record_audit_failure(error.reason());
    tracing::error!(error = %error, "Audit record lost");
}
