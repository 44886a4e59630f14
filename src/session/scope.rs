//! Key-value view over a single session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A value stored under a session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionValue {
    Text(String),
    /// Unix-second timestamps in insertion order.
    Timestamps(Vec<u64>),
}

impl SessionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SessionValue::Text(s) => Some(s),
            SessionValue::Timestamps(_) => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[u64]> {
        match self {
            SessionValue::Timestamps(ts) => Some(ts),
            SessionValue::Text(_) => None,
        }
    }
}

/// The operations the security components need from a session.
///
/// Components never reach for ambient request state; they are handed a scope.
pub trait SessionScope {
    fn get(&self, key: &str) -> Option<&SessionValue>;
    fn set(&mut self, key: &str, value: SessionValue);
    fn remove(&mut self, key: &str) -> Option<SessionValue>;
    fn keys(&self) -> Vec<String>;
}

/// In-memory session contents.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    values: HashMap<String, SessionValue>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(SessionValue::as_text)
    }
}

impl SessionScope for SessionData {
    fn get(&self, key: &str) -> Option<&SessionValue> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: SessionValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<SessionValue> {
        self.values.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}
