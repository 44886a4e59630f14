//! Concurrent in-memory session store.
//!
//! Each session sits behind its own mutex so that everything a request does to
//! its session (rate-limit bookkeeping, token issue, login) is serialized per
//! session while unrelated sessions proceed in parallel.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;
use crate::security::random::random_hex;
use crate::session::scope::SessionData;

/// Session ids are 32 random bytes, hex encoded.
const SESSION_ID_BYTES: usize = 32;

struct SessionEntry {
    data: Mutex<SessionData>,
    last_access: Mutex<Instant>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            data: Mutex::new(SessionData::new()),
            last_access: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_access.lock().expect("session clock mutex poisoned") = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_access
            .lock()
            .expect("session clock mutex poisoned")
            .elapsed()
    }
}

/// A live reference to one session.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    entry: Arc<SessionEntry>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lock the session for the duration of a read-modify-write sequence.
    pub fn lock(&self) -> MutexGuard<'_, SessionData> {
        self.entry.data.lock().expect("session mutex poisoned")
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the id: it is a bearer credential.
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

/// Server-side session storage keyed by the cookie-presented id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<SessionEntry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    /// Resolve the presented id or start a fresh session.
    ///
    /// Returns the handle and whether it was created. Unknown, expired or
    /// malformed ids never get adopted; the client receives a new id instead.
    pub fn load_or_create(&self, presented: Option<&str>) -> (SessionHandle, bool) {
        if let Some(id) = presented.filter(|id| is_well_formed(id)) {
            if let Some(entry) = self.sessions.get(id).map(|e| e.value().clone()) {
                if entry.idle_for() < self.idle_timeout {
                    entry.touch();
                    return (
                        SessionHandle {
                            id: id.to_string(),
                            entry,
                        },
                        false,
                    );
                }
                self.sessions.remove(id);
            }
        }

        let id = random_hex(SESSION_ID_BYTES);
        let entry = Arc::new(SessionEntry::new());
        self.sessions.insert(id.clone(), entry.clone());
        metrics::record_active_sessions(self.sessions.len());
        tracing::debug!(sessions = self.sessions.len(), "Session created");
        (SessionHandle { id, entry }, true)
    }

    /// Move the session to a fresh id, keeping its contents.
    pub fn rotate(&self, handle: &SessionHandle) -> SessionHandle {
        let id = random_hex(SESSION_ID_BYTES);
        self.sessions.remove(&handle.id);
        self.sessions.insert(id.clone(), handle.entry.clone());
        SessionHandle {
            id,
            entry: handle.entry.clone(),
        }
    }

    pub fn destroy(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            metrics::record_active_sessions(self.sessions.len());
        }
    }

    /// Drop sessions idle for longer than the configured timeout.
    pub fn sweep_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.idle_for() < self.idle_timeout);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            metrics::record_active_sessions(self.sessions.len());
            tracing::debug!(removed, remaining = self.sessions.len(), "Swept idle sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn is_well_formed(id: &str) -> bool {
    id.len() == SESSION_ID_BYTES * 2 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::scope::{SessionScope, SessionValue};

    #[test]
    fn test_create_then_reload() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (handle, created) = store.load_or_create(None);
        assert!(created);
        handle.lock().set("k", SessionValue::Text("v".into()));

        let (again, created) = store.load_or_create(Some(handle.id()));
        assert!(!created);
        assert_eq!(again.id(), handle.id());
        assert_eq!(again.lock().text("k"), Some("v"));
    }

    #[test]
    fn test_unknown_or_malformed_id_is_not_adopted() {
        let store = SessionStore::new(Duration::from_secs(60));
        let forged = "a".repeat(64);
        let (handle, created) = store.load_or_create(Some(&forged));
        assert!(created);
        assert_ne!(handle.id(), forged);

        let (handle, created) = store.load_or_create(Some("not-hex"));
        assert!(created);
        assert_eq!(handle.id().len(), 64);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_rotate_keeps_data_and_retires_old_id() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (handle, _) = store.load_or_create(None);
        handle.lock().set("admin_id", SessionValue::Text("1".into()));

        let rotated = store.rotate(&handle);
        assert_ne!(rotated.id(), handle.id());
        assert_eq!(rotated.lock().text("admin_id"), Some("1"));

        let (fresh, created) = store.load_or_create(Some(handle.id()));
        assert!(created);
        assert!(fresh.lock().is_empty());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::ZERO);
        let (handle, _) = store.load_or_create(None);
        assert_eq!(store.sweep_idle(), 1);
        assert!(store.is_empty());

        let (_, created) = store.load_or_create(Some(handle.id()));
        assert!(created);
    }

    #[test]
    fn test_destroy() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (handle, _) = store.load_or_create(None);
        store.destroy(handle.id());
        assert!(store.is_empty());
    }
}
