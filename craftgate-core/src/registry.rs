//! Maps logical backend identifiers to their sessions.
//!
//! Sessions are created lazily on first lookup and reused across
//! requests for the lifetime of the process; there is no eviction
//! policy here, but `last_accessed` is tracked so a caller can layer
//! one on later. Creation is race-free: concurrent first lookups of the
//! same id all land on one session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{BackendConfig, SessionTuning};
use crate::error::RconError;
use crate::session::RconSession;

struct RegistryEntry {
    session: Arc<RconSession>,
    last_accessed: Instant,
}

/// Owns every session, keyed by backend id.
pub struct SessionRegistry {
    backends: HashMap<String, BackendConfig>,
    tuning: SessionTuning,
    entries: Mutex<HashMap<String, RegistryEntry>>,
}

impl SessionRegistry {
    /// Register the known backends up front; sessions come later, on
    /// demand. Duplicate ids keep the last config.
    pub fn new(backends: impl IntoIterator<Item = BackendConfig>, tuning: SessionTuning) -> Self {
        Self {
            backends: backends
                .into_iter()
                .map(|b| (b.id.clone(), b))
                .collect(),
            tuning,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Ids of every registered backend.
    pub fn backend_ids(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// The session for `backend_id`, constructing it (disconnected, not
    /// yet dialled) on first access. Exactly one session is created per
    /// id even under concurrent lookups: construction happens under the
    /// table lock.
    pub async fn get(&self, backend_id: &str) -> Result<Arc<RconSession>, RconError> {
        let config = self
            .backends
            .get(backend_id)
            .ok_or_else(|| RconError::UnknownBackend(backend_id.to_string()))?;

        let mut entries = self.entries.lock().await;
        let entry = entries.entry(backend_id.to_string()).or_insert_with(|| {
            debug!(backend = backend_id, "creating session");
            RegistryEntry {
                session: Arc::new(RconSession::new(config.clone(), self.tuning.clone())),
                last_accessed: Instant::now(),
            }
        });
        entry.last_accessed = Instant::now();
        Ok(entry.session.clone())
    }

    /// When the session for `backend_id` was last handed out, if it
    /// exists. Hook for an external eviction policy.
    pub async fn last_accessed(&self, backend_id: &str) -> Option<Instant> {
        self.entries
            .lock()
            .await
            .get(backend_id)
            .map(|entry| entry.last_accessed)
    }

    /// Close and evict the session for `backend_id`, if present. The
    /// backend stays registered; a later `get` builds a fresh session.
    pub async fn remove(&self, backend_id: &str) {
        let removed = self.entries.lock().await.remove(backend_id);
        if let Some(entry) = removed {
            entry.session.close().await;
            debug!(backend = backend_id, "session evicted");
        }
    }

    /// Close every session promptly. Used at process shutdown.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self
            .entries
            .lock()
            .await
            .drain()
            .map(|(_, entry)| entry.session)
            .collect();
        for session in drained {
            session.close().await;
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("backends", &self.backends.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(id: &str) -> BackendConfig {
        BackendConfig {
            id: id.into(),
            host: "127.0.0.1".into(),
            port: 25575,
            password: "secret".into(),
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new([backend("smp-1"), backend("smp-2")], SessionTuning::default())
    }

    #[tokio::test]
    async fn get_reuses_one_session_per_backend() {
        let registry = registry();
        let a = registry.get("smp-1").await.unwrap();
        let b = registry.get("smp-1").await.unwrap();
        let other = registry.get("smp-2").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn unknown_backend_is_an_error() {
        let registry = registry();
        assert!(matches!(
            registry.get("nope").await,
            Err(RconError::UnknownBackend(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_first_access_creates_exactly_one_session() {
        let registry = Arc::new(registry());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(
                async move { registry.get("smp-1").await.unwrap() },
            ));
        }
        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap());
        }
        for session in &sessions[1..] {
            assert!(Arc::ptr_eq(&sessions[0], session));
        }
    }

    #[tokio::test]
    async fn remove_evicts_and_recreates() {
        let registry = registry();
        let first = registry.get("smp-1").await.unwrap();
        registry.remove("smp-1").await;
        let second = registry.get("smp-1").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn last_accessed_tracks_lookups() {
        let registry = registry();
        assert!(registry.last_accessed("smp-1").await.is_none());
        registry.get("smp-1").await.unwrap();
        let first = registry.last_accessed("smp-1").await.unwrap();
        registry.get("smp-1").await.unwrap();
        let second = registry.last_accessed("smp-1").await.unwrap();
        assert!(second >= first);
    }

    #[tokio::test]
    async fn close_all_empties_the_table() {
        let registry = registry();
        registry.get("smp-1").await.unwrap();
        registry.get("smp-2").await.unwrap();
        registry.close_all().await;
        assert!(registry.last_accessed("smp-1").await.is_none());
        assert!(registry.last_accessed("smp-2").await.is_none());
    }
}
