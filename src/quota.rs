//! Soft search quota for anonymous sessions.
//!
//! The counter is persisted in a small key/value store shaped like browser
//! local storage. Signed-in sessions are never blocked, but signing in does not
//! clear the counter; only [`SearchQuotaGate::reset`] does.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;

/// Searches allowed before an anonymous session is asked to sign in.
pub const SEARCH_LIMIT: u32 = 5;

/// Storage key holding the search counter.
pub const SEARCH_COUNT_KEY: &str = "searchCount";

/// Authentication signal from the external identity provider
pub trait Session: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// Shared flag updated from sign-in / sign-out notifications
#[derive(Debug, Clone, Default)]
pub struct SessionFlag(Arc<AtomicBool>);

impl SessionFlag {
    /// Create a flag with the given initial state.
    pub fn new(authenticated: bool) -> Self {
        Self(Arc::new(AtomicBool::new(authenticated)))
    }

    /// Mark the session as signed in.
    pub fn sign_in(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Mark the session as signed out.
    pub fn sign_out(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Session for SessionFlag {
    fn is_authenticated(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// String key/value storage
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

/// Store that lives for the process only
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON file of string keys to string values, written through on every change
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is discarded.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed local storage at {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, entries })
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        self.persist()
    }
}

/// Counts searches and reports when an anonymous session hit the limit.
///
/// The gate never runs searches itself. Callers check
/// [`is_limit_reached`](Self::is_limit_reached) before searching.
pub struct SearchQuotaGate {
    store: Box<dyn KeyValueStore>,
    session: Arc<dyn Session>,
    count: u32,
}

impl SearchQuotaGate {
    /// Restore the counter from `store`.
    pub fn new(store: Box<dyn KeyValueStore>, session: Arc<dyn Session>) -> Self {
        let count = match store.get(SEARCH_COUNT_KEY) {
            Some(saved) => saved.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid stored search count {:?}", saved);
                0
            }),
            None => 0,
        };
        debug!("Restored search count {}", count);
        Self {
            store,
            session,
            count,
        }
    }

    /// Searches counted so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the current session is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// True once an anonymous session used up its searches.
    pub fn is_limit_reached(&self) -> bool {
        self.count >= SEARCH_LIMIT && !self.is_authenticated()
    }

    /// Record one search. Returns `true` when the limit is now reached and the
    /// user should be prompted to sign in.
    pub fn increment(&mut self) -> Result<bool> {
        let count = self.count.saturating_add(1);
        self.store.set(SEARCH_COUNT_KEY, &count.to_string())?;
        self.count = count;

        let reached = self.is_limit_reached();
        if reached {
            info!("Search limit of {} reached, sign in to continue", SEARCH_LIMIT);
        }
        Ok(reached)
    }

    /// Clear the counter and its stored value.
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(SEARCH_COUNT_KEY)?;
        self.count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(session: &SessionFlag) -> SearchQuotaGate {
        SearchQuotaGate::new(Box::new(MemoryStore::default()), Arc::new(session.clone()))
    }

    #[test]
    fn limit_reached_after_five_anonymous_searches() {
        let session = SessionFlag::new(false);
        let mut gate = gate(&session);

        for _ in 0..4 {
            assert!(!gate.increment().unwrap());
        }
        assert!(!gate.is_limit_reached());
        assert!(gate.increment().unwrap());
        assert!(gate.is_limit_reached());
    }

    #[test]
    fn signing_in_lifts_the_limit_without_reset() {
        let session = SessionFlag::new(false);
        let mut gate = gate(&session);
        for _ in 0..5 {
            gate.increment().unwrap();
        }
        assert!(gate.is_limit_reached());

        session.sign_in();
        assert!(!gate.is_limit_reached());
        assert_eq!(gate.count(), 5);

        session.sign_out();
        assert!(gate.is_limit_reached());
    }

    #[test]
    fn authenticated_sessions_are_never_blocked() {
        let session = SessionFlag::new(true);
        let mut gate = gate(&session);
        for _ in 0..10 {
            assert!(!gate.increment().unwrap());
        }
        assert_eq!(gate.count(), 10);
    }

    #[test]
    fn reset_clears_count_and_storage() {
        let session = SessionFlag::new(false);
        let mut store = MemoryStore::default();
        store.set(SEARCH_COUNT_KEY, "7").unwrap();
        let mut gate = SearchQuotaGate::new(Box::new(store), Arc::new(session));
        assert_eq!(gate.count(), 7);

        gate.reset().unwrap();
        assert_eq!(gate.count(), 0);
        assert!(gate.store.get(SEARCH_COUNT_KEY).is_none());
    }

    #[test]
    fn invalid_stored_count_restores_as_zero() {
        let mut store = MemoryStore::default();
        store.set(SEARCH_COUNT_KEY, "many").unwrap();
        let gate = SearchQuotaGate::new(Box::new(store), Arc::new(SessionFlag::default()));
        assert_eq!(gate.count(), 0);
    }

    #[test]
    fn local_storage_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");

        let mut storage = LocalStorage::open(&path).unwrap();
        assert!(storage.get(SEARCH_COUNT_KEY).is_none());
        storage.set(SEARCH_COUNT_KEY, "3").unwrap();

        let reopened = LocalStorage::open(&path).unwrap();
        assert_eq!(reopened.get(SEARCH_COUNT_KEY).as_deref(), Some("3"));
    }

    #[test]
    fn gate_restores_count_from_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        let session = SessionFlag::new(false);

        let mut first = SearchQuotaGate::new(Box::new(LocalStorage::open(&path).unwrap()), Arc::new(session.clone()));
        first.increment().unwrap();
        first.increment().unwrap();

        let second = SearchQuotaGate::new(Box::new(LocalStorage::open(&path).unwrap()), Arc::new(session));
        assert_eq!(second.count(), 2);
    }

    #[test]
    fn malformed_local_storage_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "not json").unwrap();

        let storage = LocalStorage::open(&path).unwrap();
        assert!(storage.get(SEARCH_COUNT_KEY).is_none());
    }
}
