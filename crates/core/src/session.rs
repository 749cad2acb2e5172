//! Session state: the bearer token plus the cached operator profile.
//!
//! The store is the only mutable state shared across components. It is
//! written once at login, read by every request, and cleared by explicit
//! logout or by the first 401 any in-flight request observes.

use std::{
    fs,
    path::PathBuf,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::UserProfile;

/// Session lifecycle notification delivered outside the failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A 401 invalidated the session; the UI must return to the login
    /// boundary. Emitted at most once per invalidation.
    Expired,
}

/// A live session restored at startup or created by login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token sent as `Authorization: Token <token>`.
    pub token: String,
    /// Last-known profile of the logged-in operator.
    pub profile: UserProfile,
}

/// Holds the current session and mirrors it to disk.
///
/// Construct with [`SessionStore::new`] for the real app or
/// [`SessionStore::in_memory`] in tests; the store is passed explicitly to
/// the client rather than read from ambient globals.
pub struct SessionStore {
    path: Option<PathBuf>,
    inner: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create a store persisted at `path`, restoring any session found there.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let restored = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(session) => Some(session),
                Err(err) => {
                    warn!("ignoring unreadable session file {}: {err}", path.display());
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            path: Some(path),
            inner: RwLock::new(restored),
        }
    }

    /// Create a store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: RwLock::new(None),
        }
    }

    /// Current bearer token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|session| session.token.clone())
    }

    /// Cached profile of the logged-in operator.
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.read().as_ref().map(|session| session.profile.clone())
    }

    /// Whether a session is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Install a new session and persist it. Persistence failures are
    /// logged, not fatal: the in-memory session is what requests use.
    pub fn set(&self, session: Session) {
        let mut slot = self.inner.write();
        self.persist(&session);
        *slot = Some(session);
    }

    /// Drop the session on explicit logout.
    pub fn clear(&self) {
        let mut slot = self.inner.write();
        *slot = None;
        self.remove_file();
    }

    /// Drop the session in response to a 401.
    ///
    /// Returns `true` only for the first caller to observe an authenticated
    /// session; concurrent 401s racing through here get `false`, so the
    /// expiry notification fires exactly once.
    pub fn invalidate(&self) -> bool {
        let mut slot = self.inner.write();
        if slot.take().is_some() {
            self.remove_file();
            true
        } else {
            false
        }
    }

    fn persist(&self, session: &Session) {
        let Some(path) = &self.path else { return };
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("failed to create {}: {err}", parent.display());
                return;
            }
        }
        match serde_json::to_vec_pretty(session) {
            Ok(serialized) => {
                if let Err(err) = fs::write(path, serialized) {
                    warn!("failed to persist session to {}: {err}", path.display());
                }
            }
            Err(err) => warn!("failed to serialize session: {err}"),
        }
    }

    fn remove_file(&self) {
        let Some(path) = &self.path else { return };
        if path.exists() {
            if let Err(err) = fs::remove_file(path) {
                warn!("failed to remove session file {}: {err}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample_session() -> Session {
        Session {
            token: "tok-123".to_string(),
            profile: UserProfile {
                uuid: Uuid::new_v4(),
                first_name: "Ada".to_string(),
                last_name: "Obi".to_string(),
                phone: "08012345678".to_string(),
                address: "12 Harbour Rd".to_string(),
                user_type: UserType::Admin,
                created: None,
                updated: None,
            },
        }
    }

    #[test]
    fn persists_and_restores_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new(&path);
        assert!(!store.is_authenticated());
        store.set(sample_session());
        assert!(path.exists());

        let restored = SessionStore::new(&path);
        assert_eq!(restored.token().as_deref(), Some("tok-123"));
        assert_eq!(restored.profile().unwrap().first_name, "Ada");
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(&path);
        store.set(sample_session());
        store.clear();
        assert!(!store.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn invalidate_reports_true_exactly_once() {
        let store = SessionStore::in_memory();
        store.set(sample_session());
        assert!(store.invalidate());
        assert!(!store.invalidate());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn concurrent_invalidations_yield_a_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(SessionStore::in_memory());
        store.set(sample_session());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.invalidate())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn corrupt_session_file_starts_logged_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(&path);
        assert!(!store.is_authenticated());
    }
}
