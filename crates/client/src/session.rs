//! Session store: holds the opaque credential for the signed-in user.
//!
//! The store is injected into both the coordinator and the fetch gateway so
//! neither reaches for ambient global state.

use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;

use notiflow_shared::UserProfile;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage;

const STORAGE_KEY: &str = "session";

/// Opaque authentication credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw secret, for placing in request headers or query strings.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Identifies the authenticated user a connection lifecycle belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&UserProfile> for IdentityKey {
    fn from(profile: &UserProfile) -> Self {
        Self(profile.id.clone())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credential holder with an explicit lifecycle: `set` on login, `clear` on
/// logout or when the backend rejects the credential.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential);
    fn clear(&self);
}

/// In-process session store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    credential: RwLock<Option<Credential>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Credential> {
        match self.credential.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, credential: Credential) {
        match self.credential.write() {
            Ok(mut guard) => *guard = Some(credential),
            Err(poisoned) => *poisoned.into_inner() = Some(credential),
        }
    }

    fn clear(&self) {
        match self.credential.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

/// Stored session data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    credential: Credential,
}

/// Session store persisted as a JSON file, so a restart resumes the session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session in the platform config directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self {
            path: storage::default_path(STORAGE_KEY)?,
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<Credential> {
        storage::load::<StoredSession>(&self.path).map(|s| s.credential)
    }

    fn set(&self, credential: Credential) {
        if let Err(e) = storage::save(&self.path, &StoredSession { credential }) {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }

    fn clear(&self) {
        if let Err(e) = storage::remove(&self.path) {
            tracing::warn!(error = %e, "failed to remove persisted session");
        }
    }
}
