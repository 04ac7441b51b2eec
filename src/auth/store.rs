//! Durable storage for the bearer credential and the default-identity flag.
//!
//! The store is the single owner of the credential: the session manager and
//! the API client always read through it rather than holding copies, so the
//! token can never diverge between components or across restarts.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCredentials {
    token: Option<String>,
    #[serde(default)]
    default_identity: bool,
}

/// Key/value persistence for the active credential.
///
/// `clear` removes the token and resets the default-identity flag in one
/// step, so the flag is never observable while no credential is stored.
pub trait CredentialStore: Send + Sync {
    /// The stored bearer token, if any.
    fn token(&self) -> Option<String>;

    fn set_token(&self, token: &str) -> Result<()>;

    /// True iff the current credential was obtained with default credentials.
    fn is_default_identity(&self) -> bool;

    fn set_default_identity(&self, value: bool) -> Result<()>;

    /// Remove the token and reset the default-identity flag.
    fn clear(&self) -> Result<()>;
}

/// File-backed store, durable across process restarts.
///
/// State is a small JSON file; every mutation writes through to disk. Shared
/// mutable access is last-writer-wins, matching how the rest of the session
/// layer treats the store.
pub struct FileCredentialStore {
    path: PathBuf,
    state: Mutex<StoredCredentials>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading existing state if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read credential state file")?;
            serde_json::from_str(&contents).context("Failed to parse credential state file")?
        } else {
            StoredCredentials::default()
        };
        debug!(path = %path.display(), "Opened credential store");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, contents).context("Failed to write credential state file")?;
        Ok(())
    }

    // A poisoned lock means a writer panicked mid-update; the stored state
    // itself is still usable.
    fn state(&self) -> MutexGuard<'_, StoredCredentials> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    fn set_token(&self, token: &str) -> Result<()> {
        let mut state = self.state();
        state.token = Some(token.to_string());
        self.persist(&state)
    }

    fn is_default_identity(&self) -> bool {
        self.state().default_identity
    }

    fn set_default_identity(&self, value: bool) -> Result<()> {
        let mut state = self.state();
        state.default_identity = value;
        self.persist(&state)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state();
        state.default_identity = false;
        state.token = None;
        self.persist(&state)
    }
}

/// In-memory store for tests and skip-auth deployments. Not durable.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoredCredentials> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.state().token = Some(token.to_string());
        Ok(())
    }

    fn is_default_identity(&self) -> bool {
        self.state().default_identity
    }

    fn set_default_identity(&self, value: bool) -> Result<()> {
        self.state().default_identity = value;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state();
        state.default_identity = false;
        state.token = None;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_state_file(name: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "phenoportal-store-test-{}-{}-{}",
            std::process::id(),
            name,
            n
        ))
    }

    #[test]
    fn test_file_store_roundtrip() {
        let path = temp_state_file("roundtrip").join("credentials.json");
        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.token(), None);
        assert!(!store.is_default_identity());

        store.set_token("tok-1").unwrap();
        store.set_default_identity(true).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok-1"));
        assert!(store.is_default_identity());
    }

    #[test]
    fn test_file_store_durable_across_instances() {
        let path = temp_state_file("durable").join("credentials.json");
        {
            let store = FileCredentialStore::open(&path).unwrap();
            store.set_token("tok-2").unwrap();
            store.set_default_identity(true).unwrap();
        }

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("tok-2"));
        assert!(reopened.is_default_identity());
    }

    #[test]
    fn test_clear_resets_flag_with_token() {
        let path = temp_state_file("clear").join("credentials.json");
        let store = FileCredentialStore::open(&path).unwrap();
        store.set_token("tok-3").unwrap();
        store.set_default_identity(true).unwrap();

        store.clear().unwrap();
        assert_eq!(store.token(), None);
        assert!(!store.is_default_identity());

        // Cleared state must survive a reopen too
        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.token(), None);
        assert!(!reopened.is_default_identity());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.token(), None);

        store.set_token("tok-4").unwrap();
        store.set_default_identity(true).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok-4"));
        assert!(store.is_default_identity());

        store.clear().unwrap();
        assert_eq!(store.token(), None);
        assert!(!store.is_default_identity());
    }
}
