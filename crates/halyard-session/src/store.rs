//! Credential model and storage.
//!
//! The credential is an opaque bearer token owned by a [`CredentialStore`].
//! [`FileCredentialStore`] persists it as a small JSON document under a
//! stable path so it survives process restarts; [`MemoryCredentialStore`]
//! keeps it in memory for tests and embedders that manage their own
//! persistence.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Result, SessionError};

/// File name the durable store writes within its directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

/// Opaque bearer credential.
///
/// The token value is never interpreted by this crate and never appears in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for attaching to an authorization header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// On-disk representation written by [`FileCredentialStore`].
#[derive(Serialize, Deserialize)]
struct PersistedCredential {
    credential: Credential,
    /// When the credential was last written, RFC 3339. Informational only;
    /// expiry is the server's judgment, observed via authorization failures.
    saved_at: String,
}

/// Durable holder for the current credential.
///
/// A store has a single logical writer at a time: login, a committed
/// refresh, or logout/session teardown.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the current credential, if any.
    async fn load(&self) -> Result<Option<Credential>>;

    /// Overwrite the current credential.
    async fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove the current credential.
    async fn clear(&self) -> Result<()>;
}

/// File-backed credential store with an in-memory read cache.
pub struct FileCredentialStore {
    path: PathBuf,
    cached: RwLock<Option<Credential>>,
}

impl FileCredentialStore {
    /// Create a store writing `credential.json` inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CREDENTIAL_FILE),
            cached: RwLock::new(None),
        }
    }

    /// Create a store with a custom file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        {
            let cache = self.cached.read().await;
            if cache.is_some() {
                return Ok(cache.clone());
            }
        }

        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Store(format!("failed to read credential file: {}", e)))?;

        let persisted: PersistedCredential = serde_json::from_str(&content)
            .map_err(|e| SessionError::Store(format!("failed to parse credential file: {}", e)))?;

        let mut cache = self.cached.write().await;
        *cache = Some(persisted.credential.clone());

        Ok(Some(persisted.credential))
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SessionError::Store(format!("failed to create credential directory: {}", e))
            })?;
        }

        let persisted = PersistedCredential {
            credential: credential.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };

        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| SessionError::Store(format!("failed to serialize credential: {}", e)))?;

        std::fs::write(&self.path, json)
            .map_err(|e| SessionError::Store(format!("failed to write credential file: {}", e)))?;

        let mut cache = self.cached.write().await;
        *cache = Some(credential.clone());

        tracing::debug!(path = %self.path.display(), "credential persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                SessionError::Store(format!("failed to delete credential file: {}", e))
            })?;
        }

        let mut cache = self.cached.write().await;
        *cache = None;

        tracing::debug!("credential cleared");
        Ok(())
    }
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.read().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let mut current = self.credential.write().await;
        *current = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut current = self.credential.write().await;
        *current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_debug_never_prints_token() {
        let credential = Credential::new("super-secret");
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());

        assert!(store.load().await.unwrap().is_none());

        store.save(&Credential::new("t1")).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.as_str(), "t1");
    }

    #[tokio::test]
    async fn test_file_store_survives_restart() {
        let temp = tempdir().unwrap();

        let store = FileCredentialStore::new(temp.path());
        store.save(&Credential::new("t1")).await.unwrap();
        drop(store);

        // A fresh instance over the same directory sees the credential.
        let reopened = FileCredentialStore::new(temp.path());
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded.as_str(), "t1");
    }

    #[tokio::test]
    async fn test_file_store_overwrites() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());

        store.save(&Credential::new("t1")).await.unwrap();
        store.save(&Credential::new("t2")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.as_str(), "t2");
    }

    #[tokio::test]
    async fn test_file_store_clear() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());

        store.save(&Credential::new("t1")).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(!store.path().exists());

        // Clearing an already-empty store is not an error.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&Credential::new("t1")).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().as_str(), "t1");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
