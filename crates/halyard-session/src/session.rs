//! Session lifecycle facade.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::store::{Credential, CredentialStore};

/// Login/logout surface over the credential store.
///
/// The credential is created here on login, overwritten by the refresh
/// coordinator on renewal, and deleted here on logout (or by the
/// coordinator on an unrecoverable refresh failure).
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Store the credential obtained from a completed login.
    pub async fn login(&self, credential: Credential) -> Result<()> {
        self.store.save(&credential).await?;
        info!("session established");
        Ok(())
    }

    /// Drop the credential, ending the session.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        info!("session ended");
        Ok(())
    }

    /// Whether a credential is currently held.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.store.load().await, Ok(Some(_)))
    }

    /// The current credential, if any.
    pub async fn credential(&self) -> Result<Option<Credential>> {
        self.store.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;

    #[tokio::test]
    async fn test_login_logout() {
        let manager = SessionManager::new(Arc::new(MemoryCredentialStore::new()));
        assert!(!manager.is_authenticated().await);

        manager.login(Credential::new("t1")).await.unwrap();
        assert!(manager.is_authenticated().await);
        assert_eq!(
            manager.credential().await.unwrap().unwrap().as_str(),
            "t1"
        );

        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated().await);
    }
}
