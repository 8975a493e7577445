//! HTTP client for the Halyard API.
//!
//! A drop-in transport for the embedding application: every outbound call
//! gets the current bearer credential attached, and an expired credential
//! is renewed transparently. When many concurrent requests fail
//! authorization at once, exactly one renewal call is issued; the failed
//! requests wait on it and are each replayed once with the fresh
//! credential. Callers only ever see the final resolved value or a
//! terminal error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use halyard_client::Client;
//! use halyard_session::{Credential, FileCredentialStore, SessionManager};
//!
//! # async fn example() -> halyard_client::Result<()> {
//! let store = Arc::new(FileCredentialStore::new(std::path::Path::new("/var/lib/halyard")));
//!
//! let client = Client::builder()
//!     .base_url("https://api.example.com")
//!     .credential_store(store.clone())
//!     .build()?;
//!
//! // After a completed login:
//! let session = SessionManager::new(store);
//! session.login(Credential::new("initial-token")).await?;
//!
//! #[derive(serde::Deserialize)]
//! struct Profile { name: String }
//!
//! // Renewal and replay happen behind this call when the token expires.
//! let profile: Profile = client.get("me/profile").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod request;

pub use client::{Client, ClientBuilder};
pub use error::{Error, Result};
pub use request::ApiRequest;

// Re-export for constructing requests without a direct reqwest dependency.
pub use reqwest::Method;
