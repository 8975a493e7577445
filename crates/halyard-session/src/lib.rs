//! Bearer-credential lifecycle for the Halyard client.
//!
//! The remote API authenticates every call with a short-lived bearer
//! credential. This crate keeps that credential valid without corrupting
//! in-flight traffic: when it expires and many requests fail at once, the
//! credential is refreshed exactly once, the failed requests wait on that
//! one refresh, and all of them observe its outcome. A background monitor
//! renews the credential proactively while the user is active.
//!
//! # Components
//!
//! - [`store`] — opaque [`Credential`] and its durable/in-memory stores
//! - [`renew`] — the physical renewal call against the fixed endpoint
//! - [`coordinator`] — single-flight refresh with a pending-request queue
//! - [`activity`] — interaction tracking and the periodic renewal tick
//! - [`session`] — login/logout facade over the store

pub mod activity;
pub mod coordinator;
pub mod error;
pub mod renew;
pub mod session;
pub mod store;

pub use activity::{
    ActivityConfig, ActivityMonitor, ActivityTracker, Interaction, DEFAULT_ACTIVITY_WINDOW,
    DEFAULT_TICK_INTERVAL,
};
pub use coordinator::{
    LoginNavigator, NoopNavigator, RefreshCoordinator, RefreshOutcome, RefreshState,
};
pub use error::{Result, SessionError};
pub use renew::{HttpRenewalClient, RenewalClient, DEFAULT_RENEWAL_TIMEOUT, RENEWAL_PATH};
pub use session::SessionManager;
pub use store::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
