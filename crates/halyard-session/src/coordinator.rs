//! Single-flight refresh coordination.
//!
//! [`RefreshCoordinator`] owns the refresh state machine and the queue of
//! requests suspended on the in-flight renewal:
//!
//! - The first authorization failure while idle launches exactly one
//!   physical renewal call; failures arriving while it is airborne enqueue
//!   instead of re-triggering it.
//! - Every queued waiter receives exactly one terminal outcome, and always
//!   the outcome of the cycle it joined.
//! - On success the new credential is committed to the store before any
//!   waiter is resumed, so every replay reads the fresh credential.
//! - On failure the store is cleared, the user is sent to the login view
//!   exactly once, and every waiter is rejected with the renewal error.
//!
//! The physical call runs on a detached task: a caller dropping its
//! suspended future can neither strand the state machine at `Refreshing`
//! nor affect the other waiters. The state mutex is never held across an
//! await point.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::renew::RenewalClient;
use crate::store::{Credential, CredentialStore};

/// Refresh state. Exactly one renewal call is outstanding while
/// `Refreshing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Terminal outcome of a refresh cycle, delivered to every waiter.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Renewal succeeded; the store already holds the new credential.
    Renewed(Credential),
    /// Renewal failed; the session has ended.
    Failed(SessionError),
}

/// Collaborator that switches the UI to the login view.
///
/// The coordinator guards the call with [`is_on_login`](Self::is_on_login),
/// so navigation is a no-op when the login view is already active.
pub trait LoginNavigator: Send + Sync {
    /// Whether the login view is currently active.
    fn is_on_login(&self) -> bool;

    /// Switch to the login view.
    fn navigate_to_login(&self);
}

/// Navigator for headless embeddings: never on the login view, navigation
/// does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl LoginNavigator for NoopNavigator {
    fn is_on_login(&self) -> bool {
        false
    }

    fn navigate_to_login(&self) {}
}

struct Flight {
    state: RefreshState,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

struct Inner {
    flight: Mutex<Flight>,
    store: Arc<dyn CredentialStore>,
    renewer: Arc<dyn RenewalClient>,
    navigator: Arc<dyn LoginNavigator>,
}

/// Coordinates credential renewal across concurrent requests.
///
/// Cheap to clone; all clones share the same state machine.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        renewer: Arc<dyn RenewalClient>,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                flight: Mutex::new(Flight {
                    state: RefreshState::Idle,
                    waiters: Vec::new(),
                }),
                store,
                renewer,
                navigator,
            }),
        }
    }

    /// Current refresh state.
    pub fn state(&self) -> RefreshState {
        self.inner.flight.lock().state
    }

    /// Join or start a refresh cycle and wait for its outcome.
    ///
    /// If a renewal call is already airborne the caller enqueues behind it
    /// and observes that call's outcome; otherwise a new cycle starts. The
    /// caller is resumed only after the outcome is terminal: on
    /// [`RefreshOutcome::Renewed`] the store already holds the new
    /// credential and the request can be replayed.
    pub async fn refresh(&self) -> RefreshOutcome {
        let rx = {
            let mut flight = self.inner.flight.lock();
            let (tx, rx) = oneshot::channel();
            flight.waiters.push(tx);
            match flight.state {
                RefreshState::Idle => {
                    flight.state = RefreshState::Refreshing;
                    let coordinator = self.clone();
                    tokio::spawn(async move { coordinator.run_flight(false).await });
                    debug!("refresh cycle started");
                }
                RefreshState::Refreshing => {
                    debug!("refresh in flight, request queued");
                }
            }
            rx
        };

        rx.await
            .unwrap_or(RefreshOutcome::Failed(SessionError::Interrupted))
    }

    /// Proactive entry point: start a renewal only if no refresh is in
    /// flight. Returns whether a cycle was started.
    ///
    /// Unlike [`refresh`](Self::refresh) this does not wait for the
    /// outcome, and a failure nobody is waiting on is logged without
    /// touching the session; the reactive path deals with a truly expired
    /// credential on the next real request.
    pub fn renew_if_idle(&self) -> bool {
        let mut flight = self.inner.flight.lock();
        if flight.state == RefreshState::Refreshing {
            debug!("refresh already in flight, skipping proactive renewal");
            return false;
        }
        flight.state = RefreshState::Refreshing;
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.run_flight(true).await });
        debug!("proactive renewal started");
        true
    }

    /// Perform one refresh cycle end to end. Runs detached from any caller.
    async fn run_flight(&self, proactive: bool) {
        match self.renew_once().await {
            Ok(credential) => {
                // The store write has committed; resume everyone.
                let waiters = self.settle();
                info!(waiters = waiters.len(), "credential renewed");
                let outcome = RefreshOutcome::Renewed(credential);
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }
            }
            Err(err) => {
                if proactive {
                    let mut flight = self.inner.flight.lock();
                    if flight.waiters.is_empty() {
                        flight.state = RefreshState::Idle;
                        drop(flight);
                        if matches!(err, SessionError::NotAuthenticated) {
                            debug!("no credential to renew");
                        } else {
                            warn!(error = %err, "proactive renewal failed");
                        }
                        return;
                    }
                    // Requests joined this cycle; they must observe its
                    // outcome, so it is handled like a reactive failure.
                }

                // State stays `Refreshing` until the teardown commits, so
                // late arrivals observe this cycle's outcome rather than
                // starting a doomed new one against a cleared store.
                self.end_session().await;
                let waiters = self.settle();
                warn!(error = %err, rejected = waiters.len(), "renewal failed, session ended");
                let outcome = RefreshOutcome::Failed(err);
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }
            }
        }
    }

    /// Reset to `Idle` and take the queue in one lock acquisition, so a
    /// waiter can never land between the drain and the state reset.
    fn settle(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        let mut flight = self.inner.flight.lock();
        flight.state = RefreshState::Idle;
        std::mem::take(&mut flight.waiters)
    }

    async fn renew_once(&self) -> Result<Credential> {
        let current = self
            .inner
            .store
            .load()
            .await?
            .ok_or(SessionError::NotAuthenticated)?;
        let renewed = self.inner.renewer.renew(&current).await?;
        self.inner.store.save(&renewed).await?;
        Ok(renewed)
    }

    async fn end_session(&self) {
        if let Err(e) = self.inner.store.clear().await {
            error!(error = %e, "failed to clear credential store");
        }
        if !self.inner.navigator.is_on_login() {
            self.inner.navigator.navigate_to_login();
        }
    }
}
