//! Activity-gated proactive renewal.
//!
//! [`ActivityMonitor`] runs a periodic tick. While the user has interacted
//! within the trailing activity window, each tick proactively renews the
//! credential through the coordinator's single-flight guard; once the user
//! has gone quiet the ticks are skipped and the session is left to expire.
//!
//! The embedding UI feeds interaction events (pointer movement, key press,
//! click, scroll) into the monitor's [`ActivityTracker`] handle. Dropping
//! the monitor aborts the tick task; tracker handles still accept events
//! afterwards but no longer have any effect.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::coordinator::RefreshCoordinator;

/// Default interval between renewal ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Default trailing window within which the user counts as active.
pub const DEFAULT_ACTIVITY_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Timing configuration for the monitor.
#[derive(Debug, Clone)]
pub struct ActivityConfig {
    /// Interval between renewal ticks. Must be non-zero.
    pub tick_interval: Duration,
    /// A tick renews only if the last interaction is strictly more recent
    /// than this window.
    pub activity_window: Duration,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            activity_window: DEFAULT_ACTIVITY_WINDOW,
        }
    }
}

/// The interaction kinds that count as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

impl Interaction {
    /// Every interaction kind the monitor listens for, for embedders
    /// wiring up one listener per event source.
    pub const ALL: [Interaction; 4] = [
        Interaction::PointerMove,
        Interaction::KeyPress,
        Interaction::Click,
        Interaction::Scroll,
    ];
}

/// Handle the embedding UI records interactions into.
///
/// Cheap to clone; all clones update the same timestamp.
#[derive(Clone)]
pub struct ActivityTracker {
    last_activity: Arc<Mutex<Instant>>,
}

impl ActivityTracker {
    fn new() -> Self {
        Self {
            last_activity: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Record a qualifying interaction.
    pub fn record(&self, interaction: Interaction) {
        *self.last_activity.lock() = Instant::now();
        debug!(?interaction, "activity recorded");
    }

    /// Time elapsed since the last recorded interaction.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }
}

/// Periodic proactive-renewal task.
pub struct ActivityMonitor {
    tracker: ActivityTracker,
    task: tokio::task::JoinHandle<()>,
}

impl ActivityMonitor {
    /// Spawn the monitor. The tick task and the tracker start together;
    /// the last-activity timestamp is initialized to now.
    pub fn spawn(coordinator: RefreshCoordinator, config: ActivityConfig) -> Self {
        let tracker = ActivityTracker::new();
        let tick_tracker = tracker.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.tick_interval);
            // The interval's first tick completes immediately; the first
            // renewal check belongs one full interval out.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let idle = tick_tracker.idle_for();
                if idle < config.activity_window {
                    debug!(idle_secs = idle.as_secs(), "user active, renewing credential");
                    if !coordinator.renew_if_idle() {
                        debug!("refresh already in flight, tick folded into it");
                    }
                } else {
                    debug!(idle_secs = idle.as_secs(), "user inactive, skipping renewal tick");
                }
            }
        });

        Self { tracker, task }
    }

    /// A tracker handle for wiring up interaction listeners.
    pub fn tracker(&self) -> ActivityTracker {
        self.tracker.clone()
    }

    /// Whether the tick task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the tick task. Also happens on drop.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::coordinator::NoopNavigator;
    use crate::error::Result;
    use crate::renew::RenewalClient;
    use crate::store::{Credential, CredentialStore, MemoryCredentialStore};

    struct CountingRenewer {
        calls: AtomicUsize,
    }

    impl CountingRenewer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenewalClient for CountingRenewer {
        async fn renew(&self, _current: &Credential) -> Result<Credential> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credential::new(format!("t{}", n + 2)))
        }
    }

    struct Fixture {
        store: Arc<MemoryCredentialStore>,
        renewer: Arc<CountingRenewer>,
        coordinator: RefreshCoordinator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("t1")));
        let renewer = Arc::new(CountingRenewer::new());
        let coordinator =
            RefreshCoordinator::new(store.clone(), renewer.clone(), Arc::new(NoopNavigator));
        Fixture {
            store,
            renewer,
            coordinator,
        }
    }

    const TICK: Duration = Duration::from_secs(15 * 60);
    const WINDOW: Duration = Duration::from_secs(30 * 60);

    fn config() -> ActivityConfig {
        ActivityConfig {
            tick_interval: TICK,
            activity_window: WINDOW,
        }
    }

    /// Lets the monitor task and any renewal flight it started settle.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_renews_while_active_then_skips_when_idle() {
        let f = fixture();
        let _monitor = ActivityMonitor::spawn(f.coordinator.clone(), config());

        // t = 15 min: idle 15 min < 30 min, renewal fires.
        tokio::time::sleep(TICK).await;
        settle().await;
        assert_eq!(f.renewer.calls(), 1);
        assert_eq!(f.store.load().await.unwrap().unwrap().as_str(), "t2");

        // t = 30 min: idle is the full window, not strictly inside it.
        tokio::time::sleep(TICK).await;
        settle().await;
        assert_eq!(f.renewer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorded_activity_extends_the_window() {
        let f = fixture();
        let monitor = ActivityMonitor::spawn(f.coordinator.clone(), config());
        let tracker = monitor.tracker();

        tokio::time::sleep(TICK).await;
        settle().await;
        assert_eq!(f.renewer.calls(), 1);

        // Interaction at t = 29 min keeps the t = 30 min tick alive.
        tokio::time::sleep(Duration::from_secs(14 * 60)).await;
        tracker.record(Interaction::Click);
        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(f.renewer.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_timer() {
        let f = fixture();
        let monitor = ActivityMonitor::spawn(f.coordinator.clone(), config());
        assert!(monitor.is_running());

        monitor.shutdown();
        settle().await;
        assert!(!monitor.is_running());

        tokio::time::sleep(WINDOW + TICK).await;
        settle().await;
        assert_eq!(f.renewer.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_timer() {
        let f = fixture();
        let monitor = ActivityMonitor::spawn(f.coordinator.clone(), config());
        drop(monitor);

        tokio::time::sleep(WINDOW + TICK).await;
        settle().await;
        assert_eq!(f.renewer.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracker_idle_time() {
        let f = fixture();
        let monitor = ActivityMonitor::spawn(f.coordinator.clone(), config());
        let tracker = monitor.tracker();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(tracker.idle_for() >= Duration::from_secs(5));

        tracker.record(Interaction::PointerMove);
        assert!(tracker.idle_for() < Duration::from_secs(1));
    }
}
