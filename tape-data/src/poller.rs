//! Snapshot poller
//!
//! Owns the fetch-normalise-publish cycle. State is published through a
//! `tokio::sync::watch` channel, so subscribers only ever see the latest state.
//!
//! Two counters keep publishes consistent:
//! - `attempts` numbers every fetch. A completion is applied only if it is newer
//!   than the last applied one, so a slow stale response cannot overwrite fresher state.
//! - `epoch` is bumped by [`SnapshotPoller::stop`]. A fetch captures the epoch when
//!   it starts and is dropped at publish time if the epoch moved on.
//!
//! Both checks run inside `watch::Sender::send_if_modified`, which holds the
//! channel's write lock, and `stop` bumps the epoch under the same lock. `stop`
//! also holds the task lock while bumping, and `start` reads the epoch under
//! that lock, so a schedule never starts with an epoch that is already stale.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream::FuturesUnordered};
use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::PollError;
use crate::normalize::parse_snapshot;
use crate::snapshot::Snapshot;
use crate::source::{HttpSource, SnapshotSource};

/// State published to subscribers after every cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerState {
    /// Last successfully normalised snapshot, kept across failed cycles
    pub snapshot: Option<Arc<Snapshot>>,
    /// Cause of the most recent failed cycle, cleared by the next success
    pub error: Option<String>,
    /// Wall-clock instant of the last successful publish
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl PollerState {
    /// Check if any snapshot has been published yet
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

struct Shared<S> {
    source: S,
    state_tx: watch::Sender<PollerState>,
    epoch: AtomicU64,
    attempts: AtomicU64,
    applied: AtomicU64,
}

impl<S: SnapshotSource> Shared<S> {
    fn next_attempt(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn fetch(&self) -> Result<Snapshot, PollError> {
        let response = self.source.fetch().await?;
        if !response.is_success() {
            return Err(PollError::Status(response.status));
        }
        parse_snapshot(&response.body)
    }

    /// Apply one completed fetch. Returns true if state was published.
    fn apply(&self, epoch: u64, attempt: u64, result: Result<Snapshot, PollError>) -> bool {
        self.state_tx.send_if_modified(|state| {
            if self.epoch.load(Ordering::Acquire) != epoch {
                debug!(attempt, "Discarding fetch completed after poller stopped");
                return false;
            }
            if attempt <= self.applied.load(Ordering::Relaxed) {
                debug!(attempt, "Discarding stale fetch superseded by a newer one");
                return false;
            }
            self.applied.store(attempt, Ordering::Relaxed);

            match result {
                Ok(snapshot) => {
                    *state = PollerState {
                        snapshot: Some(Arc::new(snapshot)),
                        error: None,
                        last_updated_at: Some(Utc::now()),
                    };
                }
                Err(error) => {
                    warn!(attempt, %error, "Snapshot poll failed, keeping last good snapshot");
                    state.error = Some(error.to_string());
                }
            }
            true
        })
    }
}

/// Periodically fetches snapshots from a [`SnapshotSource`] and publishes [`PollerState`]
pub struct SnapshotPoller<S: SnapshotSource = HttpSource> {
    shared: Arc<Shared<S>>,
    poll_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SnapshotPoller<HttpSource> {
    /// Create a poller that GETs the configured endpoint
    pub fn from_config(config: PollerConfig) -> Self {
        let source = HttpSource::new(&config);
        Self::new(source, config.poll_interval)
    }
}

impl<S: SnapshotSource> SnapshotPoller<S> {
    pub fn new(source: S, poll_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(PollerState::default());
        Self {
            shared: Arc::new(Shared {
                source,
                state_tx,
                epoch: AtomicU64::new(0),
                attempts: AtomicU64::new(0),
                applied: AtomicU64::new(0),
            }),
            poll_interval,
            task: Mutex::new(None),
        }
    }

    /// Fetch immediately, then every `poll_interval`. No-op if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Snapshot poller already running");
            return;
        }

        let epoch = self.shared.epoch.load(Ordering::Acquire);
        info!(interval_ms = self.poll_interval.as_millis() as u64, "Starting snapshot poller");
        *task = Some(tokio::spawn(run_schedule(
            Arc::clone(&self.shared),
            epoch,
            self.poll_interval,
        )));
    }

    /// Cancel the schedule. Fetches still in flight will not publish.
    pub fn stop(&self) {
        let mut task = self.task.lock();
        self.shared.state_tx.send_if_modified(|_| {
            self.shared.epoch.fetch_add(1, Ordering::AcqRel);
            false
        });

        if let Some(handle) = task.take() {
            handle.abort();
            info!("Stopped snapshot poller");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run a single fetch-normalise-publish cycle now.
    ///
    /// Failures are recorded in the published state, never returned.
    pub async fn poll_once(&self) {
        let epoch = self.shared.epoch.load(Ordering::Acquire);
        let attempt = self.shared.next_attempt();
        let result = self.shared.fetch().await;
        self.shared.apply(epoch, attempt, result);
    }

    /// Subscribe to state changes (latest value only)
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.shared.state_tx.subscribe()
    }

    /// Current state
    pub fn state(&self) -> PollerState {
        self.shared.state_tx.borrow().clone()
    }

    /// Invoke `callback` with every published state until the poller is dropped.
    pub fn on_update<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(&PollerState) + Send + 'static,
    {
        let mut state_rx = self.subscribe();
        tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let state = state_rx.borrow_and_update().clone();
                callback(&state);
            }
        })
    }
}

impl<S: SnapshotSource> Drop for SnapshotPoller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Schedule loop: one task, fetches may overlap if the upstream is slower than the period
async fn run_schedule<S: SnapshotSource>(shared: Arc<Shared<S>>, epoch: u64, period: Duration) {
    let mut timer = tokio::time::interval(period.max(Duration::from_millis(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight = FuturesUnordered::new();

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let attempt = shared.next_attempt();
                let cycle = Arc::clone(&shared);
                in_flight.push(async move { (attempt, cycle.fetch().await) });
                if in_flight.len() > 1 {
                    debug!(in_flight = in_flight.len(), "Previous snapshot fetch still pending");
                }
            }
            Some((attempt, result)) = in_flight.next(), if !in_flight.is_empty() => {
                shared.apply(epoch, attempt, result);
            }
        }
    }
}
