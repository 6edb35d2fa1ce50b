//! The polling view model shared by every page.
//!
//! A [`Feed`] knows how to fetch one snapshot and where it is cached. A
//! [`ViewModel`] wraps a feed with the displayed state:
//!
//! - on mount it seeds from the cache (or the snapshot's default)
//! - a successful cycle replaces the state and then overwrites the cache
//! - a failed cycle is logged and leaves both untouched
//! - outcomes older than the last applied cycle are ignored
//!
//! [`start_polling`] drives a view model on a fixed interval and returns a
//! [`PollHandle`]; stopping or dropping the handle ends the timer, and any
//! cycle still in flight is discarded when it lands.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKey, ClientCache};
use crate::error::FetchError;

// ---

/// One endpoint (or group of endpoints) feeding a page.
#[async_trait]
pub trait Feed: Send + Sync + 'static {
    type Snapshot: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Where the last-known-good snapshot lives
    fn cache_key(&self) -> CacheKey;

    /// Fetch and map one fresh snapshot
    async fn fetch(&self) -> Result<Self::Snapshot, FetchError>;

    /// Adjust the displayed state after a failed cycle. The cache is never
    /// touched on failure. Default: leave everything as it was.
    fn on_failure(&self, _displayed: &mut Self::Snapshot, _err: &FetchError) {}
}

/// Freshness metadata shown next to a page's data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedStatus {
    /// True once the state came from the cache or a successful fetch
    pub has_data: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Displayed<S> {
    snapshot: S,
    applied_cycle: u64,
    status: FeedStatus,
}

/// Displayed state of one page plus the feed that refreshes it.
pub struct ViewModel<F: Feed> {
    feed: F,
    cache: ClientCache,
    state: RwLock<Displayed<F::Snapshot>>,
    cycles: AtomicU64,
    /// Newest cycle whose snapshot reached the cache
    persisted: Mutex<u64>,
}

impl<F: Feed> std::fmt::Debug for ViewModel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewModel")
            .field("feed", &self.feed.name())
            .field("cycles", &self.cycles.load(Ordering::SeqCst))
            .finish()
    }
}

impl<F: Feed> ViewModel<F> {
    /// Build the view model, seeding state from the cache when present.
    pub fn mount(feed: F, cache: ClientCache) -> Arc<Self> {
        // ---
        let cached: Option<F::Snapshot> = cache.get(feed.cache_key());
        let has_data = cached.is_some();
        tracing::debug!(
            "Mounting '{}' from {}",
            feed.name(),
            if has_data { "cache" } else { "defaults" }
        );

        Arc::new(Self {
            state: RwLock::new(Displayed {
                snapshot: cached.unwrap_or_default(),
                applied_cycle: 0,
                status: FeedStatus {
                    has_data,
                    ..FeedStatus::default()
                },
            }),
            feed,
            cache,
            cycles: AtomicU64::new(0),
            persisted: Mutex::new(0),
        })
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Copy of the currently displayed snapshot.
    pub fn snapshot(&self) -> F::Snapshot {
        self.read().snapshot.clone()
    }

    pub fn status(&self) -> FeedStatus {
        self.read().status.clone()
    }

    /// Run one fetch cycle to completion and apply it.
    ///
    /// Returns true if the displayed state was replaced.
    pub async fn refresh(&self) -> bool {
        let cycle = self.begin_cycle();
        let result = self.feed.fetch().await;
        self.complete(cycle, result)
    }

    /// Reserve a sequence number for a cycle that is about to fetch.
    pub(crate) fn begin_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply the outcome of cycle `cycle`.
    ///
    /// An outcome older than one already applied is dropped, so a slow
    /// response or a late timeout can never roll the display back.
    pub(crate) fn complete(&self, cycle: u64, result: Result<F::Snapshot, FetchError>) -> bool {
        // ---
        match result {
            Ok(snapshot) => {
                let fresh = {
                    let mut state = self.write();
                    if cycle <= state.applied_cycle {
                        tracing::debug!(
                            "'{}' cycle {} superseded by cycle {}, discarding",
                            self.feed.name(),
                            cycle,
                            state.applied_cycle
                        );
                        return false;
                    }

                    state.snapshot = snapshot;
                    state.applied_cycle = cycle;
                    state.status = FeedStatus {
                        has_data: true,
                        last_success: Some(Utc::now()),
                        last_error: None,
                    };
                    state.snapshot.clone()
                };

                self.persist(cycle, &fresh);
                true
            }
            Err(e) => {
                let mut state = self.write();
                if cycle <= state.applied_cycle {
                    tracing::debug!(
                        "'{}' cycle {} failed after cycle {} succeeded, ignoring: {}",
                        self.feed.name(),
                        cycle,
                        state.applied_cycle,
                        e
                    );
                    return false;
                }

                match &e {
                    FetchError::NoData(_) => tracing::debug!("'{}': {}", self.feed.name(), e),
                    _ => tracing::warn!("Failed to fetch '{}': {}", self.feed.name(), e),
                }
                self.feed.on_failure(&mut state.snapshot, &e);
                state.status.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Write `snapshot` to the cache unless a newer cycle already has.
    ///
    /// Runs outside the display lock so readers never wait on disk I/O.
    fn persist(&self, cycle: u64, snapshot: &F::Snapshot) {
        // ---
        let mut written = self.persisted.lock().unwrap_or_else(|p| p.into_inner());
        if cycle <= *written {
            return;
        }
        match self.cache.set(self.feed.cache_key(), snapshot) {
            Ok(()) => *written = cycle,
            Err(e) => tracing::warn!("Failed to cache '{}': {}", self.feed.name(), e),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Displayed<F::Snapshot>> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Displayed<F::Snapshot>> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}

/// Running poll timer for one view model.
///
/// Dropping the handle cancels the timer as well; `stop` additionally waits
/// for the timer task to exit.
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancel the timer and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Poll task for '{}' ended abnormally: {}", self.name, e);
            }
        }
        tracing::debug!("Stopped polling '{}'", self.name);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Poll `vm` immediately and then every `interval` until the handle stops.
///
/// Every tick spawns its own cycle: a slow or failed fetch never delays the
/// next tick, and nothing is queued or retried beyond the next tick.
pub fn start_polling<F: Feed>(vm: Arc<ViewModel<F>>, interval: Duration) -> PollHandle {
    // ---
    let name = vm.feed().name();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tracing::info!("Polling '{}' every {:?}", name, interval);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let vm = Arc::clone(&vm);
                    let token = token.clone();
                    tokio::spawn(async move {
                        let cycle = vm.begin_cycle();
                        let result = vm.feed().fetch().await;
                        if token.is_cancelled() {
                            tracing::debug!("'{}' cycle {} landed after stop, discarding", name, cycle);
                            return;
                        }
                        vm.complete(cycle, result);
                    });
                }
            }
        }
    });

    PollHandle {
        name,
        cancel,
        task: Some(task),
    }
}
