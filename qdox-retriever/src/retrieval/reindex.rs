//! Live reindexing driven by filesystem changes.
//!
//! A polling watcher observes the document folder recursively. Its events are
//! filtered by path and pushed into a bounded queue; when the queue is full
//! further events are dropped and counted. A single coordinator task drains
//! the queue and, for each burst of changes, reloads the whole folder, fits a
//! fresh pipeline and hands the resulting [`ModelSnapshot`] to a publish
//! callback. Because every reload rereads the full directory, a dropped event
//! only delays an update until the next event arrives.
//!
//! ```text
//! PollWatcher → debouncer → EventForwarder ─(bounded mpsc)→ ReindexLoop
//!                                                             │
//!                          Scanning → Training → Publishing → on_snapshot
//! ```

use super::corpus::{Corpus, PathFilter};
use super::snapshot::ModelSnapshot;
use crate::error::{Result, RetrieverError};
use notify::{PollWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer_opt};
use qdox_lsi::{LsiConfig, LsiPipeline};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Callback receiving every newly built snapshot
pub type SnapshotCallback = Arc<dyn Fn(Arc<ModelSnapshot>) + Send + Sync>;

/// Where the coordinator is in its reindex cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorState {
    /// Waiting for a change event
    Idle,
    /// Reloading the corpus from disk
    Scanning,
    /// Fitting the pipeline on the reloaded corpus
    Training,
    /// Handing the new snapshot to the publish callback
    Publishing,
    /// The loop has exited and the watcher is released or about to be
    Stopped,
}

impl std::fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::Scanning => "scanning",
            CoordinatorState::Training => "training",
            CoordinatorState::Publishing => "publishing",
            CoordinatorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Configuration for the reindex coordinator
#[derive(Clone)]
pub struct ReindexConfig {
    /// Folder to watch and reload
    pub root: PathBuf,
    /// Only paths accepted by this predicate trigger reloads or get indexed
    pub filter: PathFilter,
    /// How often the polling watcher rescans the folder
    pub poll_interval: Duration,
    /// Window over which raw watcher events are coalesced
    pub debounce: Duration,
    /// Capacity of the event queue between the watcher and the coordinator
    pub max_pending_events: usize,
    /// Pipeline configuration used for every refit
    pub lsi: LsiConfig,
    /// Generation number given to the first snapshot this coordinator builds
    pub first_generation: u64,
}

impl std::fmt::Debug for ReindexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReindexConfig")
            .field("root", &self.root)
            .field("poll_interval", &self.poll_interval)
            .field("debounce", &self.debounce)
            .field("max_pending_events", &self.max_pending_events)
            .field("lsi", &self.lsi)
            .field("first_generation", &self.first_generation)
            .finish_non_exhaustive()
    }
}

impl ReindexConfig {
    /// Create a configuration with defaults: 1s polling, 250ms debounce,
    /// 10 pending events, default pipeline, first generation 1.
    pub fn new(root: impl Into<PathBuf>, filter: PathFilter) -> Self {
        Self {
            root: root.into(),
            filter,
            poll_interval: Duration::from_millis(1000),
            debounce: Duration::from_millis(250),
            max_pending_events: 10,
            lsi: LsiConfig::default(),
            first_generation: 1,
        }
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    pub fn with_debounce(self, debounce: Duration) -> Self {
        Self { debounce, ..self }
    }

    /// Set the event queue capacity; zero is raised to one
    pub fn with_max_pending_events(self, max_pending_events: usize) -> Self {
        Self {
            max_pending_events: max_pending_events.max(1),
            ..self
        }
    }

    pub fn with_lsi_config(self, lsi: LsiConfig) -> Self {
        Self { lsi, ..self }
    }

    pub fn with_first_generation(self, first_generation: u64) -> Self {
        Self {
            first_generation,
            ..self
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    reloads: AtomicU64,
    failures: AtomicU64,
    dropped_events: AtomicU64,
}

/// Counts of what the coordinator has done since it started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReindexStats {
    /// Snapshots successfully built and published
    pub reloads: u64,
    /// Reload or refit attempts that failed
    pub failures: u64,
    /// Change events discarded because the queue was full
    pub dropped_events: u64,
}

impl Counters {
    fn snapshot(&self) -> ReindexStats {
        ReindexStats {
            reloads: self.reloads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
        }
    }
}

/// Runs on the watcher's thread; filters events and feeds the bounded queue
struct EventForwarder {
    filter: PathFilter,
    events: mpsc::Sender<PathBuf>,
    failures: mpsc::UnboundedSender<notify::Error>,
    counters: Arc<Counters>,
}

impl EventForwarder {
    fn handle(&self, result: DebounceEventResult) {
        match result {
            Ok(events) => self.forward_paths(events.into_iter().map(|event| event.path)),
            Err(err) => self.forward_failure(err),
        }
    }

    fn forward_paths<I: IntoIterator<Item = PathBuf>>(&self, paths: I) {
        for path in paths {
            if path.is_dir() || !(self.filter)(&path) {
                continue;
            }
            match self.events.try_send(path) {
                Ok(()) => {}
                Err(TrySendError::Full(path)) => {
                    self.counters.dropped_events.fetch_add(1, Ordering::Relaxed);
                    debug!("Event queue full, dropping {}", path.display());
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }
    }

    fn forward_failure(&self, err: notify::Error) {
        // The loop may already be gone during shutdown
        let _ = self.failures.send(err);
    }
}

/// Watches a folder and republishes a freshly fitted snapshot on every change.
///
/// The filesystem observation is owned by the coordinator and released by
/// [`stop`](Self::stop) (or on drop).
pub struct ReindexCoordinator {
    root: PathBuf,
    watcher: Option<Debouncer<PollWatcher>>,
    stop_tx: Option<oneshot::Sender<()>>,
    loop_handle: Option<JoinHandle<Result<()>>>,
    state: watch::Receiver<CoordinatorState>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for ReindexCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReindexCoordinator")
            .field("root", &self.root)
            .field("watching", &self.watcher.is_some())
            .field("state", &*self.state.borrow())
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

impl ReindexCoordinator {
    /// Start watching `config.root` and reindexing on change.
    ///
    /// Must be called from within a tokio runtime. The coordinator does not
    /// build an initial snapshot; it reacts to changes only.
    ///
    /// # Errors
    /// [`RetrieverError::WatchSetup`] when the root is inaccessible or the
    /// watcher cannot be created.
    pub async fn start<F>(config: ReindexConfig, on_snapshot: F) -> Result<Self>
    where
        F: Fn(Arc<ModelSnapshot>) + Send + Sync + 'static,
    {
        let root = config.root.clone();
        let setup_error = |source: notify::Error| RetrieverError::WatchSetup {
            path: root.clone(),
            source,
        };

        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| setup_error(notify::Error::io(e)))?;
        if !metadata.is_dir() {
            return Err(setup_error(notify::Error::generic("not a directory")));
        }

        let counters = Arc::new(Counters::default());
        let (events_tx, events_rx) = mpsc::channel(config.max_pending_events.max(1));
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        let forwarder = EventForwarder {
            filter: Arc::clone(&config.filter),
            events: events_tx,
            failures: failures_tx,
            counters: Arc::clone(&counters),
        };

        let debouncer_config = notify_debouncer_mini::Config::default()
            .with_timeout(config.debounce)
            .with_notify_config(notify::Config::default().with_poll_interval(config.poll_interval));
        let mut watcher = new_debouncer_opt::<_, PollWatcher>(
            debouncer_config,
            move |result: DebounceEventResult| forwarder.handle(result),
        )
        .map_err(setup_error)?;
        watcher
            .watcher()
            .watch(&root, RecursiveMode::Recursive)
            .map_err(setup_error)?;

        let (state_tx, state_rx) = watch::channel(CoordinatorState::Idle);
        let (stop_tx, stop_rx) = oneshot::channel();
        let reindex_loop = ReindexLoop {
            generation: config.first_generation,
            config,
            events: events_rx,
            failures: failures_rx,
            state: state_tx,
            counters: Arc::clone(&counters),
            on_snapshot: Arc::new(on_snapshot),
        };
        let loop_handle = tokio::spawn(reindex_loop.run(stop_rx));

        info!("Watching {} for changes", root.display());
        Ok(Self {
            root,
            watcher: Some(watcher),
            stop_tx: Some(stop_tx),
            loop_handle: Some(loop_handle),
            state: state_rx,
            counters,
        })
    }

    /// Stop the loop and release the filesystem observation.
    ///
    /// Waits for an in-progress reindex cycle to finish. Returns the loop's
    /// outcome: an error if it had already stopped on a watcher failure.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        let outcome = match self.loop_handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        };

        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            debug!("Released watch on {}", self.root.display());
        }

        info!("Stopped watching {}", self.root.display());
        outcome
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    /// Receiver observing every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<CoordinatorState> {
        self.state.clone()
    }

    pub fn stats(&self) -> ReindexStats {
        self.counters.snapshot()
    }

    /// Whether the coordinator still holds its filesystem observation
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Whether the loop task is still alive
    pub fn is_running(&self) -> bool {
        self.loop_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// The coordinator task: one reindex cycle per burst of change events
struct ReindexLoop {
    config: ReindexConfig,
    generation: u64,
    events: mpsc::Receiver<PathBuf>,
    failures: mpsc::UnboundedReceiver<notify::Error>,
    state: watch::Sender<CoordinatorState>,
    counters: Arc<Counters>,
    on_snapshot: SnapshotCallback,
}

impl ReindexLoop {
    async fn run(mut self, mut stop: oneshot::Receiver<()>) -> Result<()> {
        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    debug!("Stop requested for {}", self.config.root.display());
                    break Ok(());
                }
                failure = self.failures.recv() => {
                    match failure {
                        Some(err) => {
                            error!("Watcher for {} failed: {}", self.config.root.display(), err);
                            break Err(RetrieverError::watch_runtime(err.to_string()));
                        }
                        None => break Ok(()),
                    }
                }
                event = self.events.recv() => {
                    match event {
                        Some(path) => {
                            let coalesced = self.drain_pending();
                            info!("{} changed ({} more pending), reindexing", path.display(), coalesced);
                            self.reindex().await;
                        }
                        None => break Ok(()),
                    }
                }
            }
        };

        self.set_state(CoordinatorState::Stopped);
        outcome
    }

    /// Discard queued events; the next reload reads the whole folder anyway
    fn drain_pending(&mut self) -> usize {
        let mut drained = 0;
        while self.events.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }

    async fn reindex(&mut self) {
        match self.rebuild().await {
            Ok(snapshot) => {
                self.set_state(CoordinatorState::Publishing);
                (self.on_snapshot)(Arc::new(snapshot));
                self.generation += 1;
                self.counters.reloads.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                let err = RetrieverError::watch_runtime(format!(
                    "reindex of {} failed: {}",
                    self.config.root.display(),
                    err
                ));
                warn!("{}", err);
            }
        }
        self.set_state(CoordinatorState::Idle);
    }

    async fn rebuild(&self) -> Result<ModelSnapshot> {
        self.set_state(CoordinatorState::Scanning);
        let root = self.config.root.clone();
        let filter = Arc::clone(&self.config.filter);
        let corpus =
            tokio::task::spawn_blocking(move || Corpus::load(&root, |path| filter(path))).await??;

        self.set_state(CoordinatorState::Training);
        let lsi = self.config.lsi.clone();
        let (mut corpus, model) = tokio::task::spawn_blocking(move || {
            let model = LsiPipeline::new(lsi).fit(&corpus.contents())?;
            Ok::<_, RetrieverError>((corpus, model))
        })
        .await??;

        corpus.release();
        ModelSnapshot::new(self.generation, corpus, model)
    }

    fn set_state(&self, state: CoordinatorState) {
        self.state.send_replace(state);
        debug!("Coordinator for {} is {}", self.config.root.display(), state);
    }
}
