// crates/tracker/src/tracker.rs
//! The owning controller for one job-tracking session.
//!
//! `IngestTracker` holds the store, the status surface, the elapsed
//! clock, and whichever poller currently owns the tracked job id. Every
//! timer and in-flight request it starts is tied to a cancellation token
//! or a store generation, so superseding or tearing the controller down
//! can never leave a task that still writes.

use std::sync::{Arc, Mutex};

use story_inbox_api::IngestApi;
use story_inbox_types::{IngestConfig, Job};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::elapsed::{spawn_clock, Elapsed};
use crate::events::TrackerEvent;
use crate::focus::StatusSurface;
use crate::launcher::{self, LOCAL_ID_PREFIX};
use crate::poller::{self, PollTarget};
use crate::reconcile;
use crate::store::JobStore;

/// Lifecycle of the tracked session.
///
/// `Starting` covers the window where an optimistic record exists but no
/// backend id has been bound yet; a launch failure leaves that record
/// terminal, so `Failed` also covers jobs that never reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
}

pub(crate) fn phase_of(snapshot: Option<&Job>) -> Phase {
    match snapshot {
        None => Phase::Idle,
        Some(job) => match job.status {
            story_inbox_types::JobStatus::Completed => Phase::Completed,
            story_inbox_types::JobStatus::Failed => Phase::Failed,
            story_inbox_types::JobStatus::Running => {
                if job.job_id.starts_with(LOCAL_ID_PREFIX) {
                    Phase::Starting
                } else {
                    Phase::Running
                }
            }
        },
    }
}

/// Focus order of the status surface, covering every view's controls.
const SURFACE_FOCUSABLES: &[&str] = &[
    "run-in-background",
    "retry",
    "copy-error-details",
    "refresh-queue",
    "dismiss",
];

/// Cancellation scope of the currently spawned poller. The task itself
/// detaches; every write it could still make is generation-guarded.
struct PollerHandle {
    cancel: CancellationToken,
}

/// Asynchronous lifecycle controller for ingestion jobs.
pub struct IngestTracker {
    api: Arc<dyn IngestApi>,
    config: TrackerConfig,
    store: Arc<JobStore>,
    surface: Arc<StatusSurface>,
    events: broadcast::Sender<TrackerEvent>,
    elapsed: watch::Receiver<Elapsed>,
    root: CancellationToken,
    poller: Mutex<Option<PollerHandle>>,
}

impl IngestTracker {
    /// Build a controller and spawn its elapsed clock. Must run inside a
    /// Tokio runtime.
    pub fn new(api: Arc<dyn IngestApi>, config: TrackerConfig) -> Self {
        let store = Arc::new(JobStore::new());
        let root = CancellationToken::new();
        let elapsed = spawn_clock(&store, config, root.child_token());
        Self {
            api,
            config,
            store,
            surface: Arc::new(StatusSurface::new(
                SURFACE_FOCUSABLES.iter().map(|s| s.to_string()).collect(),
            )),
            events: broadcast::channel(32).0,
            elapsed,
            root,
            poller: Mutex::new(None),
        }
    }

    // -- Observation ----------------------------------------------------------

    pub fn snapshot(&self) -> Option<Job> {
        self.store.snapshot()
    }

    pub fn phase(&self) -> Phase {
        phase_of(self.store.snapshot().as_ref())
    }

    /// Latest record, live. Readers never mutate the store.
    pub fn subscribe_records(&self) -> watch::Receiver<Option<Job>> {
        self.store.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Live elapsed-seconds value for the tracked job.
    pub fn elapsed(&self) -> watch::Receiver<Elapsed> {
        self.elapsed.clone()
    }

    pub fn surface(&self) -> &StatusSurface {
        &self.surface
    }

    /// Outside-dismissal of the status surface, gated on the tracked job
    /// not being `running`. Returns whether the surface closed.
    pub fn dismiss_surface_from_outside(&self) -> bool {
        let running = self
            .store
            .snapshot()
            .map(|job| job.is_running())
            .unwrap_or(false);
        self.surface.dismiss_from_outside(running)
    }

    // -- Operations -----------------------------------------------------------

    /// Start an ingestion run. With `config = None` the backend's saved
    /// settings seed the launch (falling back to built-in defaults when
    /// unavailable).
    pub async fn start(&self, config: Option<IngestConfig>) {
        let config = match config {
            Some(config) => config,
            None => self.seed_config().await,
        };

        // Superseding: the previous job's poller must stop scheduling,
        // and its in-flight results are invalidated by the adoption below.
        self.cancel_poller();
        self.surface.present();

        if let Some(target) = launcher::launch(&self.api, &self.store, &self.events, config).await
        {
            self.spawn_poller(target);
        }
    }

    /// Explicit retry after a failure: a fresh start (new `job_id`) with
    /// the failed run's configuration when it carried one, discarding the
    /// failed record.
    pub async fn retry(&self) {
        let config = self.store.snapshot().and_then(|job| {
            Some(IngestConfig {
                cluster_similarity_threshold: job.cluster_similarity_threshold?,
                cluster_time_window_days: job.cluster_time_window_days?,
            })
        });
        self.start(config).await;
    }

    /// Session-start reconciliation: adopt the backend's current job and
    /// resume polling when it is still running.
    pub async fn reconcile(&self) {
        if let Some(target) = reconcile::reconcile(&self.api, &self.store).await {
            self.surface.present();
            self.spawn_poller(target);
        }
    }

    /// Explicitly drop the tracked record. Stops polling, closes the
    /// surface, and resets elapsed to zero.
    pub fn clear(&self) {
        self.cancel_poller();
        self.store.clear();
        self.surface.dismiss();
    }

    /// Tear the controller down: all of its tasks stop and any result
    /// still in flight is discarded.
    pub fn shutdown(&self) {
        self.cancel_poller();
        self.root.cancel();
    }

    // -- Internals ------------------------------------------------------------

    async fn seed_config(&self) -> IngestConfig {
        match self.api.ingest_settings().await {
            Ok(settings) => settings.into(),
            Err(e) => {
                debug!(error = %e, "ingest settings unavailable, using defaults");
                IngestConfig::default()
            }
        }
    }

    fn spawn_poller(&self, target: PollTarget) {
        let cancel = self.root.child_token();
        let _ = poller::spawn(
            self.api.clone(),
            self.store.clone(),
            self.surface.clone(),
            self.events.clone(),
            self.config,
            target,
            cancel.clone(),
        );
        let mut slot = self.poller.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = slot.replace(PollerHandle { cancel }) {
            previous.cancel.cancel();
        }
    }

    fn cancel_poller(&self) {
        if let Some(handle) = self.poller.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take() {
            handle.cancel.cancel();
        }
    }
}

impl Drop for IngestTracker {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
