// crates/tracker/src/elapsed.rs
//! Live elapsed-time derivation for the tracked job.
//!
//! An independent 1 s ticker that reads the job store and publishes
//! `now - started_at` (clamped to >= 0). The wall-clock offset is taken
//! once when a job is first observed; from there elapsed advances on the
//! runtime clock, so a reconciled job that started a minute ago shows a
//! minute immediately and keeps counting.

use std::time::Duration;

use story_inbox_types::Job;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::store::JobStore;

/// Published once per second while a job is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    /// Whole seconds since the tracked job started. Zero when no job is
    /// tracked.
    pub seconds: u64,
    /// Advisory: the job is still `running` past the stalled threshold.
    /// Changes the message shown, never the polling schedule.
    pub stalled: bool,
}

/// `mm:ss`, zero-padded; minutes keep growing past an hour.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Advisory status line for a running job.
pub fn running_advisory(stalled: bool) -> &'static str {
    if stalled {
        "Still working... this is taking longer than usual. You can run in background and continue reviewing the Queue."
    } else {
        "We're fetching and processing new items. This can take a minute."
    }
}

/// Elapsed basis for one observed job id.
struct Basis {
    job_id: String,
    /// Seconds already elapsed when the job was first observed.
    initial: u64,
    observed_at: Instant,
}

impl Basis {
    fn establish(job: &Job) -> Self {
        // A started_at that fails to parse degrades to "started just now"
        // rather than an invalid duration.
        let initial = match job.started_at_utc() {
            Some(started) => (chrono::Utc::now() - started).num_seconds().max(0) as u64,
            None => {
                debug!(job_id = %job.job_id, started_at = %job.started_at, "unparseable started_at; elapsed starts at zero");
                0
            }
        };
        Self {
            job_id: job.job_id.clone(),
            initial,
            observed_at: Instant::now(),
        }
    }

    fn seconds(&self) -> u64 {
        self.initial + self.observed_at.elapsed().as_secs()
    }
}

/// Spawn the clock task. The returned receiver always holds the latest
/// [`Elapsed`]; it resets to zero the moment the store is cleared and
/// re-bases when the tracked job id changes.
pub(crate) fn spawn_clock(
    store: &JobStore,
    config: TrackerConfig,
    cancel: CancellationToken,
) -> watch::Receiver<Elapsed> {
    let (tx, rx) = watch::channel(Elapsed::default());
    let mut records = store.subscribe();
    let stalled_after = config.stalled_after.as_secs();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut basis: Option<Basis> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = records.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = ticker.tick() => {}
            }

            let job = records.borrow().clone();
            let next = match job {
                None => {
                    basis = None;
                    Elapsed::default()
                }
                Some(job) => {
                    let rebase = basis
                        .as_ref()
                        .map(|b| b.job_id != job.job_id)
                        .unwrap_or(true);
                    if rebase {
                        basis = Some(Basis::establish(&job));
                    }
                    let seconds = basis.as_ref().map(Basis::seconds).unwrap_or(0);
                    Elapsed {
                        seconds,
                        stalled: job.is_running() && seconds >= stalled_after,
                    }
                }
            };

            tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        }
    });

    rx
}
