// crates/tracker/src/poller.rs
//! Status polling loop for one job id.
//!
//! One poller task owns one `job_id` from spawn until the job's status is
//! terminal or the poller is superseded. Fetches are strictly serialized:
//! the next attempt is scheduled only after the previous one resolves, so
//! writes to the store can never arrive out of order. Every write carries
//! the generation the poller was spawned with; a rejected write means a
//! newer job took over and the poller exits without touching anything.

use std::sync::Arc;

use chrono::Utc;
use story_inbox_api::IngestApi;
use story_inbox_types::{Job, JobStatus};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::events::TrackerEvent;
use crate::focus::StatusSurface;
use crate::store::{Generation, JobStore};

/// Error recorded when the backend stops recognizing the job id.
pub(crate) const STATUS_UNAVAILABLE: &str =
    "Ingestion status is no longer available. Please retry.";

/// A job id paired with the store generation its writes belong to.
pub(crate) struct PollTarget {
    pub generation: Generation,
    pub job_id: String,
}

/// Spawn a poller that tracks `target` until terminal.
pub(crate) fn spawn(
    api: Arc<dyn IngestApi>,
    store: Arc<JobStore>,
    surface: Arc<StatusSurface>,
    events: broadcast::Sender<TrackerEvent>,
    config: TrackerConfig,
    target: PollTarget,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let PollTarget { generation, job_id } = target;
        let mut attempts: u32 = 0;

        loop {
            // First attempt fires immediately; later iterations arrive
            // here after the scheduled delay below.
            let fetched = tokio::select! {
                _ = cancel.cancelled() => return,
                result = api.job_status(&job_id) => result,
            };
            attempts += 1;

            // A resolution that lands after cancellation is stale and
            // must never reach the store.
            if cancel.is_cancelled() {
                return;
            }

            let delay = match fetched {
                Ok(job) => {
                    let status = job.status;
                    let inserted = job.inserted.unwrap_or(0);
                    let skipped = job.skipped.unwrap_or(0);
                    let error = job.error.clone();

                    if !store.apply(generation, job) {
                        // Superseded (or the record already went terminal
                        // through another path); nothing more to do.
                        debug!(job_id = %job_id, "poll result discarded, job superseded");
                        return;
                    }

                    match status {
                        JobStatus::Completed => {
                            info!(job_id = %job_id, inserted, skipped, attempts, "ingestion completed");
                            let _ = events.send(TrackerEvent::Completed {
                                job_id: job_id.clone(),
                                inserted,
                                skipped,
                            });
                            return;
                        }
                        JobStatus::Failed => {
                            let error = error
                                .unwrap_or_else(|| "Ingestion failed unexpectedly.".to_string());
                            info!(job_id = %job_id, error = %error, "ingestion failed");
                            surface.present();
                            let _ = events.send(TrackerEvent::Failed {
                                job_id: job_id.clone(),
                                error,
                            });
                            return;
                        }
                        JobStatus::Running => config.poll_delay(attempts),
                    }
                }
                Err(e) if e.is_not_found() => {
                    // The backend lost track of the id; tracking cannot
                    // continue. Promote to a terminal failure, keeping
                    // the started_at the user has been watching.
                    warn!(job_id = %job_id, attempts, "job vanished from backend");
                    let started_at = store
                        .snapshot()
                        .filter(|held| held.job_id == job_id)
                        .map(|held| held.started_at)
                        .unwrap_or_else(|| Utc::now().to_rfc3339());
                    let mut job = Job::running(job_id.clone(), started_at);
                    job.status = JobStatus::Failed;
                    job.completed_at = Some(Utc::now().to_rfc3339());
                    job.error = Some(STATUS_UNAVAILABLE.to_string());
                    job.message = Some("Ingestion failed.".to_string());

                    if store.apply(generation, job) {
                        surface.present();
                        let _ = events.send(TrackerEvent::Failed {
                            job_id: job_id.clone(),
                            error: STATUS_UNAVAILABLE.to_string(),
                        });
                    }
                    return;
                }
                Err(e) => {
                    // Transient: indistinguishable from a slow job as far
                    // as the user is concerned. Retry on a fixed delay.
                    warn!(job_id = %job_id, attempts, error = %e, "status fetch failed, will retry");
                    config.transient_retry
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    })
}
