// crates/tracker/src/launcher.rs
//! Starting an ingestion run.
//!
//! The launcher seeds an optimistic `running` record before the start
//! call resolves, so observers see the run with zero latency. A launch
//! that fails outright degrades to a terminal `failed` record that exists
//! only locally: no backend job was created, so it is never polled.

use std::sync::Arc;

use chrono::Utc;
use story_inbox_api::IngestApi;
use story_inbox_types::{IngestConfig, Job, JobStatus};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::TrackerEvent;
use crate::poller::PollTarget;
use crate::store::JobStore;

/// Prefix of synthetic job ids minted locally, before (or instead of) a
/// backend-assigned id.
pub(crate) const LOCAL_ID_PREFIX: &str = "local-";

/// Start an ingestion run with `config`.
///
/// Returns `None` when there is nothing to poll: the start call failed
/// and the store now holds a local terminal record, or the launch was
/// superseded mid-flight.
pub(crate) async fn launch(
    api: &Arc<dyn IngestApi>,
    store: &JobStore,
    events: &broadcast::Sender<TrackerEvent>,
    config: IngestConfig,
) -> Option<PollTarget> {
    let started_at = Utc::now().to_rfc3339();
    let mut optimistic = Job::running(
        format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()),
        started_at.clone(),
    );
    optimistic.cluster_similarity_threshold = Some(config.cluster_similarity_threshold);
    optimistic.cluster_time_window_days = Some(config.cluster_time_window_days);
    optimistic.message = Some("Ingestion running...".to_string());

    let generation = store.adopt(optimistic.clone());

    match api.start_ingestion(&config).await {
        Ok(response) => {
            if response.already_running {
                // Not an error: the existing run is adopted and tracked
                // exactly as if this launch had created it.
                info!(job_id = %response.job_id, "ingestion already running, tracking existing job");
                let _ = events.send(TrackerEvent::AlreadyRunning {
                    job_id: response.job_id.clone(),
                });
            }

            let mut bound = optimistic;
            bound.job_id = response.job_id.clone();
            if !store.apply(generation, bound) {
                debug!(job_id = %response.job_id, "launch superseded before binding");
                return None;
            }
            let _ = events.send(TrackerEvent::Started {
                job_id: response.job_id.clone(),
            });

            // One best-effort refresh so the record picks up the
            // backend's started_at and config echo without waiting for
            // the poller. Terminal transitions stay with the poller.
            match api.job_status(&response.job_id).await {
                Ok(fresh) if fresh.is_running() => {
                    store.apply(generation, fresh);
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(job_id = %response.job_id, error = %e, "refresh fetch failed (non-fatal)");
                }
            }

            Some(PollTarget {
                generation,
                job_id: response.job_id,
            })
        }
        Err(e) => {
            let error = e.to_string();
            warn!(error = %error, "ingestion start failed");

            let mut failed = Job::running(optimistic.job_id.clone(), started_at);
            failed.status = JobStatus::Failed;
            failed.completed_at = Some(Utc::now().to_rfc3339());
            failed.cluster_similarity_threshold = Some(config.cluster_similarity_threshold);
            failed.cluster_time_window_days = Some(config.cluster_time_window_days);
            failed.error = Some(error.clone());
            failed.message = Some("Ingestion failed.".to_string());

            if store.apply(generation, failed) {
                let _ = events.send(TrackerEvent::Failed {
                    job_id: optimistic.job_id,
                    error,
                });
            }
            None
        }
    }
}
