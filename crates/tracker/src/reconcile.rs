// crates/tracker/src/reconcile.rs
//! Session-start reconciliation.
//!
//! A reload (or a second viewer of the same session) must not lose sight
//! of an in-flight ingestion run, so tracking state is reconstructed from
//! the backend instead of living only in local memory: ask for "the
//! current job", adopt whatever comes back, and resume polling when it is
//! still running.

use std::sync::Arc;

use story_inbox_api::IngestApi;
use tracing::{debug, info, warn};

use crate::poller::PollTarget;
use crate::store::JobStore;

/// Adopt the backend's current job, if any.
///
/// Returns a [`PollTarget`] when a running job was adopted and needs a
/// poller. A terminal job is adopted for visibility but not polled; no
/// job, or an unreachable endpoint, leaves the store empty — failure
/// here is never fatal to the session.
pub(crate) async fn reconcile(api: &Arc<dyn IngestApi>, store: &JobStore) -> Option<PollTarget> {
    match api.current_job().await {
        Ok(Some(job)) => {
            let job_id = job.job_id.clone();
            let running = job.is_running();
            let generation = store.adopt(job);
            if running {
                info!(job_id = %job_id, "resuming tracking of in-flight ingestion");
                Some(PollTarget { generation, job_id })
            } else {
                info!(job_id = %job_id, "adopted terminal ingestion record");
                None
            }
        }
        Ok(None) => {
            debug!("no ingestion job to reconcile");
            None
        }
        Err(e) => {
            warn!(error = %e, "reconciliation failed (non-fatal), proceeding with empty store");
            None
        }
    }
}
