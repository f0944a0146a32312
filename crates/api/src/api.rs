// crates/api/src/api.rs
//! IngestApi trait defining the backend operations the tracker consumes.

use async_trait::async_trait;
use story_inbox_types::{IngestConfig, IngestSettings, Job, StartResponse};

use crate::error::ApiError;

/// The four backend operations the job tracker is built on.
///
/// Implementations include:
/// - [`crate::HttpIngestApi`] — reqwest client against a live backend
/// - scripted fakes in the tracker's tests
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Start an ingestion run, or learn that one is already running.
    ///
    /// Both outcomes return a `job_id` to track; `already_running` only
    /// changes user messaging, never control flow.
    async fn start_ingestion(&self, config: &IngestConfig) -> Result<StartResponse, ApiError>;

    /// Fetch the current record for one job id.
    ///
    /// An unknown id surfaces as [`ApiError::JobNotFound`]; any other
    /// failure is transient and retryable.
    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError>;

    /// Ask the backend which job, if any, it is currently tracking.
    /// `None` means no job to reconcile.
    async fn current_job(&self) -> Result<Option<Job>, ApiError>;

    /// Persisted ingestion defaults, used to seed launcher config.
    async fn ingest_settings(&self) -> Result<IngestSettings, ApiError>;
}
