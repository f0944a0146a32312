// crates/tracker/src/testutil.rs
//! Scripted IngestApi fake for lifecycle and timing tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use story_inbox_api::{ApiError, IngestApi};
use story_inbox_types::{IngestConfig, IngestSettings, Job, StartResponse};
use tokio::time::Instant;

pub(crate) fn transient(detail: &str) -> ApiError {
    ApiError::Status {
        status: 502,
        detail: detail.to_string(),
    }
}

pub(crate) fn not_found(job_id: &str) -> ApiError {
    ApiError::JobNotFound {
        job_id: job_id.to_string(),
    }
}

pub(crate) fn running_job(id: &str) -> Job {
    Job::running(id, "2026-08-06T09:15:00+00:00")
}

pub(crate) fn completed_job(id: &str, inserted: u64, skipped: u64) -> Job {
    Job {
        status: story_inbox_types::JobStatus::Completed,
        completed_at: Some("2026-08-06T09:16:10+00:00".to_string()),
        inserted: Some(inserted),
        skipped: Some(skipped),
        message: Some("Ingestion complete.".to_string()),
        ..running_job(id)
    }
}

pub(crate) fn failed_job(id: &str, error: &str) -> Job {
    Job {
        status: story_inbox_types::JobStatus::Failed,
        completed_at: Some("2026-08-06T09:16:10+00:00".to_string()),
        error: Some(error.to_string()),
        message: Some("Ingestion failed.".to_string()),
        ..running_job(id)
    }
}

/// An [`IngestApi`] whose responses are scripted per call, recording each
/// status fetch with its (tokio) timestamp so paused-clock tests can
/// assert the polling schedule.
pub(crate) struct ScriptedApi {
    start_script: Mutex<VecDeque<Result<StartResponse, ApiError>>>,
    status_script: Mutex<VecDeque<Result<Job, ApiError>>>,
    current_script: Mutex<VecDeque<Result<Option<Job>, ApiError>>>,
    settings_script: Mutex<VecDeque<Result<IngestSettings, ApiError>>>,
    /// Simulated latency applied to every status fetch.
    pub status_delay: Mutex<Duration>,
    status_calls: Mutex<Vec<(String, Instant)>>,
    start_calls: Mutex<Vec<IngestConfig>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            start_script: Mutex::new(VecDeque::new()),
            status_script: Mutex::new(VecDeque::new()),
            current_script: Mutex::new(VecDeque::new()),
            settings_script: Mutex::new(VecDeque::new()),
            status_delay: Mutex::new(Duration::ZERO),
            status_calls: Mutex::new(Vec::new()),
            start_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_start(&self, response: Result<StartResponse, ApiError>) {
        self.start_script.lock().unwrap().push_back(response);
    }

    pub fn push_status(&self, response: Result<Job, ApiError>) {
        self.status_script.lock().unwrap().push_back(response);
    }

    pub fn push_current(&self, response: Result<Option<Job>, ApiError>) {
        self.current_script.lock().unwrap().push_back(response);
    }

    pub fn push_settings(&self, response: Result<IngestSettings, ApiError>) {
        self.settings_script.lock().unwrap().push_back(response);
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    pub fn status_call_times(&self) -> Vec<Instant> {
        self.status_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn status_call_ids(&self) -> Vec<String> {
        self.status_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn start_call_configs(&self) -> Vec<IngestConfig> {
        self.start_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngestApi for ScriptedApi {
    async fn start_ingestion(&self, config: &IngestConfig) -> Result<StartResponse, ApiError> {
        self.start_calls.lock().unwrap().push(*config);
        self.start_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transient("start script exhausted")))
    }

    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError> {
        self.status_calls
            .lock()
            .unwrap()
            .push((job_id.to_string(), Instant::now()));
        let delay = *self.status_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transient("status script exhausted")))
    }

    async fn current_job(&self) -> Result<Option<Job>, ApiError> {
        self.current_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn ingest_settings(&self) -> Result<IngestSettings, ApiError> {
        self.settings_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transient("settings script exhausted")))
    }
}
