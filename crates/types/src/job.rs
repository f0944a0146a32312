// crates/types/src/job.rs
//! The ingestion job record as reported by the backend.
//!
//! One `Job` describes one server-tracked ingestion run. The status is
//! monotonic: `running` may move to `completed` or `failed`, and a terminal
//! status never changes again for the same `job_id` — observing a new run
//! always means observing a new id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` are terminal; no further transitions exist.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One ingestion run, keyed by `job_id`.
///
/// `started_at` is carried as the wire string rather than a parsed
/// timestamp: a malformed value from the backend must degrade to
/// "started just now" downstream, not fail deserialization of the whole
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub inserted: Option<u64>,
    #[serde(default)]
    pub skipped: Option<u64>,
    #[serde(default)]
    pub cluster_similarity_threshold: Option<f64>,
    #[serde(default)]
    pub cluster_time_window_days: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Job {
    /// A minimal `running` record with everything optional unset.
    pub fn running(job_id: impl Into<String>, started_at: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Running,
            started_at: started_at.into(),
            completed_at: None,
            inserted: None,
            skipped: None,
            cluster_similarity_threshold: None,
            cluster_time_window_days: None,
            error: None,
            message: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Parse `started_at` as an RFC 3339 timestamp.
    ///
    /// Returns `None` when the field does not parse; callers substitute
    /// their own notion of "now" so elapsed time starts at zero instead of
    /// producing an invalid duration.
    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.started_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
