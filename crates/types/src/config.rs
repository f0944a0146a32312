// crates/types/src/config.rs
//! Request/response types for the ingestion admin endpoints.

use serde::{Deserialize, Serialize};

/// Configuration an ingestion run is started with.
///
/// Range validation (threshold in (0, 1], window >= 1 day) is the caller's
/// responsibility; the backend rejects out-of-range values and the launcher
/// does not clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub cluster_similarity_threshold: f64,
    pub cluster_time_window_days: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            cluster_similarity_threshold: 0.88,
            cluster_time_window_days: 2,
        }
    }
}

/// Response of the start operation.
///
/// When a job is already running the backend returns its id with
/// `already_running = true`; tracking proceeds identically either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub already_running: bool,
}

/// Persisted ingestion defaults, used to seed the launcher when the caller
/// supplies no explicit config. Not part of the tracked job entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    pub cluster_similarity_threshold: f64,
    pub cluster_time_window_days: u32,
}

impl From<IngestSettings> for IngestConfig {
    fn from(s: IngestSettings) -> Self {
        Self {
            cluster_similarity_threshold: s.cluster_similarity_threshold,
            cluster_time_window_days: s.cluster_time_window_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_response_without_already_running_defaults_false() {
        let json = r#"{"job_id": "j1", "status": "running"}"#;
        let resp: StartResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.already_running);
    }

    #[test]
    fn start_response_with_already_running() {
        let json = r#"{"job_id": "j1", "status": "running", "already_running": true}"#;
        let resp: StartResponse = serde_json::from_str(json).unwrap();
        assert!(resp.already_running);
        assert_eq!(resp.job_id, "j1");
    }

    #[test]
    fn config_serializes_backend_field_names() {
        let cfg = IngestConfig {
            cluster_similarity_threshold: 0.88,
            cluster_time_window_days: 2,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"cluster_similarity_threshold\":0.88"));
        assert!(json.contains("\"cluster_time_window_days\":2"));
    }

    #[test]
    fn settings_convert_to_config() {
        let settings = IngestSettings {
            cluster_similarity_threshold: 0.75,
            cluster_time_window_days: 7,
        };
        let cfg: IngestConfig = settings.into();
        assert_eq!(cfg.cluster_similarity_threshold, 0.75);
        assert_eq!(cfg.cluster_time_window_days, 7);
    }
}
