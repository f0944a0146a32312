// crates/api/src/http.rs
//! reqwest implementation of [`IngestApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use story_inbox_types::{IngestConfig, IngestSettings, Job, StartResponse};

use crate::api::IngestApi;
use crate::error::{extract_detail, ApiError};

/// Configuration for the HTTP client.
pub struct ApiConfig {
    /// Backend base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Per-request timeout. Polling treats timeouts as transient.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("STORY_INBOX_API_BASE")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the ingestion admin endpoints.
pub struct HttpIngestApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIngestApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to [`ApiError::Status`] with the
    /// FastAPI `detail` extracted for display.
    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            detail: extract_detail(&body),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IngestApi for HttpIngestApi {
    async fn start_ingestion(&self, config: &IngestConfig) -> Result<StartResponse, ApiError> {
        let resp = self
            .client
            .post(self.url("/admin/ingest"))
            .json(config)
            .send()
            .await?;
        Self::decode(Self::check(resp).await?).await
    }

    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError> {
        let resp = self
            .client
            .get(self.url(&format!("/admin/ingest/status/{job_id}")))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::JobNotFound {
                job_id: job_id.to_string(),
            });
        }
        Self::decode(Self::check(resp).await?).await
    }

    async fn current_job(&self) -> Result<Option<Job>, ApiError> {
        let resp = self
            .client
            .get(self.url("/admin/ingest/status/current"))
            .send()
            .await?;
        // The endpoint returns `null` when the backend tracks no job.
        Self::decode(Self::check(resp).await?).await
    }

    async fn ingest_settings(&self) -> Result<IngestSettings, ApiError> {
        let resp = self
            .client
            .get(self.url("/admin/ingest/settings"))
            .send()
            .await?;
        Self::decode(Self::check(resp).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn api_for(server: &mockito::ServerGuard) -> HttpIngestApi {
        HttpIngestApi::new(ApiConfig {
            base_url: server.url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn start_ingestion_posts_config() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/admin/ingest")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "cluster_similarity_threshold": 0.88,
                "cluster_time_window_days": 2,
            })))
            .with_status(200)
            .with_body(r#"{"job_id": "j1", "status": "running", "already_running": false}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let resp = api
            .start_ingestion(&IngestConfig::default())
            .await
            .unwrap();
        assert_eq!(resp.job_id, "j1");
        assert!(!resp.already_running);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn start_ingestion_reports_existing_run() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/admin/ingest")
            .with_status(200)
            .with_body(r#"{"job_id": "existing", "status": "running", "already_running": true}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let resp = api
            .start_ingestion(&IngestConfig::default())
            .await
            .unwrap();
        assert_eq!(resp.job_id, "existing");
        assert!(resp.already_running);
    }

    #[tokio::test]
    async fn job_status_404_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/status/gone")
            .with_status(404)
            .with_body(r#"{"detail": "Ingestion job not found"}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.job_status("gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn job_status_500_is_transient_with_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/status/j1")
            .with_status(500)
            .with_body(r#"{"detail": "database unavailable"}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.job_status("j1").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("database unavailable"));
    }

    #[tokio::test]
    async fn job_status_parses_record() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/status/j1")
            .with_status(200)
            .with_body(
                r#"{"job_id": "j1", "status": "completed",
                    "started_at": "2026-08-06T09:15:00+00:00",
                    "completed_at": "2026-08-06T09:16:10+00:00",
                    "inserted": 12, "skipped": 3}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let job = api.job_status("j1").await.unwrap();
        assert!(job.is_terminal());
        assert_eq!(job.inserted, Some(12));
        assert_eq!(job.skipped, Some(3));
    }

    #[tokio::test]
    async fn current_job_null_means_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/status/current")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let api = api_for(&server);
        assert!(api.current_job().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn current_job_returns_record() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/status/current")
            .with_status(200)
            .with_body(
                r#"{"job_id": "j9", "status": "running",
                    "started_at": "2026-08-06T09:15:00+00:00"}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let job = api.current_job().await.unwrap().unwrap();
        assert_eq!(job.job_id, "j9");
        assert!(job.is_running());
    }

    #[tokio::test]
    async fn ingest_settings_parse() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/settings")
            .with_status(200)
            .with_body(r#"{"cluster_similarity_threshold": 0.75, "cluster_time_window_days": 7}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let settings = api.ingest_settings().await.unwrap();
        assert_eq!(settings.cluster_similarity_threshold, 0.75);
        assert_eq!(settings.cluster_time_window_days, 7);
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/ingest/status/j1")
            .with_status(200)
            .with_body("<html>proxy error</html>")
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.job_status("j1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpIngestApi::new(ApiConfig {
            base_url: "http://localhost:8000/".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(api.url("/admin/ingest"), "http://localhost:8000/admin/ingest");
    }
}
