// crates/api/src/error.rs
//! Failure taxonomy for backend calls.
//!
//! The poller cares about exactly one distinction: a *not-found* failure
//! means the job identifier is no longer resolvable and tracking must end;
//! everything else is *transient* and retried. [`ApiError::is_not_found`]
//! is that classification.

use thiserror::Error;

/// Errors returned by [`crate::IngestApi`] operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend no longer knows the job id (404 from the status
    /// endpoint). The only failure promoted to a domain failure.
    #[error("ingestion job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// Connection, TLS, or timeout failure before a response arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status with whatever detail the body carried.
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// A 2xx response whose body did not match the expected shape.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// True for the not-found class; all other variants are transient.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::JobNotFound { .. })
    }
}

/// Pull a human-readable reason out of a FastAPI error body.
///
/// Bodies look like `{"detail": "..."}` or, for validation errors,
/// `{"detail": [{"msg": "..."}, ...]}`. Anything else is returned as-is.
pub fn extract_detail(body: &str) -> String {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.to_string(),
    };
    match parsed.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .or_else(|| item.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| item.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let err = ApiError::JobNotFound {
            job_id: "j1".into(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: 500,
            detail: "boom".into(),
        };
        assert!(!err.is_not_found());

        let err = ApiError::Decode("unexpected".into());
        assert!(!err.is_not_found());
    }

    #[test]
    fn error_display() {
        let err = ApiError::JobNotFound {
            job_id: "j1".into(),
        };
        assert_eq!(err.to_string(), "ingestion job not found: j1");

        let err = ApiError::Status {
            status: 503,
            detail: "maintenance".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn detail_string_form() {
        assert_eq!(
            extract_detail(r#"{"detail": "Ingestion job not found"}"#),
            "Ingestion job not found"
        );
    }

    #[test]
    fn detail_validation_list_form() {
        let body = r#"{"detail": [{"msg": "value is not a valid float"}, {"msg": "ensure this value is >= 1"}]}"#;
        assert_eq!(
            extract_detail(body),
            "value is not a valid float; ensure this value is >= 1"
        );
    }

    #[test]
    fn detail_list_without_msg_falls_back_to_json() {
        let body = r#"{"detail": [{"loc": ["body", "threshold"]}]}"#;
        assert!(extract_detail(body).contains("loc"));
    }

    #[test]
    fn opaque_body_passes_through() {
        assert_eq!(extract_detail("<html>bad gateway</html>"), "<html>bad gateway</html>");
        assert_eq!(extract_detail(r#"{"other": 1}"#), r#"{"other": 1}"#);
    }
}
