// crates/api/src/lib.rs
//! Backend access layer for the story-inbox ingestion admin API.
//!
//! Provides:
//! - [`IngestApi`] — the trait seam the tracker core polls through
//! - [`HttpIngestApi`] — reqwest implementation against a running backend
//! - [`ApiError`] — failure taxonomy (not-found vs. transient)

pub mod api;
pub mod error;
pub mod http;

pub use api::IngestApi;
pub use error::ApiError;
pub use http::{ApiConfig, HttpIngestApi};
