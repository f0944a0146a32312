// crates/tracker/src/events.rs
//! Notices fanned out to tracker observers.

/// Lifecycle notices emitted by the tracker.
///
/// Advisory only: observers render these (banner, CLI line, log), the
/// state machine itself is driven entirely by the job record in
/// [`crate::JobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// A launch acquired a backend job id and polling began.
    Started { job_id: String },
    /// The launch found an ingestion run already in flight; the existing
    /// run is tracked instead. Informational, not an error.
    AlreadyRunning { job_id: String },
    /// The tracked job reached `completed`.
    Completed {
        job_id: String,
        inserted: u64,
        skipped: u64,
    },
    /// The tracked job reached `failed` — either reported by the backend
    /// or synthesized locally (launch failure, vanished job).
    Failed { job_id: String, error: String },
}

/// User-facing completion notice.
pub fn completion_notice(inserted: u64, skipped: u64) -> String {
    format!("Ingestion complete: {inserted} inserted, {skipped} skipped.")
}
