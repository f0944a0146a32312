// crates/tracker/src/store.rs
//! The single current job record, with stale-write rejection.
//!
//! `JobStore` is the only shared mutable state in the tracker. Writers
//! (launcher, reconciler, poller) go through [`JobStore::adopt`] /
//! [`JobStore::apply`]; readers subscribe to a watch channel and never
//! mutate. Every adoption advances a generation counter, and authoritative
//! writes carry the generation they belong to — a write whose generation
//! no longer matches is a stale result from a superseded job and is
//! discarded.

use std::sync::Mutex;

use story_inbox_types::Job;
use tokio::sync::watch;

/// Token tying an asynchronous operation to the job adoption it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Holder of the current job record.
pub struct JobStore {
    /// Current generation. Also serializes all writers.
    generation: Mutex<u64>,
    tx: watch::Sender<Option<Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            generation: Mutex::new(0),
            tx,
        }
    }

    /// Install `job` as the current record, superseding whatever was
    /// tracked before. Returns the generation that subsequent
    /// [`JobStore::apply`] calls for this job must present.
    pub fn adopt(&self, job: Job) -> Generation {
        let mut generation = self.generation.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *generation += 1;
        self.tx.send_replace(Some(job));
        Generation(*generation)
    }

    /// Authoritative overwrite of the current record.
    ///
    /// Rejected (returning `false`, store untouched) when:
    /// - `generation` is no longer current — the result is stale;
    /// - the held record has the same `job_id` and is already terminal —
    ///   status is monotonic and nothing may follow `completed`/`failed`.
    pub fn apply(&self, generation: Generation, job: Job) -> bool {
        let current = self.generation.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if Generation(*current) != generation {
            return false;
        }
        {
            let held = self.tx.borrow();
            if let Some(held) = held.as_ref() {
                if held.job_id == job.job_id && held.is_terminal() {
                    return false;
                }
            }
        }
        self.tx.send_replace(Some(job));
        true
    }

    /// Drop the current record. Advances the generation so in-flight
    /// results for the dropped job can never land.
    pub fn clear(&self) {
        let mut generation = self.generation.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *generation += 1;
        self.tx.send_replace(None);
    }

    pub fn snapshot(&self) -> Option<Job> {
        self.tx.borrow().clone()
    }

    pub fn generation(&self) -> Generation {
        Generation(*self.generation.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }

    /// Observe record changes. Readers get the latest value on subscribe.
    pub fn subscribe(&self) -> watch::Receiver<Option<Job>> {
        self.tx.subscribe()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
