// Job Registry - per-job progress channels keyed by job id
// Replaces any process-global progress/result state: two concurrent
// jobs must never observe each other's data (ADR-010).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::application::progress::ProgressChannel;
use crate::domain::{JobId, ProgressSnapshot};

/// A live job visible to observers.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJob {
    pub job_id: JobId,
    pub progress: ProgressSnapshot,
}

/// Registry of live jobs and their progress channels.
///
/// Entries exist from job creation until the workspace is reaped (or
/// immediately on failure), so streaming endpoints can attach to any
/// job that still has observable state.
pub struct JobRegistry {
    inner: RwLock<HashMap<JobId, Arc<ProgressChannel>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, job_id: &str, channel: Arc<ProgressChannel>) {
        match self.inner.write() {
            Ok(mut jobs) => {
                jobs.insert(job_id.to_string(), channel);
            }
            Err(e) => tracing::error!("RwLock poisoned writing job registry: {e}"),
        }
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<ProgressChannel>> {
        match self.inner.read() {
            Ok(jobs) => jobs.get(job_id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading job registry: {e}");
                None
            }
        }
    }

    /// Idempotent: removing an unknown id is a no-op.
    pub fn remove(&self, job_id: &str) {
        match self.inner.write() {
            Ok(mut jobs) => {
                jobs.remove(job_id);
            }
            Err(e) => tracing::error!("RwLock poisoned writing job registry: {e}"),
        }
    }

    /// All registered jobs with their current snapshots.
    pub fn active(&self) -> Vec<ActiveJob> {
        match self.inner.read() {
            Ok(jobs) => jobs
                .iter()
                .map(|(id, chan)| ActiveJob {
                    job_id: id.clone(),
                    progress: chan.snapshot(),
                })
                .collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading job registry: {e}");
                Vec::new()
            }
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
