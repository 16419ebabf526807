//! Shared Handler State

use std::path::PathBuf;
use std::sync::Arc;

use stemflow_core::application::{JobRegistry, JobSupervisor};

/// State cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<JobSupervisor>,
    pub registry: Arc<JobRegistry>,
    /// Spool directory for uploads before they move into a workspace
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(
        supervisor: Arc<JobSupervisor>,
        registry: Arc<JobRegistry>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            supervisor,
            registry,
            upload_dir: upload_dir.into(),
        }
    }
}
