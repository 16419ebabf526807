// Workspace Store Port
// Abstraction over per-job temporary directory management

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Paths of one job's isolated workspace.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    /// Exclusively owned directory tree for this job
    pub root: PathBuf,
    /// The received upload, moved inside the workspace
    pub input_file: PathBuf,
    /// Directory the separator writes into
    pub output_dir: PathBuf,
}

/// Workspace errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Failed to create workspace: {0}")]
    Create(String),

    #[error("Failed to move upload into workspace: {0}")]
    MoveInput(String),

    #[error("Failed to remove workspace: {0}")]
    Remove(String),
}

/// Workspace Store trait
///
/// Implementations:
/// - FsWorkspaceStore: real temp directories (infra-system)
/// - mocks::MockWorkspaceStore: fabricated paths for tests
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Create an isolated workspace for one job: a fresh directory
    /// named after `job_id`, the upload at `upload_path` moved in under
    /// `file_name`, and an empty output directory.
    async fn create(
        &self,
        job_id: &str,
        upload_path: &Path,
        file_name: &str,
    ) -> Result<JobWorkspace, WorkspaceError>;

    /// Delete the whole workspace tree. Must be idempotent: removing
    /// an already-removed workspace is not an error.
    async fn remove(&self, root: &Path) -> Result<(), WorkspaceError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock Workspace Store for testing
    ///
    /// Fabricates paths without touching the filesystem and records
    /// every removal so tests can assert cleanup behavior.
    pub struct MockWorkspaceStore {
        fail_create: bool,
        removed: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl MockWorkspaceStore {
        pub fn new() -> Self {
            Self {
                fail_create: false,
                removed: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// A store whose create() always fails (workspace setup failure path)
        pub fn new_failing() -> Self {
            Self {
                fail_create: true,
                removed: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn removed_roots(&self) -> Vec<PathBuf> {
            self.removed.lock().unwrap().clone()
        }
    }

    impl Default for MockWorkspaceStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl WorkspaceStore for MockWorkspaceStore {
        async fn create(
            &self,
            job_id: &str,
            _upload_path: &Path,
            file_name: &str,
        ) -> Result<JobWorkspace, WorkspaceError> {
            if self.fail_create {
                return Err(WorkspaceError::Create("mock create failure".to_string()));
            }
            let root = PathBuf::from(format!("/mock/stemflow-{job_id}"));
            Ok(JobWorkspace {
                input_file: root.join(file_name),
                output_dir: root.join("output"),
                root,
            })
        }

        async fn remove(&self, root: &Path) -> Result<(), WorkspaceError> {
            self.removed.lock().unwrap().push(root.to_path_buf());
            Ok(())
        }
    }
}
