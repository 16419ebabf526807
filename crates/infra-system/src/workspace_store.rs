// Filesystem workspace store
// One isolated temp directory tree per job, removed on failure or reaping.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use stemflow_core::port::{JobWorkspace, WorkspaceError, WorkspaceStore};

/// Directory name the separator writes into inside each workspace
const OUTPUT_DIR_NAME: &str = "output";

/// Workspace store backed by a base directory (usually the system
/// temp dir). Each job gets `<base>/stemflow-<job_id>/`.
pub struct FsWorkspaceStore {
    base_dir: PathBuf,
}

impl FsWorkspaceStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store rooted at the system temp directory (production default)
    pub fn system_temp() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[async_trait]
impl WorkspaceStore for FsWorkspaceStore {
    async fn create(
        &self,
        job_id: &str,
        upload_path: &Path,
        file_name: &str,
    ) -> Result<JobWorkspace, WorkspaceError> {
        let root = self.base_dir.join(format!("stemflow-{job_id}"));

        fs::create_dir_all(&root)
            .await
            .map_err(|e| WorkspaceError::Create(e.to_string()))?;

        // Only the final path component of the client-supplied name
        let safe_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let input_file = root.join(&safe_name);

        // Move the upload in; fall back to copy for cross-device spools
        if let Err(rename_err) = fs::rename(upload_path, &input_file).await {
            debug!(
                error = %rename_err,
                "Rename into workspace failed, falling back to copy"
            );
            let copied = fs::copy(upload_path, &input_file).await;
            match copied {
                Ok(_) => {
                    let _ = fs::remove_file(upload_path).await;
                }
                Err(copy_err) => {
                    // Remove the partial workspace before reporting
                    let _ = fs::remove_dir_all(&root).await;
                    return Err(WorkspaceError::MoveInput(copy_err.to_string()));
                }
            }
        }

        let output_dir = root.join(OUTPUT_DIR_NAME);
        if let Err(e) = fs::create_dir_all(&output_dir).await {
            let _ = fs::remove_dir_all(&root).await;
            return Err(WorkspaceError::Create(e.to_string()));
        }

        info!(job_id = %job_id, workspace = %root.display(), "Workspace created");

        Ok(JobWorkspace {
            root,
            input_file,
            output_dir,
        })
    }

    async fn remove(&self, root: &Path) -> Result<(), WorkspaceError> {
        match fs::remove_dir_all(root).await {
            Ok(()) => {
                info!(workspace = %root.display(), "Workspace removed");
                Ok(())
            }
            // Idempotent: already gone is fine
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkspaceError::Remove(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_base(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stemflow-ws-test-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_create_moves_upload_and_prepares_output() {
        let base = temp_base("create");
        let upload = base.join("spool-upload");
        std::fs::write(&upload, b"fake audio").unwrap();

        let store = FsWorkspaceStore::new(&base);
        let ws = store.create("job-1", &upload, "song.wav").await.unwrap();

        assert_eq!(ws.input_file.file_name().unwrap(), "song.wav");
        assert!(ws.input_file.exists());
        assert!(!upload.exists(), "upload must be moved, not copied");
        assert!(ws.output_dir.is_dir());
        assert!(ws.root.starts_with(&base));

        let _ = std::fs::remove_dir_all(base);
    }

    #[tokio::test]
    async fn test_create_strips_path_components_from_file_name() {
        let base = temp_base("strip");
        let upload = base.join("spool-upload");
        std::fs::write(&upload, b"x").unwrap();

        let store = FsWorkspaceStore::new(&base);
        let ws = store
            .create("job-2", &upload, "../../etc/song.wav")
            .await
            .unwrap();

        assert_eq!(ws.input_file.file_name().unwrap(), "song.wav");
        assert!(ws.input_file.starts_with(&ws.root));

        let _ = std::fs::remove_dir_all(base);
    }

    #[tokio::test]
    async fn test_create_fails_without_upload() {
        let base = temp_base("missing");
        let store = FsWorkspaceStore::new(&base);

        let err = store
            .create("job-3", Path::new("/nonexistent/upload"), "song.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::MoveInput(_)));

        // Partial workspace removed
        assert!(!base.join("stemflow-job-3").exists());

        let _ = std::fs::remove_dir_all(base);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let base = temp_base("remove");
        let upload = base.join("spool-upload");
        std::fs::write(&upload, b"x").unwrap();

        let store = FsWorkspaceStore::new(&base);
        let ws = store.create("job-4", &upload, "song.wav").await.unwrap();

        store.remove(&ws.root).await.unwrap();
        assert!(!ws.root.exists());
        // Second removal is a no-op
        store.remove(&ws.root).await.unwrap();

        let _ = std::fs::remove_dir_all(base);
    }
}
