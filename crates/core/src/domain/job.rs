// Job Domain Model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job State
///
/// Created -> Running -> Succeeded | Failed -> Reaped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Created,
    Running,
    Succeeded,
    Failed,
    Reaped,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Created => write!(f, "CREATED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Succeeded => write!(f, "SUCCEEDED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Reaped => write!(f, "REAPED"),
        }
    }
}

/// Job Entity - one upload-to-result processing run
///
/// Invariant: the workspace is exclusively owned by this job until it
/// is reaped; exactly one separator process is active per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,

    /// Original file name of the upload (e.g. "song.wav")
    pub file_name: String,
    /// Root of the job's isolated workspace directory tree
    pub workspace_root: PathBuf,
    /// Path of the received upload inside the workspace
    pub input_file: PathBuf,
    /// Directory the separator writes its results into
    pub output_dir: PathBuf,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub reaped_at: Option<i64>,
}

impl Job {
    /// Create a new Job in the Created state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `file_name` - Original upload file name
    /// * `workspace_root` - Isolated workspace directory
    /// * `input_file` - Upload path inside the workspace
    /// * `output_dir` - Separator output directory inside the workspace
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        file_name: impl Into<String>,
        workspace_root: PathBuf,
        input_file: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            id: id.into(),
            state: JobState::Created,
            file_name: file_name.into(),
            workspace_root,
            input_file,
            output_dir,
            created_at,
            started_at: None,
            finished_at: None,
            reaped_at: None,
        }
    }

    /// Base name of the input without its extension.
    ///
    /// The separator names its result directory after this
    /// ("song.wav" -> "<outputDir>/htdemucs/song/").
    pub fn input_basename(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((base, _ext)) if !base.is_empty() => base,
            _ => &self.file_name,
        }
    }

    /// Transition to Running state with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Created {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "RUNNING".to_string(),
            });
        }
        self.state = JobState::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Succeeded state with explicit timestamp
    pub fn succeed(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Running {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "SUCCEEDED".to_string(),
            });
        }
        self.state = JobState::Succeeded;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed with explicit timestamp
    ///
    /// Allowed from any non-terminal state: setup can fail before the
    /// job ever starts running.
    pub fn fail(&mut self, now_millis: i64) {
        self.state = JobState::Failed;
        self.finished_at = Some(now_millis);
    }

    /// Transition to Reaped state (workspace deleted) with explicit timestamp
    pub fn reap(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Succeeded {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "REAPED".to_string(),
            });
        }
        self.state = JobState::Reaped;
        self.reaped_at = Some(now_millis);
        Ok(())
    }
}
