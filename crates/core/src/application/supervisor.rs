// Job Supervisor - one job's full lifecycle

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::constants::DIAGNOSTIC_LINE_BUFFER;
use crate::application::parser::parse_progress_line;
use crate::application::progress::ProgressChannel;
use crate::application::registry::JobRegistry;
use crate::domain::{Job, JobId, ResultReference};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, Separator, StemPublisher, TimeProvider, WorkspaceStore};

/// Outcome of a successfully supervised job.
#[derive(Debug, Clone)]
pub struct CompletedJob {
    pub job_id: JobId,
    pub references: Vec<ResultReference>,
}

/// Owns the lifecycle of separation jobs:
/// workspace setup -> separator run -> progress wiring -> result
/// collection -> deferred workspace reaping.
///
/// One call to [`run_job`](Self::run_job) supervises exactly one job;
/// concurrent calls are fully isolated (each owns its workspace and
/// progress channel, registered under its own job id).
pub struct JobSupervisor {
    separator: Arc<dyn Separator>,
    workspaces: Arc<dyn WorkspaceStore>,
    publisher: Arc<dyn StemPublisher>,
    registry: Arc<JobRegistry>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    retention_window: Duration,
}

impl JobSupervisor {
    pub fn new(
        separator: Arc<dyn Separator>,
        workspaces: Arc<dyn WorkspaceStore>,
        publisher: Arc<dyn StemPublisher>,
        registry: Arc<JobRegistry>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        retention_window: Duration,
    ) -> Self {
        Self {
            separator,
            workspaces,
            publisher,
            registry,
            time_provider,
            id_provider,
            retention_window,
        }
    }

    /// Supervise one upload through to published results.
    ///
    /// Returns when the job reaches Succeeded (with its references) or
    /// Failed (as an error). The workspace outlives the return value on
    /// success: reaping happens after the retention window, regardless
    /// of whether anyone is still downloading.
    pub async fn run_job(&self, upload_path: &Path, file_name: &str) -> Result<CompletedJob> {
        let job_id = self.id_provider.generate_id();
        let channel = Arc::new(ProgressChannel::new());
        self.registry.insert(&job_id, Arc::clone(&channel));

        match self.run_supervised(&job_id, &channel, upload_path, file_name).await {
            Ok(completed) => Ok(completed),
            Err(e) => {
                // A failed job has nothing left to observe
                self.registry.remove(&job_id);
                Err(e)
            }
        }
    }

    async fn run_supervised(
        &self,
        job_id: &str,
        channel: &Arc<ProgressChannel>,
        upload_path: &Path,
        file_name: &str,
    ) -> Result<CompletedJob> {
        // 1. Workspace setup (the store removes its own partial state on failure)
        let workspace = self
            .workspaces
            .create(job_id, upload_path, file_name)
            .await
            .map_err(|e| {
                error!(job_id = %job_id, error = %e, stage = "setup", "Workspace setup failed");
                AppError::WorkspaceSetup(e.to_string())
            })?;

        let now = self.time_provider.now_millis();
        let mut job = Job::new(
            job_id,
            now,
            file_name,
            workspace.root,
            workspace.input_file,
            workspace.output_dir,
        );
        job.start(self.time_provider.now_millis())?;
        info!(
            job_id = %job.id,
            input = %job.input_file.display(),
            "Starting separation"
        );

        // 2. Wire diagnostics -> parser -> progress channel.
        // The parsing task mutates this job's channel exclusively.
        let (line_tx, mut line_rx) = mpsc::channel::<String>(DIAGNOSTIC_LINE_BUFFER);
        let parse_channel = Arc::clone(channel);
        let parse_task = tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                debug!(line = %line, "Separator diagnostics");
                if let Some(fraction) = parse_progress_line(&line) {
                    parse_channel.update_all(fraction);
                }
            }
        });

        // 3. Run the external tool to completion
        let outcome = self
            .separator
            .separate(&job.input_file, &job.output_dir, line_tx)
            .await;

        // Sender dropped above; the parsing task drains and exits
        let _ = parse_task.await;

        let outcome = match outcome {
            Ok(o) => o,
            Err(e) => {
                error!(job_id = %job.id, error = %e, stage = "separation", "Separator failed to run");
                self.fail_job(&mut job).await;
                return Err(e.into());
            }
        };

        if !outcome.success() {
            warn!(
                job_id = %job.id,
                exit_code = outcome.exit_code,
                stage = "separation",
                "Separator exited non-zero"
            );
            self.fail_job(&mut job).await;
            return Err(AppError::ProcessFailure {
                exit_code: outcome.exit_code,
            });
        }

        job.succeed(self.time_provider.now_millis())?;
        info!(
            job_id = %job.id,
            duration_ms = outcome.duration_ms,
            "Separation completed"
        );

        // 4. Collect results
        let published = self
            .publisher
            .publish(&job.output_dir, job.input_basename(), &job.id)
            .await;

        // The retention timer starts at Succeeded, whatever publishing did
        self.schedule_reap(job.clone());

        let references = match published {
            Ok(refs) => refs,
            Err(e) => {
                error!(job_id = %job.id, error = %e, stage = "publish", "Result publishing failed");
                return Err(AppError::Publish(e.to_string()));
            }
        };

        for reference in &references {
            channel.mark_stem_complete(reference.stem);
        }
        channel.mark_complete();
        info!(job_id = %job.id, stems = references.len(), "Results published");

        Ok(CompletedJob {
            job_id: job.id,
            references,
        })
    }

    /// Mark the job failed and delete its workspace immediately.
    /// No partial results are ever published for a failed job.
    async fn fail_job(&self, job: &mut Job) {
        job.fail(self.time_provider.now_millis());
        if let Err(e) = self.workspaces.remove(&job.workspace_root).await {
            // Logged only; the caller already gets the failure signal
            error!(job_id = %job.id, error = %e, "Workspace removal after failure failed");
        }
    }

    /// Delete the workspace after the retention window and drop the
    /// job from the registry. Cleanup failures are logged only: the
    /// caller interaction ended long ago.
    fn schedule_reap(&self, mut job: Job) {
        let workspaces = Arc::clone(&self.workspaces);
        let registry = Arc::clone(&self.registry);
        let time_provider = Arc::clone(&self.time_provider);
        let retention = self.retention_window;

        tokio::spawn(async move {
            tokio::time::sleep(retention).await;

            registry.remove(&job.id);
            if let Err(e) = workspaces.remove(&job.workspace_root).await {
                error!(job_id = %job.id, error = %e, stage = "reap", "Workspace cleanup failed");
                return;
            }
            match job.reap(time_provider.now_millis()) {
                Ok(()) => info!(job_id = %job.id, "Workspace reaped"),
                Err(e) => error!(job_id = %job.id, error = %e, "Reap transition rejected"),
            }
        });
    }
}
