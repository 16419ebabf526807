// Demucs separator adapter
// reason: tokio for async process management (ADR-001)
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use stemflow_core::port::{SeparationError, SeparationOutcome, Separator, TimeProvider};

/// Separator backed by the Demucs CLI.
///
/// Invocation contract: `<binary> <input> --out <outputDir>`; the tool
/// reports combined progress on stderr, informational text on stdout,
/// and exit code 0 on success.
pub struct DemucsSeparator {
    binary: String,
    time_provider: Arc<dyn TimeProvider>,
}

impl DemucsSeparator {
    /// # Arguments
    /// * `binary` - Demucs executable name or path (e.g. "demucs")
    /// * `time_provider` - Time provider for duration tracking
    pub fn new(binary: impl Into<String>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            binary: binary.into(),
            time_provider,
        }
    }
}

#[async_trait]
impl Separator for DemucsSeparator {
    async fn separate(
        &self,
        input: &Path,
        output_dir: &Path,
        diagnostics: mpsc::Sender<String>,
    ) -> Result<SeparationOutcome, SeparationError> {
        let start_time = self.time_provider.now_millis();

        info!(
            binary = %self.binary,
            input = %input.display(),
            output_dir = %output_dir.display(),
            "Spawning separator process"
        );

        let mut child = Command::new(&self.binary)
            .arg(input)
            .arg("--out")
            .arg(output_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SeparationError::SpawnFailed(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SeparationError::Io("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SeparationError::Io("failed to capture stderr".to_string()))?;

        // Informational stream: logged, never parsed for progress
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(line = %line, "Separator stdout");
            }
        });

        // Diagnostic stream: forwarded line by line. Keep draining even
        // if the receiver is gone, so the child's pipe never fills up.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = diagnostics.send(line).await;
            }
        });

        let status = child
            .wait()
            .await
            .map_err(|e| SeparationError::Io(e.to_string()))?;

        let _ = stdout_task.await;
        let _ = stderr_task.await;

        let duration_ms = self.time_provider.now_millis() - start_time;
        // Signal-terminated processes report no code; treat as failure
        let exit_code = status.code().unwrap_or(-1);

        info!(exit_code, duration_ms, "Separator process exited");

        Ok(SeparationOutcome {
            exit_code,
            duration_ms,
        })
    }
}
