// Separator Port
// Abstraction over the external source-separation CLI tool

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Result of one separator run.
///
/// A non-zero exit code is a normal outcome here, not an error: the
/// supervisor decides what it means for the job.
#[derive(Debug, Clone)]
pub struct SeparationOutcome {
    pub exit_code: i32,
    pub duration_ms: i64,
}

impl SeparationOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Separation errors (failures to run the tool at all)
#[derive(Error, Debug)]
pub enum SeparationError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Separator trait
///
/// Implementations:
/// - DemucsSeparator: spawns the demucs CLI (infra-system)
/// - mocks::MockSeparator: scripted output for tests
#[async_trait]
pub trait Separator: Send + Sync {
    /// Run the separation tool against `input`, writing results under
    /// `output_dir`.
    ///
    /// Every line of the tool's diagnostic stream is forwarded through
    /// `diagnostics` as it arrives; the informational stream is logged
    /// by the implementation and never forwarded. The receiver side
    /// may be dropped at any time without affecting the run.
    ///
    /// # Errors
    /// - SeparationError::SpawnFailed if the process cannot be started
    /// - SeparationError::Io if reading the process streams fails
    async fn separate(
        &self,
        input: &Path,
        output_dir: &Path,
        diagnostics: mpsc::Sender<String>,
    ) -> Result<SeparationOutcome, SeparationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock separator behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Emit the given diagnostic lines, then exit with the code
        Emit(Vec<String>, i32),
        /// Fail to spawn with the given message
        SpawnFail(String),
    }

    /// Mock Separator for testing
    pub struct MockSeparator {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockSeparator {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        /// Emits one 45% progress line, then exits 0
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Emit(
                vec!["Processing 45%".to_string(), "Processing 100%".to_string()],
                0,
            ))
        }

        pub fn new_exit(code: i32) -> Self {
            Self::new(MockBehavior::Emit(vec![], code))
        }

        pub fn new_spawn_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::SpawnFail(message.into()))
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Separator for MockSeparator {
        async fn separate(
            &self,
            _input: &Path,
            _output_dir: &Path,
            diagnostics: mpsc::Sender<String>,
        ) -> Result<SeparationOutcome, SeparationError> {
            *self.call_count.lock().unwrap() += 1;

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Emit(lines, exit_code) => {
                    for line in lines {
                        // Receiver may already be gone; that must not fail the run
                        let _ = diagnostics.send(line).await;
                    }
                    Ok(SeparationOutcome {
                        exit_code,
                        duration_ms: 10,
                    })
                }
                MockBehavior::SpawnFail(msg) => Err(SeparationError::SpawnFailed(msg)),
            }
        }
    }
}
