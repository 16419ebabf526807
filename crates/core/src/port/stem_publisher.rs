// Stem Publisher Port
// Abstraction over result collection: workspace output -> public artifacts

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ResultReference;

/// Publish errors
///
/// A missing individual stem file is NOT an error: the separator's
/// per-run output completeness cannot be guaranteed, so absent stems
/// are skipped silently and simply omitted from the returned set.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Public directory unavailable: {0}")]
    PublicDirUnavailable(String),
}

/// Stem Publisher trait
///
/// Implementations:
/// - FsStemPublisher: copies artifacts into the public stems dir (infra-system)
/// - mocks::MockStemPublisher: configured reference sets for tests
#[async_trait]
pub trait StemPublisher: Send + Sync {
    /// Collect the separator's output for one job.
    ///
    /// For each stem, probe the tool's conventional artifact path
    /// under `output_dir` for `input_basename`; publish what exists
    /// under a collision-resistant name tagged with `job_id`, and
    /// return the references in stem order.
    async fn publish(
        &self,
        output_dir: &Path,
        input_basename: &str,
        job_id: &str,
    ) -> Result<Vec<ResultReference>, PublishError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock Stem Publisher for testing
    pub struct MockStemPublisher {
        references: Vec<ResultReference>,
        fail: bool,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockStemPublisher {
        /// Returns the given references on every publish
        pub fn new(references: Vec<ResultReference>) -> Self {
            Self {
                references,
                fail: false,
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        /// All four stems published under fixed locators
        pub fn new_all_stems() -> Self {
            use crate::domain::Stem;
            Self::new(
                Stem::ALL
                    .iter()
                    .map(|s| ResultReference::new(*s, format!("/stems/test_{s}_0.wav")))
                    .collect(),
            )
        }

        pub fn new_failing() -> Self {
            Self {
                references: Vec::new(),
                fail: true,
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl StemPublisher for MockStemPublisher {
        async fn publish(
            &self,
            _output_dir: &Path,
            _input_basename: &str,
            _job_id: &str,
        ) -> Result<Vec<ResultReference>, PublishError> {
            *self.call_count.lock().unwrap() += 1;
            if self.fail {
                return Err(PublishError::PublicDirUnavailable(
                    "mock publish failure".to_string(),
                ));
            }
            Ok(self.references.clone())
        }
    }
}
