// Filesystem stem publisher (Result Collector adapter)
// Copies separator artifacts into the public stems directory under
// collision-resistant generated names.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use stemflow_core::domain::{ResultReference, Stem};
use stemflow_core::port::{PublishError, StemPublisher, TimeProvider};

/// Model directory the Demucs CLI nests its results under.
/// Layout contract (must match the tool exactly):
/// `<outputDir>/htdemucs/<basenameWithoutExt>/<stem>.wav`
pub const MODEL_DIR_NAME: &str = "htdemucs";

/// Extension of the artifacts the tool writes
pub const STEM_FILE_EXTENSION: &str = "wav";

/// Fixed public route prefix result locators are rooted at
pub const PUBLIC_ROUTE_PREFIX: &str = "/stems";

/// Publisher that copies stem artifacts into `public_dir`, served
/// statically under [`PUBLIC_ROUTE_PREFIX`].
pub struct FsStemPublisher {
    public_dir: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
}

impl FsStemPublisher {
    pub fn new(public_dir: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            public_dir: public_dir.into(),
            time_provider,
        }
    }

    /// Generated artifact name: basename + stem + creation timestamp,
    /// plus a short job nonce so two jobs publishing identically-named
    /// inputs in the same millisecond still never collide.
    fn published_name(&self, basename: &str, stem: Stem, timestamp: i64, job_id: &str) -> String {
        let nonce: String = job_id.chars().filter(|c| *c != '-').take(8).collect();
        format!("{basename}_{stem}_{timestamp}_{nonce}.{STEM_FILE_EXTENSION}")
    }
}

#[async_trait]
impl StemPublisher for FsStemPublisher {
    async fn publish(
        &self,
        output_dir: &Path,
        input_basename: &str,
        job_id: &str,
    ) -> Result<Vec<ResultReference>, PublishError> {
        fs::create_dir_all(&self.public_dir)
            .await
            .map_err(|e| PublishError::PublicDirUnavailable(e.to_string()))?;

        let result_dir = output_dir.join(MODEL_DIR_NAME).join(input_basename);
        debug!(result_dir = %result_dir.display(), "Collecting stem artifacts");

        let timestamp = self.time_provider.now_millis();
        let mut references = Vec::new();

        for stem in Stem::ALL {
            let source = result_dir.join(stem.file_name(STEM_FILE_EXTENSION));

            // A missing stem is not a job-level failure: skip it
            if fs::metadata(&source).await.is_err() {
                debug!(job_id = %job_id, stem = %stem, "Stem artifact missing, skipping");
                continue;
            }

            let name = self.published_name(input_basename, stem, timestamp, job_id);
            let destination = self.public_dir.join(&name);

            if let Err(e) = fs::copy(&source, &destination).await {
                warn!(
                    job_id = %job_id,
                    stem = %stem,
                    error = %e,
                    "Failed to publish stem artifact, skipping"
                );
                continue;
            }

            references.push(ResultReference::new(
                stem,
                format!("{PUBLIC_ROUTE_PREFIX}/{name}"),
            ));
        }

        info!(
            job_id = %job_id,
            collected = references.len(),
            "Stem artifacts published"
        );
        Ok(references)
    }
}
