// Result Reference - published output artifact pointer

use serde::{Deserialize, Serialize};

use crate::domain::Stem;

/// Stable, collision-resistant pointer to a published stem artifact.
///
/// Immutable once created; lifetime bounded by the retention window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReference {
    /// Which stem this artifact holds
    pub stem: Stem,
    /// Caller-facing locator, e.g. "/stems/song_drums_1717171717000_a1b2c3d4.wav"
    pub locator: String,
}

impl ResultReference {
    pub fn new(stem: Stem, locator: impl Into<String>) -> Self {
        Self {
            stem,
            locator: locator.into(),
        }
    }
}
