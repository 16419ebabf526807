// Stem Enumeration
// The separator tool always produces this fixed set of output channels.

use serde::{Deserialize, Serialize};

/// One isolated audio channel produced by source separation.
///
/// The set is fixed and known in advance, so progress and results are
/// keyed by this enum rather than an open-ended string map (ADR-010).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    Drums,
    Bass,
    Other,
    Vocals,
}

impl Stem {
    /// All stems, in the order the separator documents them
    pub const ALL: [Stem; 4] = [Stem::Drums, Stem::Bass, Stem::Other, Stem::Vocals];

    /// Wire/file name for this stem
    pub fn as_str(&self) -> &'static str {
        match self {
            Stem::Drums => "drums",
            Stem::Bass => "bass",
            Stem::Other => "other",
            Stem::Vocals => "vocals",
        }
    }

    /// Output file name the separator writes for this stem
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.as_str(), extension)
    }
}

impl std::fmt::Display for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
