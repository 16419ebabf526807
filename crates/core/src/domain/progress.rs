// Progress Snapshot - per-stem completion record

use serde::{Deserialize, Serialize};

use crate::domain::Stem;

/// Complete per-stem progress mapping at a point in time.
///
/// A fixed enumeration-keyed record, not an open map: the stem set is
/// known in advance (ADR-010). Values are fractions in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub drums: f64,
    pub bass: f64,
    pub other: f64,
    pub vocals: f64,
}

impl ProgressSnapshot {
    /// All stems at 0.0 (job start)
    pub fn zero() -> Self {
        Self {
            drums: 0.0,
            bass: 0.0,
            other: 0.0,
            vocals: 0.0,
        }
    }

    pub fn get(&self, stem: Stem) -> f64 {
        match stem {
            Stem::Drums => self.drums,
            Stem::Bass => self.bass,
            Stem::Other => self.other,
            Stem::Vocals => self.vocals,
        }
    }

    /// Overwrite one stem's fraction, clamped to [0, 1].
    ///
    /// Out-of-range values are clamped rather than rejected: the
    /// parser's numeric extraction is best-effort.
    pub fn set(&mut self, stem: Stem, value: f64) {
        let value = value.clamp(0.0, 1.0);
        match stem {
            Stem::Drums => self.drums = value,
            Stem::Bass => self.bass = value,
            Stem::Other => self.other = value,
            Stem::Vocals => self.vocals = value,
        }
    }

    /// Apply one combined fraction uniformly to every stem.
    ///
    /// The separator reports a single combined figure, not per-stem
    /// figures; this is the external tool's contract, preserved here.
    pub fn set_all(&mut self, value: f64) {
        for stem in Stem::ALL {
            self.set(stem, value);
        }
    }

    pub fn is_complete(&self) -> bool {
        Stem::ALL.iter().all(|s| self.get(*s) >= 1.0)
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_snapshot() {
        let snap = ProgressSnapshot::zero();
        for stem in Stem::ALL {
            assert_eq!(snap.get(stem), 0.0);
        }
        assert!(!snap.is_complete());
    }

    #[test]
    fn test_set_clamps_out_of_range() {
        let mut snap = ProgressSnapshot::zero();
        snap.set(Stem::Drums, 1.5);
        assert_eq!(snap.get(Stem::Drums), 1.0);
        snap.set(Stem::Drums, -0.3);
        assert_eq!(snap.get(Stem::Drums), 0.0);
    }

    #[test]
    fn test_set_all_uniform() {
        let mut snap = ProgressSnapshot::zero();
        snap.set_all(0.45);
        for stem in Stem::ALL {
            assert_eq!(snap.get(stem), 0.45);
        }
    }

    #[test]
    fn test_complete() {
        let mut snap = ProgressSnapshot::zero();
        snap.set_all(1.0);
        assert!(snap.is_complete());
    }

    #[test]
    fn test_serialization_shape() {
        let mut snap = ProgressSnapshot::zero();
        snap.set(Stem::Vocals, 0.5);
        let json = serde_json::to_value(snap).unwrap();
        assert_eq!(json["drums"], 0.0);
        assert_eq!(json["vocals"], 0.5);
    }
}
