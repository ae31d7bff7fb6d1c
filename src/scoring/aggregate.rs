//! Weighted score aggregation and CEFR level classification.
//!
//! ```text
//! verbal      = mean(fluency, vocabulary, structure)
//! paraverbal  = mean(pitch, pace, energy)
//! total       = 0.4 × verbal + 0.3 × paraverbal + 0.3 × originality
//! ```
//!
//! | total ≥ | verbal ≥ | level |
//! |---------|----------|-------|
//! | 90 | 85 | C2 |
//! | 80 | 75 | C1 |
//! | 70 | 65 | B2 |
//! | 55 | 50 | B1 |
//! | 40 | 35 | A2 |
//! | else | | A1 |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::stats::clamp_score;

pub const VERBAL_WEIGHT: f64 = 0.4;
pub const PARAVERBAL_WEIGHT: f64 = 0.3;
pub const ORIGINALITY_WEIGHT: f64 = 0.3;

// ---------------------------------------------------------------------------
// SubScores
// ---------------------------------------------------------------------------

/// The seven independent scores of one evaluation, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub fluency: f64,
    pub vocabulary: f64,
    pub structure: f64,
    pub pitch: f64,
    pub pace: f64,
    pub energy: f64,
    pub originality: f64,
}

impl SubScores {
    /// Clamp every field into `[0, 100]`.
    pub fn clamped(self) -> Self {
        Self {
            fluency: clamp_score(self.fluency),
            vocabulary: clamp_score(self.vocabulary),
            structure: clamp_score(self.structure),
            pitch: clamp_score(self.pitch),
            pace: clamp_score(self.pace),
            energy: clamp_score(self.energy),
            originality: clamp_score(self.originality),
        }
    }

    pub fn verbal_score(&self) -> f64 {
        (self.fluency + self.vocabulary + self.structure) / 3.0
    }

    pub fn paraverbal_score(&self) -> f64 {
        (self.pitch + self.pace + self.energy) / 3.0
    }

    pub fn total_score(&self) -> f64 {
        VERBAL_WEIGHT * self.verbal_score()
            + PARAVERBAL_WEIGHT * self.paraverbal_score()
            + ORIGINALITY_WEIGHT * self.originality
    }
}

// ---------------------------------------------------------------------------
// CefrLevel
// ---------------------------------------------------------------------------

/// Common European Framework of Reference level, ordered `A1 < … < C2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

/// `(level, min total, min verbal)`, highest tier first.
const LEVEL_TABLE: [(CefrLevel, f64, f64); 5] = [
    (CefrLevel::C2, 90.0, 85.0),
    (CefrLevel::C1, 80.0, 75.0),
    (CefrLevel::B2, 70.0, 65.0),
    (CefrLevel::B1, 55.0, 50.0),
    (CefrLevel::A2, 40.0, 35.0),
];

impl CefrLevel {
    /// First tier whose two thresholds both hold; `A1` otherwise.
    pub fn classify(total_score: f64, verbal_score: f64) -> Self {
        LEVEL_TABLE
            .iter()
            .find(|(_, min_total, min_verbal)| {
                total_score >= *min_total && verbal_score >= *min_verbal
            })
            .map_or(CefrLevel::A1, |(level, _, _)| *level)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
