use serde::{Deserialize, Serialize};

use super::record::Record;

/// A source/target index pair selected for comparison.
///
/// The two indexes always point into different collections; there is no way
/// to express a same-side pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub source_index: usize,
    pub target_index: usize,
}

impl CandidatePair {
    pub fn new(source_index: usize, target_index: usize) -> Self {
        Self {
            source_index,
            target_index,
        }
    }
}

/// Per-field evidence for one candidate pair. Every score is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub title_sim: f64,
    pub issue_match: f64,
    /// Present only when both records carry a year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_sim: Option<f64>,
}

/// An accepted pair. `similarity` is never below the threshold it was
/// accepted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source_index: usize,
    pub target_index: usize,
    pub similarity: f64,
    pub features: FeatureVector,
    pub source: Record,
    pub target: Record,
}

impl MatchResult {
    pub fn pair(&self) -> CandidatePair {
        CandidatePair::new(self.source_index, self.target_index)
    }
}
