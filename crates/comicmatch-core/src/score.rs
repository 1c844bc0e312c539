use serde::{Deserialize, Serialize};

use crate::models::FeatureVector;

/// Per-feature weights for the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub title: f64,
    pub issue: f64,
    pub year: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: 0.5,
            issue: 0.5,
            year: 0.2,
        }
    }
}

impl Weights {
    /// Negative or non-finite weights become zero.
    pub fn clamped(self) -> Self {
        Self {
            title: non_negative(self.title),
            issue: non_negative(self.issue),
            year: non_negative(self.year),
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Weighted mean over the features present in `features`.
///
/// A missing year shrinks the divisor instead of counting as zero. Returns
/// 0.0 when every present feature carries zero weight.
pub fn aggregate(features: &FeatureVector, weights: &Weights) -> f64 {
    let mut total = features.title_sim * weights.title + features.issue_match * weights.issue;
    let mut divisor = weights.title + weights.issue;

    if let Some(year_sim) = features.year_sim {
        total += year_sim * weights.year;
        divisor += weights.year;
    }

    if divisor <= 0.0 {
        return 0.0;
    }
    total / divisor
}

/// Acceptance is inclusive: a score equal to the threshold passes.
pub fn accept(score: f64, threshold: f64) -> bool {
    score >= threshold
}
