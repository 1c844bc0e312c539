pub mod record;
pub mod result;

pub use record::{Fields, Record, Side, TitleComponents};
pub use result::{CandidatePair, FeatureVector, MatchResult};
