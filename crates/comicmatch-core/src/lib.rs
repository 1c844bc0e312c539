//! comicmatch core: comic title parsing, candidate indexing and record matching.

pub mod error;
pub mod config;
pub mod models;
pub mod parser;
pub mod ingest;
pub mod cache;
pub mod compare;
pub mod index;
pub mod score;
pub mod engine;
pub mod dedup;
pub mod io;

pub use error::{MatchError, Result};
pub use config::AppConfig;
pub use models::{CandidatePair, FeatureVector, Fields, MatchResult, Record, Side, TitleComponents};
pub use cache::SimilarityCache;
pub use index::{BlockPredicate, CandidateIndexer, IndexStrategy};
pub use score::Weights;
pub use engine::{MatchConfig, MatchEngine};
pub use dedup::{DuplicateFinder, DuplicateGroup, DuplicatePair};
