//! End-to-end matching: ingest, index, compare, aggregate, accept.

use std::path::Path;

use rayon::prelude::*;
use tracing::{error, info};

use crate::cache::SimilarityCache;
use crate::compare::{compare_normalized_issues, compare_titles, compare_year_values};
use crate::config::AppConfig;
use crate::index::{
    BlockPredicate, CandidateIndexer, DEFAULT_BLOCK_PREDICATES, DEFAULT_ISSUE_WINDOW,
    DEFAULT_TITLE_WINDOW, IndexStrategy,
};
use crate::ingest::prepare_records;
use crate::models::{CandidatePair, FeatureVector, Fields, MatchResult, Record, Side};
use crate::score::{Weights, accept, aggregate};

/// Settings for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub threshold: f64,
    pub best_match_threshold: f64,
    pub strategy: IndexStrategy,
    pub predicates: Vec<BlockPredicate>,
    pub title_window: usize,
    pub issue_window: usize,
    pub weights: Weights,
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            best_match_threshold: 0.5,
            strategy: IndexStrategy::Block,
            predicates: DEFAULT_BLOCK_PREDICATES.to_vec(),
            title_window: DEFAULT_TITLE_WINDOW,
            issue_window: DEFAULT_ISSUE_WINDOW,
            weights: Weights::default(),
            parallel: true,
        }
    }
}

impl MatchConfig {
    pub fn with_strategy(mut self, strategy: IndexStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Thresholds pinned to `[0, 1]`, weights to `>= 0`.
    pub fn clamped(mut self) -> Self {
        self.threshold = clamp_unit(self.threshold);
        self.best_match_threshold = clamp_unit(self.best_match_threshold);
        self.weights = self.weights.clamped();
        self
    }

    fn indexer(&self, strategy: IndexStrategy) -> CandidateIndexer {
        CandidateIndexer::new(strategy)
            .with_predicates(self.predicates.clone())
            .with_windows(self.title_window, self.issue_window)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[derive(Debug, Default)]
pub struct MatchEngine {
    config: MatchConfig,
    cache: SimilarityCache,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config: config.clamped(),
            cache: SimilarityCache::new(),
        }
    }

    pub fn with_cache(mut self, cache: SimilarityCache) -> Self {
        self.cache = cache;
        self
    }

    /// Engine configured from `config`, with its similarity cache loaded if
    /// one is named.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let engine = Self::new(config.match_config());
        match &config.cache.path {
            Some(path) => engine.with_cache(SimilarityCache::load_from(path)),
            None => engine,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }

    // ─── Matching ──────────────────────────────────────────

    /// Match two raw collections.
    pub fn match_collections(&self, source: Vec<Fields>, target: Vec<Fields>) -> Vec<MatchResult> {
        let source = prepare_records(source, Side::Source);
        let target = prepare_records(target, Side::Target);
        self.match_records(&source, &target)
    }

    /// Accepted pairs, sorted by `(source_index, target_index)`.
    pub fn match_records(&self, source: &[Record], target: &[Record]) -> Vec<MatchResult> {
        let indexer = self.config.indexer(self.config.strategy);
        let results = self.run(&indexer, source, target, self.config.threshold);
        info!(
            "Accepted {} matches at threshold {:.2}",
            results.len(),
            self.config.threshold
        );
        results
    }

    /// Highest-scoring candidate for a single record, compared against
    /// every candidate. Ties keep the earliest candidate.
    pub fn find_best_match(&self, record: &Fields, candidates: &[Fields]) -> Option<MatchResult> {
        let source = prepare_records(vec![record.clone()], Side::Source);
        let target = prepare_records(candidates.to_vec(), Side::Target);
        let indexer = self.config.indexer(IndexStrategy::Full);

        self.run(&indexer, &source, &target, self.config.best_match_threshold)
            .into_iter()
            .reduce(|best, result| {
                if result.similarity > best.similarity {
                    result
                } else {
                    best
                }
            })
    }

    /// Feature vector for one pair.
    pub fn score_pair(&self, source: &Record, target: &Record) -> FeatureVector {
        let title_sim = compare_titles(&self.cache, &source.title, &target.title);
        let issue_match = compare_normalized_issues(
            source.normalized_issue.as_deref(),
            target.normalized_issue.as_deref(),
        );
        let year_sim = compare_year_values(source.year, target.year);

        FeatureVector {
            title_sim,
            issue_match,
            year_sim,
        }
    }

    fn run(
        &self,
        indexer: &CandidateIndexer,
        source: &[Record],
        target: &[Record],
        threshold: f64,
    ) -> Vec<MatchResult> {
        if source.is_empty() || target.is_empty() {
            return Vec::new();
        }

        let pairs = indexer.candidates(source, target);
        info!("Comparing {} candidate pairs ({} indexing)", pairs.len(), indexer.strategy());

        let evaluate = |pair: &CandidatePair| self.evaluate(source, target, *pair, threshold);
        let mut results: Vec<MatchResult> = if self.config.parallel {
            pairs.par_iter().filter_map(evaluate).collect()
        } else {
            pairs.iter().filter_map(evaluate).collect()
        };

        results.sort_by_key(MatchResult::pair);
        results
    }

    fn evaluate(
        &self,
        source: &[Record],
        target: &[Record],
        pair: CandidatePair,
        threshold: f64,
    ) -> Option<MatchResult> {
        let source_record = source.get(pair.source_index)?;
        let target_record = target.get(pair.target_index)?;

        let features = self.score_pair(source_record, target_record);
        let similarity = aggregate(&features, &self.config.weights);
        if !accept(similarity, threshold) {
            return None;
        }

        Some(MatchResult {
            source_index: pair.source_index,
            target_index: pair.target_index,
            similarity,
            features,
            source: source_record.clone(),
            target: target_record.clone(),
        })
    }

    // ─── Cache maintenance ─────────────────────────────────

    pub fn update_cache(&self, title_a: &str, title_b: &str, score: f64) {
        self.cache.update(title_a, title_b, score);
    }

    /// Write the cache to `path`. Failures are logged and leave the cache
    /// untouched.
    pub fn persist_cache(&self, path: &Path) -> bool {
        match self.cache.persist_to(path) {
            Ok(_) => true,
            Err(e) => {
                error!("Error saving similarity cache {}: {e}", path.display());
                false
            }
        }
    }
}
