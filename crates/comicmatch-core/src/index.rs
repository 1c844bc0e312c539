//! Candidate-pair generation.
//!
//! Indexing only decides which pairs get scored; it never accepts a match on
//! its own. Every strategy returns deduplicated pairs sorted by
//! `(source_index, target_index)`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MatchError;
use crate::models::{CandidatePair, Record};
use crate::parser::series_key;

pub const DEFAULT_TITLE_WINDOW: usize = 3;
pub const DEFAULT_ISSUE_WINDOW: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexStrategy {
    /// Every source/target pair.
    #[serde(rename = "full", alias = "fullindex")]
    Full,
    /// Union of equality blocks over normalized fields.
    #[default]
    #[serde(rename = "block")]
    Block,
    /// Sliding window over sorted keys.
    #[serde(rename = "sortedneighbourhood", alias = "sorted-neighbourhood")]
    SortedNeighbourhood,
}

impl IndexStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Block => "block",
            Self::SortedNeighbourhood => "sortedneighbourhood",
        }
    }
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexStrategy {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "fullindex" => Ok(Self::Full),
            "block" => Ok(Self::Block),
            "sortedneighbourhood" | "sorted-neighbourhood" => Ok(Self::SortedNeighbourhood),
            other => Err(MatchError::Config(format!("unknown indexer: {other}"))),
        }
    }
}

/// Equality predicates available to the `block` strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPredicate {
    /// Same first character of the lowercased main title.
    FirstLetter,
    /// Same normalized issue; skipped for records without one.
    Issue,
    /// Same coarse series key.
    SeriesKey,
}

impl BlockPredicate {
    fn key(self, record: &Record) -> Option<String> {
        match self {
            Self::FirstLetter => record.block_title().chars().next().map(String::from),
            Self::Issue => record.normalized_issue.clone(),
            Self::SeriesKey => Some(series_key(&record.title)).filter(|k| !k.is_empty()),
        }
    }
}

pub const DEFAULT_BLOCK_PREDICATES: [BlockPredicate; 2] =
    [BlockPredicate::FirstLetter, BlockPredicate::Issue];

#[derive(Debug, Clone)]
pub struct CandidateIndexer {
    strategy: IndexStrategy,
    predicates: Vec<BlockPredicate>,
    title_window: usize,
    issue_window: usize,
}

impl Default for CandidateIndexer {
    fn default() -> Self {
        Self::new(IndexStrategy::default())
    }
}

impl CandidateIndexer {
    pub fn new(strategy: IndexStrategy) -> Self {
        Self {
            strategy,
            predicates: DEFAULT_BLOCK_PREDICATES.to_vec(),
            title_window: DEFAULT_TITLE_WINDOW,
            issue_window: DEFAULT_ISSUE_WINDOW,
        }
    }

    pub fn with_predicates(mut self, predicates: Vec<BlockPredicate>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn with_windows(mut self, title_window: usize, issue_window: usize) -> Self {
        self.title_window = title_window;
        self.issue_window = issue_window;
        self
    }

    pub fn strategy(&self) -> IndexStrategy {
        self.strategy
    }

    /// Pairs worth scoring between `source` and `target`.
    pub fn candidates(&self, source: &[Record], target: &[Record]) -> Vec<CandidatePair> {
        let pairs = match self.strategy {
            IndexStrategy::Full => full_pairs(source.len(), target.len()),
            IndexStrategy::Block => {
                let mut pairs = BTreeSet::new();
                for predicate in &self.predicates {
                    block_pairs(source, target, |r| predicate.key(r), &mut pairs);
                }
                pairs.into_iter().collect()
            }
            IndexStrategy::SortedNeighbourhood => {
                let mut pairs = BTreeSet::new();
                windowed_pairs(
                    source,
                    target,
                    |r| Some(r.block_title()).filter(|k| !k.is_empty()),
                    self.title_window,
                    &mut pairs,
                );
                windowed_pairs(
                    source,
                    target,
                    |r| r.normalized_issue.clone(),
                    self.issue_window,
                    &mut pairs,
                );
                pairs.into_iter().collect()
            }
        };

        debug!(
            "{} indexer produced {} candidate pairs from {}x{} records",
            self.strategy,
            pairs.len(),
            source.len(),
            target.len()
        );
        pairs
    }
}

fn full_pairs(source_len: usize, target_len: usize) -> Vec<CandidatePair> {
    let mut pairs = Vec::with_capacity(source_len.saturating_mul(target_len));
    for source_index in 0..source_len {
        for target_index in 0..target_len {
            pairs.push(CandidatePair::new(source_index, target_index));
        }
    }
    pairs
}

fn block_pairs<F>(source: &[Record], target: &[Record], key: F, pairs: &mut BTreeSet<CandidatePair>)
where
    F: Fn(&Record) -> Option<String>,
{
    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for (target_index, record) in target.iter().enumerate() {
        if let Some(k) = key(record) {
            buckets.entry(k).or_default().push(target_index);
        }
    }

    for (source_index, record) in source.iter().enumerate() {
        if let Some(k) = key(record)
            && let Some(targets) = buckets.get(&k)
        {
            for target_index in targets {
                pairs.insert(CandidatePair::new(source_index, *target_index));
            }
        }
    }
}

/// Pairs whose keys sit within `window` positions of each other in the
/// sorted list of distinct keys from both sides.
fn windowed_pairs<F>(
    source: &[Record],
    target: &[Record],
    key: F,
    window: usize,
    pairs: &mut BTreeSet<CandidatePair>,
) where
    F: Fn(&Record) -> Option<String>,
{
    let source_keys: Vec<Option<String>> = source.iter().map(&key).collect();
    let target_keys: Vec<Option<String>> = target.iter().map(&key).collect();

    let mut sorted: Vec<&str> = source_keys
        .iter()
        .chain(target_keys.iter())
        .flatten()
        .map(String::as_str)
        .collect();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.is_empty() {
        return;
    }

    let mut targets_by_rank: Vec<Vec<usize>> = vec![Vec::new(); sorted.len()];
    for (target_index, k) in target_keys.iter().enumerate() {
        if let Some(k) = k
            && let Ok(rank) = sorted.binary_search(&k.as_str())
        {
            targets_by_rank[rank].push(target_index);
        }
    }

    let last_rank = sorted.len() - 1;
    for (source_index, k) in source_keys.iter().enumerate() {
        let Some(rank) = k.as_deref().and_then(|k| sorted.binary_search(&k).ok()) else {
            continue;
        };
        let low = rank.saturating_sub(window);
        let high = rank.saturating_add(window).min(last_rank);
        for bucket in &targets_by_rank[low..=high] {
            for target_index in bucket {
                pairs.insert(CandidatePair::new(source_index, *target_index));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::Side;

    fn records(rows: &[(&str, &str)], side: Side) -> Vec<Record> {
        rows.iter()
            .map(|(title, issue)| Record::new(title, issue, side))
            .collect()
    }

    fn as_set(pairs: Vec<CandidatePair>) -> BTreeSet<(usize, usize)> {
        pairs
            .into_iter()
            .map(|p| (p.source_index, p.target_index))
            .collect()
    }

    fn fixture() -> (Vec<Record>, Vec<Record>) {
        let source = records(&[("Batman", "1"), ("Superman", "2")], Side::Source);
        let target = records(
            &[
                ("Batgirl", "5"),
                ("Spawn", "1"),
                ("Wonder Woman", "2"),
                ("Superboy", "9"),
            ],
            Side::Target,
        );
        (source, target)
    }

    #[test]
    fn full_emits_every_cross_pair() {
        let (source, target) = fixture();
        let pairs = CandidateIndexer::new(IndexStrategy::Full).candidates(&source, &target);
        assert_eq!(pairs.len(), 8);
        assert_eq!(pairs[0], CandidatePair::new(0, 0));
        assert_eq!(pairs[7], CandidatePair::new(1, 3));
    }

    #[test]
    fn block_is_union_of_predicates() {
        let (source, target) = fixture();
        let letter_only = CandidateIndexer::new(IndexStrategy::Block)
            .with_predicates(vec![BlockPredicate::FirstLetter])
            .candidates(&source, &target);
        let issue_only = CandidateIndexer::new(IndexStrategy::Block)
            .with_predicates(vec![BlockPredicate::Issue])
            .candidates(&source, &target);
        let both = CandidateIndexer::new(IndexStrategy::Block).candidates(&source, &target);

        assert_eq!(as_set(letter_only.clone()), BTreeSet::from([(0, 0), (1, 1), (1, 3)]));
        assert_eq!(as_set(issue_only.clone()), BTreeSet::from([(0, 1), (1, 2)]));

        let union: BTreeSet<_> = as_set(letter_only).union(&as_set(issue_only)).copied().collect();
        assert_eq!(as_set(both), union);
    }

    #[test]
    fn full_is_superset_of_block() {
        let (source, target) = fixture();
        let full = as_set(CandidateIndexer::new(IndexStrategy::Full).candidates(&source, &target));
        let block = as_set(CandidateIndexer::new(IndexStrategy::Block).candidates(&source, &target));
        assert!(block.is_subset(&full));
        assert!(block.len() < full.len());
    }

    #[test]
    fn issue_predicate_skips_records_without_issue() {
        let source = records(&[("Zatanna", "Annual"), ("Zatanna", "3")], Side::Source);
        let target = records(&[("Batman", ""), ("Robin", "3")], Side::Target);
        let pairs = CandidateIndexer::new(IndexStrategy::Block)
            .with_predicates(vec![BlockPredicate::Issue])
            .candidates(&source, &target);
        assert_eq!(pairs, vec![CandidatePair::new(1, 1)]);
    }

    #[test]
    fn empty_main_title_forms_no_block() {
        let source = records(&[("", "")], Side::Source);
        let target = records(&[("", ""), ("Batman", "")], Side::Target);
        let pairs = CandidateIndexer::new(IndexStrategy::Block).candidates(&source, &target);
        assert!(pairs.is_empty());
    }

    #[test]
    fn series_key_predicate_groups_x_titles() {
        let source = records(&[("The Uncanny X-Men", "")], Side::Source);
        let target = records(&[("X-Men: Legacy", ""), ("Excalibur", "")], Side::Target);
        let pairs = CandidateIndexer::new(IndexStrategy::Block)
            .with_predicates(vec![BlockPredicate::SeriesKey])
            .candidates(&source, &target);
        assert_eq!(pairs, vec![CandidatePair::new(0, 0)]);
    }

    #[test]
    fn sorted_neighbourhood_title_window() {
        let source = records(&[("Alpha", "")], Side::Source);
        let target = records(
            &[("Alpha", ""), ("Beta", ""), ("Charlie", ""), ("Delta", ""), ("Echo", "")],
            Side::Target,
        );
        let pairs =
            CandidateIndexer::new(IndexStrategy::SortedNeighbourhood).candidates(&source, &target);
        assert_eq!(as_set(pairs), BTreeSet::from([(0, 0), (0, 1), (0, 2), (0, 3)]));
    }

    #[test]
    fn sorted_neighbourhood_issue_window_is_unioned() {
        let source = records(&[("Zzz", "5")], Side::Source);
        let target = records(
            &[("Aaa", "4"), ("Bbb", "5"), ("Ccc", "6"), ("Ddd", "7")],
            Side::Target,
        );
        let pairs = CandidateIndexer::new(IndexStrategy::SortedNeighbourhood)
            .with_windows(0, 1)
            .candidates(&source, &target);
        assert_eq!(as_set(pairs), BTreeSet::from([(0, 0), (0, 1), (0, 2)]));
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let source = records(&[("Batman", "1"), ("Batman", "1")], Side::Source);
        let target = records(&[("Batman", "1"), ("Batgirl", "1")], Side::Target);
        for strategy in [IndexStrategy::Full, IndexStrategy::Block, IndexStrategy::SortedNeighbourhood] {
            let pairs = CandidateIndexer::new(strategy).candidates(&source, &target);
            let mut expected = pairs.clone();
            expected.sort();
            expected.dedup();
            assert_eq!(pairs, expected, "{strategy}");
            assert_eq!(pairs.len(), 4, "{strategy}");
        }
    }

    #[test]
    fn empty_inputs_produce_no_pairs() {
        let (source, _) = fixture();
        for strategy in [IndexStrategy::Full, IndexStrategy::Block, IndexStrategy::SortedNeighbourhood] {
            assert!(CandidateIndexer::new(strategy).candidates(&source, &[]).is_empty());
            assert!(CandidateIndexer::new(strategy).candidates(&[], &source).is_empty());
        }
    }

    #[test]
    fn strategy_parsing_accepts_aliases() {
        assert_eq!("fullindex".parse::<IndexStrategy>().unwrap(), IndexStrategy::Full);
        assert_eq!("Block".parse::<IndexStrategy>().unwrap(), IndexStrategy::Block);
        assert_eq!(
            "sorted-neighbourhood".parse::<IndexStrategy>().unwrap(),
            IndexStrategy::SortedNeighbourhood
        );
        assert!("nearest".parse::<IndexStrategy>().is_err());
    }
}
