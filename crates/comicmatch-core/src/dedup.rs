use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ingest::ISSUE_COLUMNS;
use crate::models::Record;

pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.85;

/// Two rows of one collection that look like the same comic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub first_index: usize,
    pub second_index: usize,
    pub similarity: f64,
}

/// Rows connected through duplicate pairs. `canonical` is the lowest index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub canonical: usize,
    pub duplicates: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct DuplicateFinder {
    title_similarity_threshold: f64,
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self {
            title_similarity_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl DuplicateFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_threshold(mut self, threshold: f64) -> Self {
        self.title_similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Every pair `i < j` whose titles are close enough and, when the
    /// collection has an issue column, whose issues are equal.
    pub fn find_pairs(&self, records: &[Record]) -> Vec<DuplicatePair> {
        let compare_issues = has_issue_column(records);
        let titles: Vec<String> = records
            .iter()
            .map(|r| r.title.trim().to_lowercase())
            .collect();

        let mut pairs = Vec::new();
        for i in 0..records.len() {
            if titles[i].is_empty() {
                continue;
            }
            for j in (i + 1)..records.len() {
                if titles[j].is_empty() {
                    continue;
                }
                if compare_issues && records[i].issue.trim() != records[j].issue.trim() {
                    continue;
                }

                let similarity = symmetric_jaro_winkler(&titles[i], &titles[j]);
                if similarity >= self.title_similarity_threshold {
                    pairs.push(DuplicatePair {
                        first_index: i,
                        second_index: j,
                        similarity,
                    });
                }
            }
        }

        info!("Found {} potential duplicate pairs in {} records", pairs.len(), records.len());
        pairs
    }

    /// Connected duplicate groups, sorted by canonical index.
    pub fn find_groups(&self, records: &[Record]) -> Vec<DuplicateGroup> {
        group_pairs(records.len(), &self.find_pairs(records))
    }
}

/// Merge pairs into connected components over `size` rows. Pairs naming a
/// row outside `0..size` are skipped.
pub fn group_pairs(size: usize, pairs: &[DuplicatePair]) -> Vec<DuplicateGroup> {
    let (pairs, skipped): (Vec<&DuplicatePair>, Vec<&DuplicatePair>) = pairs
        .iter()
        .partition(|p| p.first_index < size && p.second_index < size);
    if !skipped.is_empty() {
        warn!("Skipped {} duplicate pairs outside {size} rows", skipped.len());
    }

    let mut dsu = DisjointSet::new(size);
    for pair in &pairs {
        dsu.union(pair.first_index, pair.second_index);
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for pair in &pairs {
        for idx in [pair.first_index, pair.second_index] {
            let root = dsu.find(idx);
            components.entry(root).or_default().push(idx);
        }
    }

    let mut groups: Vec<DuplicateGroup> = components
        .into_values()
        .filter_map(|mut indexes| {
            indexes.sort_unstable();
            indexes.dedup();
            let (canonical, rest) = indexes.split_first()?;
            (!rest.is_empty()).then(|| DuplicateGroup {
                canonical: *canonical,
                duplicates: rest.to_vec(),
            })
        })
        .collect();
    groups.sort_by_key(|g| g.canonical);
    groups
}

fn has_issue_column(records: &[Record]) -> bool {
    records
        .iter()
        .any(|r| ISSUE_COLUMNS.iter().any(|column| r.fields.contains_key(*column)))
}

fn symmetric_jaro_winkler(a: &str, b: &str) -> f64 {
    if a <= b {
        strsim::jaro_winkler(a, b)
    } else {
        strsim::jaro_winkler(b, a)
    }
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, left: usize, right: usize) {
        let left_root = self.find(left);
        let right_root = self.find(right);
        if left_root == right_root {
            return;
        }

        match self.rank[left_root].cmp(&self.rank[right_root]) {
            std::cmp::Ordering::Less => self.parent[left_root] = right_root,
            std::cmp::Ordering::Greater => self.parent[right_root] = left_root,
            std::cmp::Ordering::Equal => {
                self.parent[right_root] = left_root;
                self.rank[left_root] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::prepare_records;
    use crate::models::{Fields, Side};

    fn records(rows: &[(&str, &str)]) -> Vec<Record> {
        rows.iter()
            .map(|(title, issue)| Record::new(title, issue, Side::Source))
            .collect()
    }

    #[test]
    fn near_identical_titles_with_same_issue_are_duplicates() {
        let rows = records(&[
            ("Amazing Spider-Man", "300"),
            ("Amazing Spiderman", "300"),
            ("Amazing Spider-Man", "301"),
            ("Hellboy", "300"),
        ]);
        let pairs = DuplicateFinder::new().find_pairs(&rows);

        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].first_index, pairs[0].second_index), (0, 1));
        assert!(pairs[0].similarity >= 0.85);
    }

    #[test]
    fn issues_ignored_without_issue_column() {
        let rows = prepare_records(
            vec![
                Fields::from([("title".to_string(), "Saga".to_string())]),
                Fields::from([("title".to_string(), "SAGA".to_string())]),
            ],
            Side::Source,
        );
        let pairs = DuplicateFinder::new().find_pairs(&rows);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].similarity, 1.0);
    }

    #[test]
    fn empty_titles_are_never_duplicates() {
        let rows = records(&[("", "1"), ("", "1")]);
        assert!(DuplicateFinder::new().find_pairs(&rows).is_empty());
    }

    #[test]
    fn groups_merge_transitive_pairs() {
        let pairs = vec![
            DuplicatePair {
                first_index: 3,
                second_index: 5,
                similarity: 0.9,
            },
            DuplicatePair {
                first_index: 0,
                second_index: 3,
                similarity: 0.9,
            },
            DuplicatePair {
                first_index: 1,
                second_index: 2,
                similarity: 0.95,
            },
        ];
        let groups = group_pairs(6, &pairs);

        assert_eq!(
            groups,
            vec![
                DuplicateGroup {
                    canonical: 0,
                    duplicates: vec![3, 5],
                },
                DuplicateGroup {
                    canonical: 1,
                    duplicates: vec![2],
                },
            ]
        );
    }

    #[test]
    fn out_of_range_pairs_are_skipped() {
        let pairs = vec![
            DuplicatePair {
                first_index: 0,
                second_index: 1,
                similarity: 0.9,
            },
            DuplicatePair {
                first_index: 1,
                second_index: 7,
                similarity: 0.9,
            },
        ];
        assert_eq!(
            group_pairs(2, &pairs),
            vec![DuplicateGroup {
                canonical: 0,
                duplicates: vec![1],
            }]
        );
        assert!(group_pairs(0, &pairs).is_empty());
    }

    #[test]
    fn find_groups_over_records() {
        let rows = records(&[
            ("Batman", "1"),
            ("Superman", "1"),
            ("batman", "1"),
            ("Batman ", "1"),
        ]);
        let groups = DuplicateFinder::new().find_groups(&rows);
        assert_eq!(
            groups,
            vec![DuplicateGroup {
                canonical: 0,
                duplicates: vec![2, 3],
            }]
        );
    }

    #[test]
    fn stricter_threshold_finds_fewer_pairs() {
        let rows = records(&[("Spider-Man", "1"), ("Spider-Men", "1")]);
        assert_eq!(DuplicateFinder::new().find_pairs(&rows).len(), 1);
        assert!(
            DuplicateFinder::new()
                .with_title_threshold(1.0)
                .find_pairs(&rows)
                .is_empty()
        );
    }
}
