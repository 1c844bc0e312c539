//! Precomputed title-pair similarity scores.
//!
//! Keys are `"<keyA>|<keyB>"` where each side is a title passed through
//! [`hash_key`]. Only one ordering of a pair is ever stored; lookups check
//! both.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::Result;

const KEY_SEPARATORS: [&str; 2] = ["::", "("];

/// Publisher, format and grading words that never distinguish two series.
const BANNED_TERMS: [&str; 19] = [
    "marvel",
    "comics",
    "vol",
    "comic",
    "book",
    "direct",
    "edition",
    "newstand",
    "variant",
    "polybagged",
    "sealed",
    "foil",
    "epilogue",
    "  ",
    "newsstand",
    "vf",
    "nm",
    "condition",
    "unread",
];

static KEY_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]|\d").expect("valid cache key strip regex"));

/// Reduce a raw title to its cache key.
pub fn hash_key(title: &str) -> String {
    let mut key = title.to_lowercase();

    for separator in KEY_SEPARATORS {
        if let Some((head, _)) = key.split_once(separator) {
            key = head.to_string();
        }
    }

    for term in BANNED_TERMS {
        if key.contains(term) {
            key = key.replace(term, "");
        }
    }

    KEY_STRIP_RE.replace_all(&key, "").trim().to_lowercase()
}

fn pair_key(key_a: &str, key_b: &str) -> String {
    format!("{key_a}|{key_b}")
}

/// Title-pair score store shared by all comparator calls of a run.
///
/// Reads may run concurrently; updates are serialized by the lock.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    entries: RwLock<HashMap<String, f64>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<String, f64>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Best-effort load. Any failure is logged and yields an empty cache.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("similarity cache {} does not exist, starting empty", path.display());
            return Self::new();
        }

        match Self::try_load(path) {
            Ok(cache) => {
                info!("Loaded {} pre-computed fuzzy matches from {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                warn!("Error loading similarity cache {}: {e}", path.display());
                Self::new()
            }
        }
    }

    /// Strict load, for callers that want the failure.
    pub fn try_load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let entries: HashMap<String, f64> = serde_json::from_str(&contents)?;
        Ok(Self::from_entries(entries))
    }

    /// Score stored for the pair, in either order.
    pub fn lookup(&self, title_a: &str, title_b: &str) -> Option<f64> {
        let entries = self.read();
        if entries.is_empty() {
            return None;
        }

        let key_a = hash_key(title_a);
        let key_b = hash_key(title_b);
        entries
            .get(&pair_key(&key_a, &key_b))
            .or_else(|| entries.get(&pair_key(&key_b, &key_a)))
            .copied()
    }

    /// Record a score for the pair under the `A|B` ordering only.
    ///
    /// Pairs where either side cleans to an empty key are ignored.
    pub fn update(&self, title_a: &str, title_b: &str, score: f64) {
        if !score.is_finite() {
            warn!("ignoring non-finite similarity {score} for '{title_a}' / '{title_b}'");
            return;
        }

        let key_a = hash_key(title_a);
        let key_b = hash_key(title_b);
        if key_a.is_empty() || key_b.is_empty() {
            return;
        }

        let mut entries = self.write();
        if key_a != key_b {
            entries.remove(&pair_key(&key_b, &key_a));
        }
        entries.insert(pair_key(&key_a, &key_b), score.clamp(0.0, 1.0));
    }

    /// Overwrite `path` with the current entries, sorted by key.
    pub fn persist_to(&self, path: &Path) -> Result<usize> {
        let snapshot: BTreeMap<String, f64> = self
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;

        info!("Saved {} fuzzy hash entries to {}", snapshot.len(), path.display());
        Ok(snapshot.len())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, f64>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, f64>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
