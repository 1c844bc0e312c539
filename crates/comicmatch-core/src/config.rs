use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::MatchConfig;
use crate::error::Result;
use crate::index::{BlockPredicate, DEFAULT_BLOCK_PREDICATES, DEFAULT_ISSUE_WINDOW, DEFAULT_TITLE_WINDOW, IndexStrategy};
use crate::score::Weights;

/// Root configuration, loaded from `~/.config/comicmatch/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub matching: MatchingConfig,
    pub weights: Weights,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub best_match_threshold: f64,
    pub indexer: IndexStrategy,
    pub block_predicates: Vec<BlockPredicate>,
    pub title_window: usize,
    pub issue_window: usize,
    pub parallel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Similarity cache file loaded at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Write the cache back to `path` after a `match` run.
    pub save_on_exit: bool,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            best_match_threshold: 0.5,
            indexer: IndexStrategy::Block,
            block_predicates: DEFAULT_BLOCK_PREDICATES.to_vec(),
            title_window: DEFAULT_TITLE_WINDOW,
            issue_window: DEFAULT_ISSUE_WINDOW,
            parallel: true,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path, overridable with `COMICMATCH_CONFIG`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("COMICMATCH_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("comicmatch")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Engine settings derived from this file, clamped to valid ranges.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            threshold: self.matching.threshold,
            best_match_threshold: self.matching.best_match_threshold,
            strategy: self.matching.indexer,
            predicates: self.matching.block_predicates.clone(),
            title_window: self.matching.title_window,
            issue_window: self.matching.issue_window,
            weights: self.weights,
            parallel: self.matching.parallel,
        }
        .clamped()
    }
}
