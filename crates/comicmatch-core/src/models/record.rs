use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ingest;

/// Original columns of one input row, keyed by column name.
pub type Fields = BTreeMap<String, String>;

/// Which collection a record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured pieces of a raw title. An empty string means "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleComponents {
    pub main_title: String,
    pub volume: String,
    pub year: String,
    pub subtitle: String,
    pub special: String,
    pub clean_title: String,
}

impl TitleComponents {
    /// Component names paired with their values, in display order.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("main_title", &self.main_title),
            ("volume", &self.volume),
            ("year", &self.year),
            ("subtitle", &self.subtitle),
            ("special", &self.special),
            ("clean_title", &self.clean_title),
        ]
    }
}

/// One ingested row, normalized once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub issue: String,
    #[serde(rename = "source_tag")]
    pub side: Side,
    pub parsed: TitleComponents,
    pub normalized_issue: Option<String>,
    /// Title year, or a year recovered from a date column.
    pub year: Option<i32>,
    pub publisher: String,
    /// Every column of the input row, kept for export.
    pub fields: Fields,
}

impl Record {
    /// Build a record from just a title and an issue.
    pub fn new(title: &str, issue: &str, side: Side) -> Self {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), title.to_string());
        fields.insert("issue".to_string(), issue.to_string());
        ingest::prepare_record(fields, side)
    }

    pub fn source_tag(&self) -> &'static str {
        self.side.as_str()
    }

    /// Lowercased main title, the key used by blocking strategies.
    pub fn block_title(&self) -> String {
        self.parsed.main_title.trim().to_lowercase()
    }
}
