//! File loaders and exporters. These are the only fallible collaborators
//! around the matching pipeline.

pub mod export;
pub mod load;

pub use export::{export_duplicates, export_matches};
pub use load::{load_records, parse_json_records};

use std::path::Path;

use crate::error::{MatchError, Result};

/// On-disk formats understood by the loaders and exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Format named by the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(MatchError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.csv")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("dir/B.JSON")).unwrap(), FileFormat::Json);
        assert!(matches!(
            FileFormat::from_path(Path::new("comics.xlsx")),
            Err(MatchError::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_path(Path::new("no_extension")).is_err());
    }
}
