use thiserror::Error;

/// Errors surfaced by the I/O edges of comicmatch-core.
///
/// The matching path itself never fails: malformed fields degrade to
/// neutral scores instead.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, MatchError>;
