use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid series parenthetical regex"));
static SERIES_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[:.,"'!?;]"#).expect("valid series punctuation regex"));
static X_SERIES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"x-[a-zA-Z]+").expect("valid x-series regex"));

const ARTICLES: [&str; 3] = ["the", "a", "an"];

/// Coarse series key for grouping titles of the same run.
///
/// `"The Uncanny X-Men (1963)"` and `"X-Men: Legacy"` both key to `x-men`.
pub fn series_key(title: &str) -> String {
    let title = title.trim().to_lowercase();
    let title = PARENTHETICAL_RE.replace_all(&title, "");
    let title = SERIES_PUNCT_RE.replace_all(&title, "");

    if let Some(m) = X_SERIES_RE.find(&title) {
        return m.as_str().to_string();
    }

    let words: Vec<&str> = title.split_whitespace().collect();
    let Some(first) = words.first() else {
        return String::new();
    };

    if ARTICLES.contains(first) {
        return words.get(1).map(|w| (*w).to_string()).unwrap_or_default();
    }

    if first.chars().count() >= 4 {
        return (*first).to_string();
    }

    match words.get(1) {
        Some(second) => format!("{first} {second}"),
        None => (*first).to_string(),
    }
}
