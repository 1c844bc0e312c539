//! Title decomposition.
//!
//! Titles are taken apart in a fixed order, each step consuming part of a
//! working copy: year `(YYYY)`, volume marker, special-issue identifier,
//! subtitle, and finally the editorial prefix of the main title. The clean
//! title is computed separately from the untouched input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::TitleComponents;
use crate::parser::issue::ISSUE_MARKER_RE;

pub(crate) static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{4})\)").expect("valid title year regex"));

static VOLUME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:vol\.?|volume)\s*(\d+)").expect("valid volume regex"));

static VOLUME_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:vol\.?|volume)\s*\d+").expect("valid volume prefix regex"));

static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.*?)\s*\((.*?)\)").expect("valid parenthetical regex"));

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid punctuation regex"));

/// Special-issue identifiers in priority order. Only the first hit is taken.
const SPECIAL_IDENTIFIERS: [&str; 8] = [
    "annual",
    "special",
    "one-shot",
    "limited series",
    "variant",
    "director's cut",
    "preview",
    "giant-size",
];

static SPECIAL_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    SPECIAL_IDENTIFIERS
        .iter()
        .map(|tag| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(tag));
            (
                Regex::new(&pattern).expect("valid special identifier regex"),
                *tag,
            )
        })
        .collect()
});

/// Leading words dropped from the main title. At most one is removed.
const MAIN_TITLE_PREFIXES: [&str; 11] = [
    "the",
    "marvels",
    "marvel's",
    "dc",
    "dc's",
    "uncanny",
    "amazing",
    "spectacular",
    "astonishing",
    "all-new",
    "all new",
];

/// Decompose a raw title into its components.
///
/// Total and deterministic: empty or garbage input yields empty components.
pub fn parse_title(title: &str) -> TitleComponents {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return TitleComponents::default();
    }

    let mut working = trimmed.to_string();

    let year = YEAR_RE
        .captures(&working)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();
    if !year.is_empty() {
        working = YEAR_RE.replace_all(&working, "").trim().to_string();
    }

    let volume = VOLUME_RE
        .captures(&working)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();
    if !volume.is_empty() {
        working = VOLUME_RE.replace_all(&working, "").trim().to_string();
    }

    let mut special = String::new();
    for (pattern, tag) in SPECIAL_PATTERNS.iter() {
        if pattern.is_match(&working) {
            special = (*tag).to_string();
            working = pattern.replace_all(&working, "").trim().to_string();
            break;
        }
    }

    let (main_title, subtitle) = split_subtitle(&working);

    TitleComponents {
        main_title: strip_main_title_prefix(&main_title).to_string(),
        volume,
        year,
        subtitle,
        special,
        clean_title: clean_title(title),
    }
}

/// Fully normalized title used for exact-match short circuits.
pub fn clean_title(title: &str) -> String {
    let mut clean = title.to_lowercase();

    clean = YEAR_RE.replace_all(&clean, "").into_owned();
    clean = VOLUME_RE.replace_all(&clean, "").into_owned();
    for (pattern, _) in SPECIAL_PATTERNS.iter() {
        clean = pattern.replace_all(&clean, "").into_owned();
    }
    clean = ISSUE_MARKER_RE.replace_all(&clean, "").into_owned();
    clean = NON_WORD_RE.replace_all(&clean, " ").into_owned();

    clean.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_subtitle(title: &str) -> (String, String) {
    if let Some((main, subtitle)) = title.split_once(':') {
        return (main.trim().to_string(), subtitle.trim().to_string());
    }

    if title.contains('(')
        && !YEAR_RE.is_match(title)
        && let Some(caps) = PARENTHETICAL_RE.captures(title)
    {
        let main = caps[1].trim().to_string();
        let subtitle = caps[2].trim();
        if VOLUME_PREFIX_RE.is_match(subtitle) {
            return (main, String::new());
        }
        return (main, subtitle.to_string());
    }

    (title.to_string(), String::new())
}

fn strip_main_title_prefix(title: &str) -> &str {
    for prefix in MAIN_TITLE_PREFIXES {
        let head_len = prefix.len();
        let Some(head) = title.get(..head_len) else {
            continue;
        };
        if head.eq_ignore_ascii_case(prefix) && title[head_len..].starts_with(' ') {
            return &title[head_len + 1..];
        }
    }
    title
}
