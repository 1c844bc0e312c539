use once_cell::sync::Lazy;
use regex::Regex;

/// `#<number>` issue marker, e.g. `#142` or `#1.5`.
pub(crate) static ISSUE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\d+\.?\d*)").expect("valid issue marker regex"));

/// Extract a canonical issue token from free text.
///
/// Attempts, first success wins: a bare number, a `#<number>` marker
/// anywhere, a number as the last whitespace-separated token. `None` when no
/// issue number can be recovered.
pub fn normalize_issue(text: &str) -> Option<String> {
    if is_issue_number(text) {
        return Some(text.to_string());
    }

    if let Some(caps) = ISSUE_MARKER_RE.captures(text) {
        return Some(caps[1].to_string());
    }

    text.split_whitespace()
        .last()
        .filter(|token| is_issue_number(token))
        .map(str::to_string)
}

/// Digits with at most one `.` anywhere, and at least one digit.
fn is_issue_number(text: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for ch in text.chars() {
        match ch {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
