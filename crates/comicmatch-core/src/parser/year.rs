use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static BOUNDED_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid bounded year regex"));

static EMBEDDED_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:19|20)\d{2}").expect("valid embedded year regex"));

const DATE_FORMATS: [&str; 3] = ["%b %d %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Parse a year field for comparison.
///
/// A plain integer is taken as-is; otherwise the first standalone
/// 1900–2099 year in the text is used.
pub fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(year) = value.parse::<i32>() {
        return Some(year);
    }
    BOUNDED_YEAR_RE
        .find(value)
        .and_then(|m| m.as_str().parse().ok())
}

/// Recover a year from a loosely formatted date column.
pub fn extract_year(date: &str) -> Option<i32> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    if let Some(m) = EMBEDDED_YEAR_RE.find(date) {
        return m.as_str().parse().ok();
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(date, format) {
            return Some(parsed.year());
        }
    }

    if date.len() == 4 && date.bytes().all(|b| b.is_ascii_digit()) {
        return date.parse().ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_year_direct_cast() {
        assert_eq!(parse_year("1985"), Some(1985));
        assert_eq!(parse_year(" 2010 "), Some(2010));
    }

    #[test]
    fn parse_year_falls_back_to_embedded_year() {
        assert_eq!(parse_year("Cover date: March 1982"), Some(1982));
        assert_eq!(parse_year("2003-07-16"), Some(2003));
    }

    #[test]
    fn parse_year_rejects_out_of_range_embedded_years() {
        assert_eq!(parse_year("printed 1850"), None);
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn extract_year_from_dates() {
        assert_eq!(extract_year("Jan 01 2023"), Some(2023));
        assert_eq!(extract_year("1999-12-31"), Some(1999));
        assert_eq!(extract_year("11/05/1975"), Some(1975));
    }

    #[test]
    fn extract_year_uses_date_formats_outside_regex_range() {
        assert_eq!(extract_year("Jan 01 1850"), Some(1850));
        assert_eq!(extract_year("1850-04-01"), Some(1850));
        assert_eq!(extract_year("1850"), Some(1850));
    }

    #[test]
    fn extract_year_none_for_garbage() {
        assert_eq!(extract_year(""), None);
        assert_eq!(extract_year("n/a"), None);
    }
}
