//! Row ingestion: column fallback, field normalization, publisher names.

use tracing::warn;

use crate::models::{Fields, Record, Side};
use crate::parser::{extract_year, normalize_issue, parse_title};

/// Canonical title column first, then accepted alternates.
pub const TITLE_COLUMNS: [&str; 4] = ["title", "name", "comic_name", "series"];
/// Canonical issue column first, then accepted alternates.
pub const ISSUE_COLUMNS: [&str; 4] = ["issue", "issue_number", "number", "issue_num"];
/// Columns searched for a year when the title carries none.
pub const DATE_COLUMNS: [&str; 5] = ["year", "cover_date", "publication_date", "release_date", "date"];

const PUBLISHER_VARIANTS: [(&str, &[&str]); 8] = [
    ("marvel", &["marvel comics", "marvel comic", "marvel entertainment"]),
    ("dc", &["dc comics", "detective comics", "dc entertainment"]),
    ("image", &["image comics"]),
    ("dark horse", &["dark horse comics"]),
    ("idw", &["idw publishing"]),
    ("valiant", &["valiant entertainment", "valiant comics"]),
    ("boom", &["boom! studios", "boom studios"]),
    ("dynamite", &["dynamite entertainment"]),
];

/// Normalize a whole collection, warning once for each column that is
/// missing from every row.
pub fn prepare_records(rows: Vec<Fields>, side: Side) -> Vec<Record> {
    if !rows.is_empty() {
        warn_if_missing(&rows, &TITLE_COLUMNS, side);
        warn_if_missing(&rows, &ISSUE_COLUMNS, side);
    }

    rows.into_iter()
        .map(|fields| prepare_record(fields, side))
        .collect()
}

/// Normalize one row. Missing columns become empty strings.
pub fn prepare_record(fields: Fields, side: Side) -> Record {
    let title = first_present(&fields, &TITLE_COLUMNS).unwrap_or_default();
    let issue = first_present(&fields, &ISSUE_COLUMNS).unwrap_or_default();

    let parsed = parse_title(&title);
    let normalized_issue = normalize_issue(&issue);
    let year = parsed.year.parse::<i32>().ok().or_else(|| {
        DATE_COLUMNS
            .iter()
            .filter_map(|column| fields.get(*column))
            .find_map(|value| extract_year(value))
    });
    let publisher = fields
        .get("publisher")
        .map(|p| normalize_publisher(p))
        .unwrap_or_default();

    Record {
        title,
        issue,
        side,
        parsed,
        normalized_issue,
        year,
        publisher,
        fields,
    }
}

/// Map publisher name variants onto a short canonical name.
pub fn normalize_publisher(publisher: &str) -> String {
    let publisher = publisher.trim().to_lowercase();
    if publisher.is_empty() {
        return publisher;
    }

    for (canonical, variants) in PUBLISHER_VARIANTS {
        if variants.contains(&publisher.as_str()) {
            return canonical.to_string();
        }
    }

    for (canonical, variants) in PUBLISHER_VARIANTS {
        if publisher.contains(canonical) || variants.iter().any(|v| publisher.contains(v)) {
            return canonical.to_string();
        }
    }

    publisher
}

fn first_present(fields: &Fields, columns: &[&str]) -> Option<String> {
    columns
        .iter()
        .find_map(|column| fields.get(*column))
        .cloned()
}

fn warn_if_missing(rows: &[Fields], columns: &[&str], side: Side) {
    let present = rows
        .iter()
        .any(|row| columns.iter().any(|column| row.contains_key(*column)));
    if !present {
        warn!(
            "{side} records have no '{}' column (or alternates {:?}); defaulting to empty",
            columns[0],
            &columns[1..]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn canonical_columns_are_used() {
        let record = prepare_record(row(&[("title", "Saga"), ("issue", "#12")]), Side::Source);
        assert_eq!(record.title, "Saga");
        assert_eq!(record.issue, "#12");
        assert_eq!(record.normalized_issue.as_deref(), Some("12"));
        assert_eq!(record.side, Side::Source);
    }

    #[test]
    fn alternate_columns_fill_in_missing_ones() {
        let record = prepare_record(
            row(&[("comic_name", "Hellboy"), ("issue_num", "3")]),
            Side::Target,
        );
        assert_eq!(record.title, "Hellboy");
        assert_eq!(record.issue, "3");
    }

    #[test]
    fn canonical_column_wins_over_alternates() {
        let record = prepare_record(
            row(&[("title", "Saga"), ("name", "Other"), ("number", "9"), ("issue", "1")]),
            Side::Source,
        );
        assert_eq!(record.title, "Saga");
        assert_eq!(record.issue, "1");
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let record = prepare_record(row(&[("publisher", "Image Comics")]), Side::Source);
        assert_eq!(record.title, "");
        assert_eq!(record.issue, "");
        assert_eq!(record.normalized_issue, None);
        assert_eq!(record.parsed.clean_title, "");
        assert_eq!(record.publisher, "image");
    }

    #[test]
    fn year_falls_back_to_date_columns() {
        let from_title = prepare_record(row(&[("title", "Batman (1989)")]), Side::Source);
        assert_eq!(from_title.year, Some(1989));

        let from_column = prepare_record(
            row(&[("title", "Batman"), ("cover_date", "Jun 01 1989")]),
            Side::Source,
        );
        assert_eq!(from_column.year, Some(1989));

        let none = prepare_record(row(&[("title", "Batman")]), Side::Source);
        assert_eq!(none.year, None);
    }

    #[test]
    fn original_fields_are_kept() {
        let record = prepare_record(
            row(&[("title", "Saga"), ("reading_order", "12.5")]),
            Side::Source,
        );
        assert_eq!(record.fields.get("reading_order").map(String::as_str), Some("12.5"));
    }

    #[test]
    fn prepare_records_keeps_order_and_side() {
        let records = prepare_records(
            vec![row(&[("title", "A")]), row(&[("title", "B")])],
            Side::Target,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "B");
        assert!(records.iter().all(|r| r.side == Side::Target));
    }

    #[test]
    fn publisher_exact_variants() {
        assert_eq!(normalize_publisher("Marvel Comics"), "marvel");
        assert_eq!(normalize_publisher("Detective Comics"), "dc");
        assert_eq!(normalize_publisher("BOOM! Studios"), "boom");
    }

    #[test]
    fn publisher_partial_matches() {
        assert_eq!(normalize_publisher("Marvel Worldwide Inc."), "marvel");
        assert_eq!(normalize_publisher("Dark Horse Books"), "dark horse");
        assert_eq!(normalize_publisher("Fantagraphics"), "fantagraphics");
        assert_eq!(normalize_publisher(""), "");
    }
}
