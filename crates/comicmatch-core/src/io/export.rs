use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::info;

use super::FileFormat;
use crate::dedup::DuplicatePair;
use crate::error::Result;
use crate::models::{MatchResult, Record};

const MATCH_COLUMNS: [&str; 8] = [
    "similarity",
    "source_title",
    "source_issue",
    "target_title",
    "target_issue",
    "title_sim",
    "issue_match",
    "year_sim",
];

const DUPLICATE_COLUMNS: [&str; 7] = [
    "comic1_idx",
    "comic1_title",
    "comic1_issue",
    "comic2_idx",
    "comic2_title",
    "comic2_issue",
    "similarity",
];

/// Write match results to `path` as CSV, or JSON for a `.json` extension.
///
/// Each row carries the scores, both titles and issues, and every original
/// field prefixed with `source_` or `target_`.
pub fn export_matches(path: &Path, results: &[MatchResult]) -> Result<usize> {
    let columns = match_columns(results);
    let rows: Vec<Map<String, Value>> = results.iter().map(|r| match_row(r, &columns)).collect();

    write_rows(path, &columns, &rows)?;
    info!("Exported {} matches to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Write duplicate pairs of `records` to `path`.
pub fn export_duplicates(path: &Path, records: &[Record], pairs: &[DuplicatePair]) -> Result<usize> {
    let columns: Vec<String> = DUPLICATE_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Map<String, Value>> = pairs
        .iter()
        .filter_map(|pair| {
            let first = records.get(pair.first_index)?;
            let second = records.get(pair.second_index)?;
            let row = json!({
                "comic1_idx": pair.first_index,
                "comic1_title": first.title,
                "comic1_issue": first.issue,
                "comic2_idx": pair.second_index,
                "comic2_title": second.title,
                "comic2_issue": second.issue,
                "similarity": pair.similarity,
            });
            row.as_object().cloned()
        })
        .collect();

    write_rows(path, &columns, &rows)?;
    info!("Exported {} duplicate pairs to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn match_columns(results: &[MatchResult]) -> Vec<String> {
    let source_fields: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.source.fields.keys().map(String::as_str))
        .collect();
    let target_fields: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.target.fields.keys().map(String::as_str))
        .collect();

    let mut columns: Vec<String> = MATCH_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut seen: BTreeSet<String> = columns.iter().cloned().collect();
    let prefixed = source_fields
        .iter()
        .map(|f| format!("source_{f}"))
        .chain(target_fields.iter().map(|f| format!("target_{f}")));
    for column in prefixed {
        if seen.insert(column.clone()) {
            columns.push(column);
        }
    }
    columns
}

fn match_row(result: &MatchResult, columns: &[String]) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("similarity".into(), json!(result.similarity));
    row.insert("source_title".into(), json!(result.source.title));
    row.insert("source_issue".into(), json!(result.source.issue));
    row.insert("target_title".into(), json!(result.target.title));
    row.insert("target_issue".into(), json!(result.target.issue));
    row.insert("title_sim".into(), json!(result.features.title_sim));
    row.insert("issue_match".into(), json!(result.features.issue_match));
    row.insert("year_sim".into(), json!(result.features.year_sim));

    for column in columns.iter().skip(MATCH_COLUMNS.len()) {
        let value = if let Some(field) = column.strip_prefix("source_") {
            result.source.fields.get(field)
        } else if let Some(field) = column.strip_prefix("target_") {
            result.target.fields.get(field)
        } else {
            None
        };
        row.insert(column.clone(), value.map_or(Value::Null, |v| json!(v)));
    }
    row
}

fn write_rows(path: &Path, columns: &[String], rows: &[Map<String, Value>]) -> Result<()> {
    let format = match FileFormat::from_path(path) {
        Ok(FileFormat::Json) => FileFormat::Json,
        _ => FileFormat::Csv,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    match format {
        FileFormat::Json => {
            fs::write(path, serde_json::to_string_pretty(rows)?)?;
        }
        FileFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(columns)?;
            for row in rows {
                writer.write_record(columns.iter().map(|c| cell(row.get(c))))?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MatchConfig, MatchEngine};
    use crate::index::IndexStrategy;
    use crate::models::{Fields, Side};
    use tempfile::TempDir;

    fn row(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_results() -> Vec<MatchResult> {
        MatchEngine::new(MatchConfig::default().with_strategy(IndexStrategy::Full))
            .match_collections(
                vec![row(&[("title", "Uncanny X-Men (1981)"), ("issue", "142"), ("sku", "A1")])],
                vec![row(&[
                    ("title", "X-Men"),
                    ("issue", "#142"),
                    ("cover_date", "Feb 01 1981"),
                ])],
            )
    }

    #[test]
    fn csv_export_has_fixed_then_prefixed_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("matches.csv");
        let results = sample_results();
        assert_eq!(export_matches(&path, &results).unwrap(), 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(&headers[..8], MATCH_COLUMNS);
        assert_eq!(&headers[8..], ["source_sku", "target_cover_date"]);

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "Uncanny X-Men (1981)");
        assert_eq!(&record[4], "#142");
        assert_eq!(&record[7], "1.0");
        assert_eq!(&record[8], "A1");
        assert_eq!(&record[9], "Feb 01 1981");
    }

    #[test]
    fn json_export_is_array_of_flat_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        export_matches(&path, &sample_results()).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["source_sku"], "A1");
        assert_eq!(rows[0]["issue_match"], 1.0);
        assert_eq!(rows[0]["year_sim"], 1.0);
    }

    #[test]
    fn empty_results_still_write_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.csv");
        assert_eq!(export_matches(&path, &[]).unwrap(), 0);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim(),
            "similarity,source_title,source_issue,target_title,target_issue,title_sim,issue_match,year_sim"
        );
    }

    #[test]
    fn duplicates_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dupes.csv");
        let records = vec![
            Record::new("Saga", "1", Side::Source),
            Record::new("SAGA", "1", Side::Source),
        ];
        let pairs = vec![DuplicatePair {
            first_index: 0,
            second_index: 1,
            similarity: 1.0,
        }];
        assert_eq!(export_duplicates(&path, &records, &pairs).unwrap(), 1);

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "comic1_idx,comic1_title,comic1_issue,comic2_idx,comic2_title,comic2_issue,similarity"
        );
        assert_eq!(lines.next().unwrap(), "0,Saga,1,1,SAGA,1,1.0");
    }
}
