use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::FileFormat;
use crate::error::Result;
use crate::models::Fields;

/// Wrapper keys holding a record list inside a JSON object.
const LIST_KEYS: [&str; 2] = ["results", "comics"];

/// Load raw rows from a `.csv` or `.json` file.
pub fn load_records(path: &Path) -> Result<Vec<Fields>> {
    let rows = match FileFormat::from_path(path)? {
        FileFormat::Csv => load_csv(path)?,
        FileFormat::Json => parse_json_records(&fs::read_to_string(path)?)?,
    };
    info!("Loaded {} records from {}", rows.len(), path.display());
    Ok(rows)
}

fn load_csv(path: &Path) -> Result<Vec<Fields>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let fields: Fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or_default().to_string()))
            .collect();
        rows.push(fields);
    }
    Ok(rows)
}

/// Parse JSON text holding records in any of the accepted shapes:
/// a list, an object with a `results` or `comics` list, or an object whose
/// values are all records. Other shapes yield no rows.
pub fn parse_json_records(contents: &str) -> Result<Vec<Fields>> {
    let value: Value = serde_json::from_str(contents)?;

    let items: Vec<&Map<String, Value>> = match &value {
        Value::Array(items) => objects(items.iter()),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = LIST_KEYS.iter().find_map(|key| map.get(*key)) {
                objects(items.iter())
            } else if map.values().all(Value::is_object) {
                objects(map.values())
            } else {
                warn!("Unrecognized JSON structure: object without a record list");
                Vec::new()
            }
        }
        _ => {
            warn!("Unrecognized JSON structure: expected a list or an object");
            Vec::new()
        }
    };

    Ok(items.into_iter().map(fields_from_object).collect())
}

fn objects<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<&'a Map<String, Value>> {
    let mut skipped = 0usize;
    let objects: Vec<_> = values
        .filter_map(|v| {
            let object = v.as_object();
            if object.is_none() {
                skipped += 1;
            }
            object
        })
        .collect();
    if skipped > 0 {
        warn!("Skipped {skipped} JSON entries that are not objects");
    }
    objects
}

fn fields_from_object(object: &Map<String, Value>) -> Fields {
    object
        .iter()
        .map(|(key, value)| (key.clone(), value_to_field(value)))
        .collect()
}

fn value_to_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
