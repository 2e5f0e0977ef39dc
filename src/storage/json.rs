//! JSON records codec
//!
//! Reads three layouts:
//! - an array of records: `[{"a": 1}, {"a": 2}]`
//! - newline-delimited records: `{"a": 1}\n{"a": 2}`
//! - column-oriented: `{"a": {"0": 1, "1": 2}}` or `{"a": [1, 2]}`
//!
//! Writes a pretty-printed array of records with explicit nulls.

use super::Dataset;
use crate::{Error, Result};
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::writer::JsonArray;
use arrow::json::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

pub(super) fn load_json(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path)?;
    let records = parse_records(&text)?;
    records_to_dataset(&records)
}

pub(super) fn write_json(batch: &RecordBatch, path: &Path) -> Result<()> {
    let buf = {
        let mut writer = WriterBuilder::new()
            .with_explicit_nulls(true)
            .build::<_, JsonArray>(Vec::new());
        writer.write(batch)?;
        writer.finish()?;
        writer.into_inner()
    };

    let records = if buf.iter().all(u8::is_ascii_whitespace) {
        Value::Array(Vec::new())
    } else {
        serde_json::from_slice(&buf)?
    };

    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, &records)?;
    out.flush()?;
    Ok(())
}

/// Normalize any supported layout into a list of record objects
fn parse_records(text: &str) -> Result<Vec<Value>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => {
            if let Some(bad) = items.iter().find(|v| !v.is_object()) {
                return Err(Error::validation(format!(
                    "JSON array must contain records, found {bad}"
                )));
            }
            Ok(items)
        }
        Ok(Value::Object(map)) if is_column_oriented(&map) => columns_to_records(map),
        Ok(record @ Value::Object(_)) => Ok(vec![record]),
        Ok(other) => Err(Error::validation(format!(
            "Expected JSON records, found {other}"
        ))),
        // More than one top-level value: newline-delimited records
        Err(_) => serde_json::Deserializer::from_str(text)
            .into_iter::<Value>()
            .map(|v| match v? {
                record @ Value::Object(_) => Ok(record),
                other => Err(Error::validation(format!(
                    "Expected JSON record per line, found {other}"
                ))),
            })
            .collect(),
    }
}

fn is_column_oriented(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(|v| v.is_object() || v.is_array())
}

fn columns_to_records(columns: Map<String, Value>) -> Result<Vec<Value>> {
    // Row labels in first-seen order across columns
    let mut labels: Vec<String> = Vec::new();
    let mut width = 0;
    for values in columns.values() {
        match values {
            Value::Object(cells) => {
                for label in cells.keys() {
                    if !labels.contains(label) {
                        labels.push(label.clone());
                    }
                }
            }
            Value::Array(cells) => width = width.max(cells.len()),
            _ => {}
        }
    }
    let arrays: Vec<usize> = columns
        .values()
        .filter_map(|v| v.as_array().map(Vec::len))
        .collect();
    if arrays.iter().any(|&len| len != width) {
        return Err(Error::validation(
            "Column-oriented JSON arrays must all have the same length",
        ));
    }
    if !labels.is_empty() && !arrays.is_empty() && labels.len() != width {
        return Err(Error::validation(
            "Column-oriented JSON mixes indexed objects and arrays of different lengths",
        ));
    }

    let rows = labels.len().max(width);
    let records = (0..rows)
        .map(|row| {
            let record = columns
                .iter()
                .map(|(name, values)| {
                    let cell = match values {
                        Value::Object(cells) => labels
                            .get(row)
                            .and_then(|label| cells.get(label))
                            .cloned(),
                        Value::Array(cells) => cells.get(row).cloned(),
                        _ => None,
                    };
                    (name.clone(), cell.unwrap_or(Value::Null))
                })
                .collect::<Map<_, _>>();
            Value::Object(record)
        })
        .collect();
    Ok(records)
}

fn records_to_dataset(records: &[Value]) -> Result<Dataset> {
    if records.is_empty() {
        return Ok(Dataset::empty());
    }

    let schema = Arc::new(infer_json_schema_from_iterator(records.iter().map(Ok))?);
    let mut decoder = ReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(records.len())
        .build_decoder()?;
    decoder.serialize(records)?;
    let batch = decoder
        .flush()?
        .unwrap_or_else(|| RecordBatch::new_empty(Arc::clone(&schema)));

    Dataset::new(batch)
}
