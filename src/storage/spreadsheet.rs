//! Excel decoding (first worksheet, first row is the header)

use super::Dataset;
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use std::sync::Arc;

pub(super) fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::StorageError(format!("Failed to open spreadsheet: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::StorageError("Spreadsheet has no worksheets".to_string()))?
        .map_err(|e| Error::StorageError(format!("Failed to read worksheet: {e}")))?;

    let rows: Vec<&[Data]> = range.rows().collect();
    cells_to_dataset(&rows)
}

/// Build a dataset from a grid whose first row holds column names
fn cells_to_dataset(rows: &[&[Data]]) -> Result<Dataset> {
    let Some((header, body)) = rows.split_first() else {
        return Ok(Dataset::empty());
    };

    let mut fields = Vec::with_capacity(header.len());
    let mut columns = Vec::with_capacity(header.len());
    for (i, cell) in header.iter().enumerate() {
        let name = match cell {
            Data::Empty => format!("Unnamed: {i}"),
            other => other.to_string(),
        };
        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(i).unwrap_or(&Data::Empty))
            .collect();
        let column = build_column(&cells);
        fields.push(Field::new(name, column.data_type().clone(), true));
        columns.push(column);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(body.len()));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;
    Dataset::new(batch)
}

/// Error cells count as missing
fn is_missing(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_))
}

/// Whole numbers; xlsx stores every number as a float, so integral floats count
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn as_int(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(v) => Some(*v),
        Data::Float(v)
            if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 =>
        {
            Some(*v as i64)
        }
        _ => None,
    }
}

/// Narrowest of Int64 / Float64 / Boolean / Utf8 that holds every present cell.
/// A column with no present cells becomes all-null Float64.
fn build_column(cells: &[&Data]) -> ArrayRef {
    let present = || cells.iter().filter(|c| !is_missing(c));

    if present().all(|c| as_int(c).is_some()) && present().next().is_some() {
        return Arc::new(cells.iter().map(|c| as_int(c)).collect::<Int64Array>());
    }
    if present().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) {
        return Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    #[allow(clippy::cast_precision_loss)]
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect::<Float64Array>(),
        );
    }
    if present().all(|c| matches!(c, Data::Bool(_))) {
        return Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        );
    }
    Arc::new(
        cells
            .iter()
            .map(|c| (!is_missing(c)).then(|| c.to_string()))
            .collect::<StringArray>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;

    #[test]
    fn test_header_and_type_inference() {
        let header = [
            Data::String("id".into()),
            Data::String("score".into()),
            Data::String("label".into()),
            Data::Empty,
        ];
        let row1 = [
            Data::Int(1),
            Data::Float(0.5),
            Data::String("a".into()),
            Data::Bool(true),
        ];
        let row2 = [Data::Int(2), Data::Int(3), Data::Empty];
        let rows: Vec<&[Data]> = vec![&header[..], &row1[..], &row2[..]];

        let ds = cells_to_dataset(&rows).unwrap();

        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.column_names(), vec!["id", "score", "label", "Unnamed: 3"]);
        assert_eq!(ds.column("id").unwrap().data_type(), &DataType::Int64);
        assert_eq!(ds.column("score").unwrap().data_type(), &DataType::Float64);
        assert_eq!(ds.column("label").unwrap().data_type(), &DataType::Utf8);
        assert!(ds.column("label").unwrap().is_null(1));
        assert_eq!(ds.column("Unnamed: 3").unwrap().data_type(), &DataType::Boolean);
    }

    #[test]
    fn test_whole_floats_are_integers() {
        let header = [Data::String("n".into()), Data::String("f".into())];
        let row1 = [Data::Float(30.0), Data::Float(1.0)];
        let row2 = [Data::Empty, Data::Float(f64::INFINITY)];
        let row3 = [Data::Int(7), Data::Float(2.0)];
        let rows: Vec<&[Data]> = vec![&header[..], &row1[..], &row2[..], &row3[..]];

        let ds = cells_to_dataset(&rows).unwrap();

        let n = ds.column("n").unwrap();
        assert_eq!(n.data_type(), &DataType::Int64);
        let n = n.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(n.value(0), 30);
        assert!(n.is_null(1));
        assert_eq!(n.value(2), 7);
        assert_eq!(ds.column("f").unwrap().data_type(), &DataType::Float64);
    }

    #[test]
    fn test_all_missing_column_is_float() {
        let header = [Data::String("x".into())];
        let row = [Data::Empty];
        let rows: Vec<&[Data]> = vec![&header[..], &row[..]];

        let ds = cells_to_dataset(&rows).unwrap();
        let x = ds.column("x").unwrap();
        assert_eq!(x.data_type(), &DataType::Float64);
        assert_eq!(x.null_count(), 1);
    }

    #[test]
    fn test_empty_sheet() {
        let ds = cells_to_dataset(&[]).unwrap();
        assert_eq!(ds.num_columns(), 0);
    }
}
