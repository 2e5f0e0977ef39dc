//! Dataset storage (Arrow in memory; CSV / JSON / spreadsheet / Parquet on disk)
//!
//! A [`Dataset`] is one Arrow [`RecordBatch`]: named, typed columns with
//! unique names. Nothing is enforced across rows; duplicates and missing
//! values are expected and handled by the cleaning step.
//!
//! Loading dispatches on the file extension:
//!
//! | extension        | decoder                                    |
//! |------------------|--------------------------------------------|
//! | `.csv`           | Arrow CSV, header row, inferred schema     |
//! | `.json`          | records array, NDJSON, or column-oriented  |
//! | `.xlsx` / `.xls` | first worksheet via calamine               |
//! | `.parquet`       | Arrow Parquet reader                       |

mod json;
mod spreadsheet;
mod writer;

pub use writer::{default_cleaned_path, save_dataset, OutputFormat};

use crate::{Error, Result};
use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// In-memory table
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// Wrap a record batch
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if two columns share a name
    pub fn new(batch: RecordBatch) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in batch.schema().fields() {
            if !seen.insert(field.name().clone()) {
                return Err(Error::validation(format!(
                    "Duplicate column name: {}",
                    field.name()
                )));
            }
        }
        Ok(Self { batch })
    }

    /// Concatenate decoded batches into one dataset
    ///
    /// # Errors
    /// Returns error if the batches don't match `schema` or names repeat
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = arrow::compute::concat_batches(&schema, batches)?;
        Self::new(batch)
    }

    /// Dataset with no columns and no rows
    #[must_use]
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consume into the underlying record batch
    #[must_use]
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Schema
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Column by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Approximate in-memory footprint in bytes
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.batch.get_array_memory_size()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.num_rows(), self.num_columns())
    }
}

/// How the pipeline treats a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integers and floats: described, filled with mean/median/zero
    Numeric,
    /// Strings: value-counted, filled with mode/"unknown"
    Categorical,
    /// Everything else (booleans, temporal, nested): reported only
    Other,
}

impl ColumnKind {
    /// Classify an Arrow type
    #[must_use]
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64 => Self::Numeric,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Self::Categorical,
            DataType::Dictionary(_, value) => match value.as_ref() {
                DataType::Utf8 | DataType::LargeUtf8 => Self::Categorical,
                _ => Self::Other,
            },
            _ => Self::Other,
        }
    }
}

/// Supported input encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated text with a header row
    Csv,
    /// JSON records
    Json,
    /// Excel workbook
    Spreadsheet,
    /// Apache Parquet
    Parquet,
}

impl InputFormat {
    /// Pick the decoder from the file extension (case-insensitive)
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for unknown extensions
    pub fn from_path(path: &Path) -> Result<Self> {
        let suffix = extension(path);
        match suffix.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" | "xls" => Ok(Self::Spreadsheet),
            "parquet" => Ok(Self::Parquet),
            _ => Err(Error::validation(format!(
                "Unsupported file format: {}",
                display_suffix(&suffix)
            ))),
        }
    }
}

/// Load a dataset, choosing the decoder by extension
///
/// # Errors
/// - [`Error::NotFound`] if the file does not exist
/// - [`Error::Validation`] for unsupported extensions or duplicate columns
/// - decoder errors for malformed files
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(Error::validation("file_path must be a non-empty string"));
    }
    if !path.exists() {
        return Err(Error::not_found(format!("File not found: {}", path.display())));
    }

    let format = InputFormat::from_path(path)?;
    debug!("Decoding {} as {format:?}", path.display());
    match format {
        InputFormat::Csv => load_csv(path),
        InputFormat::Json => json::load_json(path),
        InputFormat::Spreadsheet => spreadsheet::load_spreadsheet(path),
        InputFormat::Parquet => load_parquet(path),
    }
}

/// Fields read as missing in delimited text: the empty field plus the
/// usual spellings of "not available"
const CSV_NULL_PATTERN: &str = concat!(
    r"^(|#N/A|#N/A N/A|#NA|-1\.#IND|-1\.#QNAN|-NaN|-nan|1\.#IND|1\.#QNAN",
    r"|<NA>|N/A|NA|NULL|NaN|None|n/a|nan|null)$"
);

/// Load a CSV file with a header row; the schema is inferred from all rows.
/// Empty fields and the tokens in [`CSV_NULL_PATTERN`] become nulls.
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    use arrow::csv::reader::Format;
    use arrow::csv::ReaderBuilder;

    let null_regex = regex::Regex::new(CSV_NULL_PATTERN)
        .map_err(|e| Error::StorageError(format!("Invalid null pattern: {e}")))?;

    let mut file = File::open(path.as_ref())?;
    let format = Format::default()
        .with_header(true)
        .with_null_regex(null_regex);
    let (schema, _) = format.infer_schema(&mut file, None)?;
    file.rewind()?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;

    Dataset::from_batches(schema, &batches)
}

/// Load table from Parquet file
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;
    let schema = Arc::clone(builder.schema());

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch = batch
            .map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        batches.push(batch);
    }

    Dataset::from_batches(schema, &batches)
}

/// Lower-cased extension without the dot; empty when there is none
fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn display_suffix(suffix: &str) -> String {
    if suffix.is_empty() {
        "(none)".to_string()
    } else {
        format!(".{suffix}")
    }
}
