//! Dataset cleaning: duplicate removal and missing-value filling
//!
//! Numeric and categorical columns each get one fill strategy, applied
//! uniformly to every column of that kind that has missing values.
//! Other column kinds (booleans, temporal, nested) are left untouched.

use crate::analysis::stats;
use crate::storage::{ColumnKind, Dataset};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Literal used by [`CategoricalFill::Unknown`] and as the mode fallback
pub const UNKNOWN: &str = "unknown";

/// Fill strategy for numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericFill {
    /// Mean of the present values
    #[default]
    Mean,
    /// Median of the present values
    Median,
    /// Literal zero
    Zero,
}

impl fmt::Display for NumericFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Zero => "zero",
        })
    }
}

impl FromStr for NumericFill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "zero" => Ok(Self::Zero),
            other => Err(Error::validation(format!(
                "fill_numeric_na must be \"mean\", \"median\", or \"zero\" (got {other:?})"
            ))),
        }
    }
}

/// Fill strategy for categorical columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoricalFill {
    /// Most frequent value
    #[default]
    Mode,
    /// The literal `"unknown"`
    Unknown,
}

impl fmt::Display for CategoricalFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mode => "mode",
            Self::Unknown => "unknown",
        })
    }
}

impl FromStr for CategoricalFill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mode" => Ok(Self::Mode),
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::validation(format!(
                "fill_categorical_na must be \"mode\" or \"unknown\" (got {other:?})"
            ))),
        }
    }
}

/// What [`clean_dataset`] does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Remove exact duplicate rows, keeping the first occurrence
    pub drop_duplicates: bool,
    /// Strategy for numeric columns
    pub numeric_fill: NumericFill,
    /// Strategy for categorical columns
    pub categorical_fill: CategoricalFill,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            numeric_fill: NumericFill::default(),
            categorical_fill: CategoricalFill::default(),
        }
    }
}

/// Drop duplicates (optionally) and fill missing values.
///
/// Numeric columns with missing values come back as `Float64`. A column
/// with no present values at all is left as it is.
///
/// # Errors
/// Returns error if a column cannot be compared or cast
pub fn clean_dataset(dataset: &Dataset, options: &CleanOptions) -> Result<Dataset> {
    let mut cleaned = if options.drop_duplicates {
        let (deduped, dropped) = drop_duplicates(dataset)?;
        if dropped > 0 {
            info!("Dropped {dropped} duplicate rows");
        }
        deduped
    } else {
        dataset.clone()
    };

    let schema = cleaned.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(schema.fields().len());
    let mut changed = false;

    for (field, column) in schema.fields().iter().zip(cleaned.batch().columns()) {
        let replacement = if stats::missing_count(column)? == 0 {
            None
        } else {
            match ColumnKind::of(field.data_type()) {
                ColumnKind::Numeric => fill_numeric(field.name(), column, options.numeric_fill)?,
                ColumnKind::Categorical => {
                    Some(fill_categorical(field.name(), column, options.categorical_fill)?)
                }
                ColumnKind::Other => None,
            }
        };

        match replacement {
            Some(filled) => {
                changed = true;
                fields.push(field.as_ref().clone().with_data_type(filled.data_type().clone()));
                columns.push(filled);
            }
            None => {
                fields.push(field.as_ref().clone());
                columns.push(Arc::clone(column));
            }
        }
    }

    if changed {
        let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
        cleaned = Dataset::new(RecordBatch::try_new(schema, columns)?)?;
    }
    Ok(cleaned)
}

/// Remove rows identical to an earlier row (missing equals missing).
/// Returns the deduplicated dataset and the number of rows removed.
///
/// # Errors
/// Returns error if a column type cannot be row-encoded
pub fn drop_duplicates(dataset: &Dataset) -> Result<(Dataset, usize)> {
    let batch = dataset.batch();
    if batch.num_columns() == 0 || batch.num_rows() < 2 {
        return Ok((dataset.clone(), 0));
    }

    let sort_fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| SortField::new(f.data_type().clone()))
        .collect();
    let converter = RowConverter::new(sort_fields)?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let keep: Vec<u64> = (0..rows.num_rows())
        .filter(|&i| seen.insert(rows.row(i)))
        .map(|i| i as u64)
        .collect();

    let dropped = batch.num_rows() - keep.len();
    if dropped == 0 {
        return Ok((dataset.clone(), 0));
    }

    let indices = UInt64Array::from(keep);
    let columns = batch
        .columns()
        .iter()
        .map(|c| arrow::compute::take(c.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let deduped = RecordBatch::try_new(batch.schema(), columns)?;

    Ok((Dataset::new(deduped)?, dropped))
}

fn fill_numeric(name: &str, column: &ArrayRef, strategy: NumericFill) -> Result<Option<ArrayRef>> {
    let floats = stats::to_f64(column)?;
    let present = stats::present_values(&floats);
    let fill = match strategy {
        NumericFill::Mean => stats::mean(&present),
        NumericFill::Median => stats::median(&present),
        NumericFill::Zero => Some(0.0),
    };
    let Some(fill) = fill else {
        warn!("Column {name} has no values to compute a {strategy} from; left unfilled");
        return Ok(None);
    };

    let filled: Float64Array = floats
        .iter()
        .map(|v| Some(v.filter(|x| !x.is_nan()).unwrap_or(fill)))
        .collect();
    info!("Filled {name} NAs with {strategy}: {fill}");
    Ok(Some(Arc::new(filled)))
}

fn fill_categorical(name: &str, column: &ArrayRef, strategy: CategoricalFill) -> Result<ArrayRef> {
    let strings = stats::to_utf8(column)?;
    let fill = match strategy {
        CategoricalFill::Mode => {
            stats::mode(strings.iter().flatten()).unwrap_or_else(|| UNKNOWN.to_string())
        }
        CategoricalFill::Unknown => UNKNOWN.to_string(),
    };

    let filled: StringArray = strings
        .iter()
        .map(|v| Some(v.unwrap_or(fill.as_str())))
        .collect();
    info!("Filled {name} NAs with: {fill}");
    Ok(Arc::new(filled))
}
