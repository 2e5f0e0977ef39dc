//! Dataset profiling
//!
//! [`analyze_dataset`] produces a [`DatasetAnalysis`]: shape, column types,
//! missing-value counts, a memory estimate, descriptive statistics for
//! numeric columns and top-10 frequencies for categorical columns. Every
//! per-column map keeps the dataset's column order.

pub mod stats;

use crate::storage::{ColumnKind, Dataset};
use crate::Result;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Number of most frequent values reported per categorical column
pub const TOP_VALUES: usize = 10;

/// Column-name keyed map that serializes in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    /// Look up an entry by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Row and column counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub columns: usize,
}

/// Memory estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryUsage {
    /// Arrow buffer footprint in MiB
    pub total_mb: f64,
}

/// Descriptive statistics of one numeric column.
/// Statistics that are undefined for the column serialize as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Present (non-null, non-NaN) values
    pub count: usize,
    /// Mean
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    /// Minimum
    pub min: Option<f64>,
    /// First quartile
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    /// Median
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    /// Third quartile
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    /// Maximum
    pub max: Option<f64>,
}

impl NumericSummary {
    /// Describe a set of present values
    #[must_use]
    pub fn describe(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            count: sorted.len(),
            mean: stats::mean(&sorted),
            std: stats::std_dev(&sorted),
            min: sorted.first().copied(),
            p25: stats::quantile(&sorted, 0.25),
            p50: stats::quantile(&sorted, 0.5),
            p75: stats::quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Frequency profile of one categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    /// Distinct present values
    pub unique_values: usize,
    /// Up to [`TOP_VALUES`] most frequent values with their counts
    pub top_values: OrderedMap<usize>,
}

/// Full profile of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetAnalysis {
    /// Row and column counts
    pub shape: Shape,
    /// Column names in order
    pub columns: Vec<String>,
    /// Arrow type name per column
    pub dtypes: OrderedMap<String>,
    /// Null count per column
    pub missing_values: OrderedMap<usize>,
    /// Memory estimate
    pub memory_usage: MemoryUsage,
    /// Present only when the dataset has numeric columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerical_summary: Option<OrderedMap<NumericSummary>>,
    /// Present only when the dataset has categorical columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical_summary: Option<OrderedMap<CategoricalSummary>>,
}

impl DatasetAnalysis {
    /// Pretty-printed JSON text
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Structured JSON value
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Profile `dataset`
///
/// # Errors
/// Returns error if a column cannot be cast for statistics
#[allow(clippy::cast_precision_loss)]
pub fn analyze_dataset(dataset: &Dataset) -> Result<DatasetAnalysis> {
    let schema = dataset.schema();
    let batch = dataset.batch();

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        match ColumnKind::of(field.data_type()) {
            ColumnKind::Numeric => {
                let values = stats::present_values(&stats::to_f64(column)?);
                numeric.push((field.name().clone(), NumericSummary::describe(&values)));
            }
            ColumnKind::Categorical => {
                let strings = stats::to_utf8(column)?;
                let counts = stats::value_counts(strings.iter().flatten());
                categorical.push((
                    field.name().clone(),
                    CategoricalSummary {
                        unique_values: counts.len(),
                        top_values: counts.into_iter().take(TOP_VALUES).collect(),
                    },
                ));
            }
            ColumnKind::Other => {}
        }
    }

    Ok(DatasetAnalysis {
        shape: Shape {
            rows: dataset.num_rows(),
            columns: dataset.num_columns(),
        },
        columns: dataset.column_names(),
        dtypes: schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().to_string()))
            .collect(),
        missing_values: schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(f, c)| Ok((f.name().clone(), stats::missing_count(c)?)))
            .collect::<Result<_>>()?,
        memory_usage: MemoryUsage {
            total_mb: dataset.memory_size() as f64 / (1024.0 * 1024.0),
        },
        numerical_summary: (!numeric.is_empty()).then(|| numeric.into_iter().collect()),
        categorical_summary: (!categorical.is_empty()).then(|| categorical.into_iter().collect()),
    })
}
