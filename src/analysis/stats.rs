//! Column statistics shared by analysis and cleaning

use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use std::collections::HashMap;

/// Cast any numeric column to `Float64`, keeping nulls
pub(crate) fn to_f64(array: &ArrayRef) -> Result<Float64Array> {
    let cast = cast(array, &DataType::Float64)?;
    cast.as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| Error::StorageError("Failed to downcast to Float64Array".to_string()))
}

/// Cast any string-like column to `Utf8`, keeping nulls
pub(crate) fn to_utf8(array: &ArrayRef) -> Result<StringArray> {
    let cast = cast(array, &DataType::Utf8)?;
    cast.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| Error::StorageError("Failed to downcast to StringArray".to_string()))
}

/// Present values of a float column; null and NaN both mark a missing entry
pub(crate) fn present_values(array: &Float64Array) -> Vec<f64> {
    array.iter().flatten().filter(|v| !v.is_nan()).collect()
}

/// Missing entries of any column: nulls, plus NaNs in float columns
pub(crate) fn missing_count(array: &ArrayRef) -> Result<usize> {
    if !array.data_type().is_floating() {
        return Ok(array.null_count());
    }
    Ok(to_f64(array)?
        .iter()
        .filter(|v| v.map_or(true, f64::is_nan))
        .count())
}

/// Arithmetic mean; `None` for no values
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); `None` for fewer than two values
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of already-sorted values using linear interpolation between
/// the two closest ranks
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Median of unsorted values
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

/// Occurrence counts, most frequent first; ties keep first-seen order
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((idx, 0)).1 += 1;
    }
    let mut ordered: Vec<_> = counts.into_iter().collect();
    ordered.sort_by(|(_, (first_a, count_a)), (_, (first_b, count_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ordered
        .into_iter()
        .map(|(value, (_, count))| (value.to_string(), count))
        .collect()
}

/// Most frequent value; ties go to the lexicographically smallest
pub fn mode<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then(vb.cmp(va)))
        .map(|(value, _)| value.to_string())
}
