//! Dataset encoders (CSV / JSON / Parquet)

use super::{display_suffix, extension, json, Dataset};
use crate::{Error, Result};
use parquet::arrow::ArrowWriter;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Supported output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated text with a header row
    Csv,
    /// Pretty-printed array of JSON records
    Json,
    /// Apache Parquet
    Parquet,
}

impl OutputFormat {
    /// Infer the encoder from the file extension (case-insensitive)
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for extensions without an encoder
    pub fn from_path(path: &Path) -> Result<Self> {
        let suffix = extension(path);
        suffix.parse().map_err(|_| {
            Error::validation(format!(
                "Unsupported output format: {}",
                display_suffix(&suffix)
            ))
        })
    }

    /// Canonical file extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "parquet" => Ok(Self::Parquet),
            other => Err(Error::validation(format!(
                "Unsupported output format: {other}"
            ))),
        }
    }
}

/// Write `dataset` to `path`.
///
/// The format is `format` when given, otherwise inferred from the extension.
/// The format is resolved before anything touches the filesystem; the parent
/// directory is then created if needed and any existing file is replaced.
///
/// # Errors
/// - [`Error::Validation`] for a blank path or unsupported format
/// - IO / encoder errors while writing
pub fn save_dataset(dataset: &Dataset, path: &Path, format: Option<OutputFormat>) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::validation("output_path must be a non-empty string"));
    }
    let format = match format {
        Some(format) => format,
        None => OutputFormat::from_path(path)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match format {
        OutputFormat::Csv => write_csv(dataset, path)?,
        OutputFormat::Json => json::write_json(dataset.batch(), path)?,
        OutputFormat::Parquet => write_parquet(dataset, path)?,
    }

    info!("Dataset saved to: {}", path.display());
    Ok(())
}

/// Where a cleaned dataset goes when no output path is given:
/// `<dir>/processed/<stem>_cleaned<.ext>`
#[must_use]
pub fn default_cleaned_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_cleaned");
    if let Some(ext) = input.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    parent.join("processed").join(name)
}

fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(file);
    writer.write(dataset.batch())?;
    Ok(())
}

fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, dataset.schema(), None)?;
    writer.write(dataset.batch())?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::load_dataset;
    use tempfile::TempDir;

    fn sample(dir: &TempDir) -> Dataset {
        let path = dir.path().join("in.csv");
        fs::write(&path, "a,b\n1,x\n2,\n").unwrap();
        load_dataset(&path).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("x.CSV")).unwrap(), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_path(Path::new("x.parquet")).unwrap(),
            OutputFormat::Parquet
        );
        assert!(OutputFormat::from_path(Path::new("x.xlsx")).is_err());
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_unsupported_extension_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let ds = sample(&dir);
        let target = dir.path().join("nested").join("out.txt");

        let err = save_dataset(&ds, &target, None).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("Unsupported output format: .txt"));
        assert!(!target.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let dir = TempDir::new().unwrap();
        let ds = sample(&dir);
        let target = dir.path().join("out.dat");

        save_dataset(&ds, &target, Some(OutputFormat::Json)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_csv_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let ds = sample(&dir);
        let target = dir.path().join("a").join("b").join("out.csv");

        save_dataset(&ds, &target, None).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "a,b\n1,x\n2,\n");
    }

    #[test]
    fn test_parquet_round_trip_keeps_shape() {
        let dir = TempDir::new().unwrap();
        let ds = sample(&dir);
        let target = dir.path().join("out.parquet");

        save_dataset(&ds, &target, None).unwrap();
        let back = load_dataset(&target).unwrap();

        assert_eq!(back.num_rows(), 2);
        assert_eq!(back.column_names(), ds.column_names());
    }

    #[test]
    fn test_default_cleaned_path() {
        assert_eq!(
            default_cleaned_path(Path::new("data/raw/sales.csv")),
            PathBuf::from("data/raw/processed/sales_cleaned.csv")
        );
        assert_eq!(
            default_cleaned_path(Path::new("sales.json")),
            PathBuf::from("processed/sales_cleaned.json")
        );
    }
}
