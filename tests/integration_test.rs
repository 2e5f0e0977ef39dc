//! End-to-end tabular pipeline: load, analyze, clean, save, reload

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use datakit::analysis::analyze_dataset;
use datakit::clean::{clean_dataset, CategoricalFill, CleanOptions, NumericFill};
use datakit::storage::{default_cleaned_path, load_dataset, save_dataset, OutputFormat};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

fn f64_column(dataset: &datakit::storage::Dataset, name: &str) -> Vec<Option<f64>> {
    let column = dataset.column(name).expect("column exists");
    let values = column
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("Float64 column");
    values.iter().collect()
}

#[test]
fn test_csv_analyze_clean_save() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "small.csv", "a,b\n1,2\n1,2\n3,\n");

    let dataset = load_dataset(&input).expect("Failed to load CSV");
    assert_eq!(dataset.num_rows(), 3);
    assert_eq!(dataset.column_names(), vec!["a", "b"]);

    let analysis = analyze_dataset(&dataset).unwrap().to_value().unwrap();
    assert_eq!(analysis["shape"]["rows"], 3);
    assert_eq!(analysis["shape"]["columns"], 2);
    assert_eq!(analysis["missing_values"]["a"], 0);
    assert_eq!(analysis["missing_values"]["b"], 1);
    assert!(analysis.get("categorical_summary").is_none());
    assert_eq!(analysis["numerical_summary"]["a"]["count"], 3);

    let cleaned = clean_dataset(&dataset, &CleanOptions::default()).unwrap();
    assert_eq!(cleaned.num_rows(), 2);
    assert_eq!(f64_column(&cleaned, "b"), vec![Some(2.0), Some(2.0)]);
    let a = cleaned
        .column("a")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(a.values().to_vec(), vec![1, 3]);

    let output = default_cleaned_path(&input);
    assert_eq!(output, dir.path().join("processed").join("small_cleaned.csv"));
    save_dataset(&cleaned, &output, None).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("a,b"));
    assert_eq!(lines.count(), 2);
}

#[test]
fn test_keep_duplicates_with_zero_fill() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "dups.csv", "a,b\n1,2\n1,2\n3,\n");

    let options = CleanOptions {
        drop_duplicates: false,
        numeric_fill: NumericFill::Zero,
        categorical_fill: CategoricalFill::Unknown,
    };
    let cleaned = clean_dataset(&load_dataset(&input).unwrap(), &options).unwrap();

    assert_eq!(cleaned.num_rows(), 3);
    assert_eq!(f64_column(&cleaned, "b"), vec![Some(2.0), Some(2.0), Some(0.0)]);
}

#[test]
fn test_json_records_to_parquet_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "people.json",
        r#"[{"name": "ann", "age": 31}, {"name": null, "age": 40}, {"name": "bob", "age": null}]"#,
    );

    let dataset = load_dataset(&input).unwrap();
    assert_eq!(dataset.num_rows(), 3);

    let cleaned = clean_dataset(&dataset, &CleanOptions::default()).unwrap();
    let output = dir.path().join("out").join("people.parquet");
    save_dataset(&cleaned, &output, None).unwrap();

    let reloaded = load_dataset(&output).unwrap();
    assert_eq!(reloaded.num_rows(), 3);
    assert_eq!(reloaded.column_names(), cleaned.column_names());

    let names = reloaded
        .column("name")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(names.null_count(), 0);
    // "ann" and "bob" tie; the smaller wins
    assert_eq!(names.value(1), "ann");

    let ages = reloaded.column("age").unwrap();
    assert_eq!(ages.data_type(), &DataType::Float64);
    assert_eq!(ages.null_count(), 0);
}

#[test]
fn test_explicit_format_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "t.csv", "x,y\nfoo,1\nbar,2\n");
    let dataset = load_dataset(&input).unwrap();

    let output = dir.path().join("t.data");
    save_dataset(&dataset, &output, Some(OutputFormat::Json)).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value[0]["x"], "foo");
    assert_eq!(value[1]["y"], 2);
}

#[test]
fn test_unsupported_formats_are_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "notes.txt", "hello");

    let err = load_dataset(&input).unwrap_err();
    assert!(err.to_string().contains("Unsupported file format"));

    let dataset = load_dataset(write_file(dir.path(), "ok.csv", "a\n1\n")).unwrap();
    let target = dir.path().join("nested").join("out.txt");
    assert!(save_dataset(&dataset, &target, None).is_err());
    assert!(!dir.path().join("nested").exists());
}

#[test]
fn test_missing_input_is_not_found() {
    let err = load_dataset("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, datakit::Error::NotFound(_)));
}

#[test]
fn test_nan_cells_are_missing_through_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "nan.csv", "a,b\n1,NaN\n2,3.0\n4,5.0\n");

    let dataset = load_dataset(&input).unwrap();
    let analysis = analyze_dataset(&dataset).unwrap().to_value().unwrap();
    assert_eq!(analysis["missing_values"]["b"], 1);
    assert_eq!(analysis["numerical_summary"]["b"]["count"], 2);
    assert_eq!(analysis["numerical_summary"]["b"]["mean"], 4.0);

    let cleaned = clean_dataset(&dataset, &CleanOptions::default()).unwrap();
    assert_eq!(f64_column(&cleaned, "b"), vec![Some(4.0), Some(3.0), Some(5.0)]);
}

#[test]
fn test_nan_values_survive_parquet_and_count_as_missing() {
    use arrow::array::{ArrayRef, RecordBatch};
    use arrow::datatypes::{Field, Schema};
    use datakit::storage::Dataset;
    use std::sync::Arc;

    let schema = Arc::new(Schema::new(vec![Field::new("b", DataType::Float64, true)]));
    let column: ArrayRef = Arc::new(Float64Array::from(vec![Some(f64::NAN), Some(3.0), None, Some(5.0)]));
    let dataset = Dataset::new(RecordBatch::try_new(schema, vec![column]).unwrap()).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nan.parquet");
    save_dataset(&dataset, &path, None).unwrap();
    let reloaded = load_dataset(&path).unwrap();
    assert_eq!(reloaded.column("b").unwrap().null_count(), 1);

    let analysis = analyze_dataset(&reloaded).unwrap().to_value().unwrap();
    assert_eq!(analysis["missing_values"]["b"], 2);
    assert_eq!(analysis["numerical_summary"]["b"]["count"], 2);

    let options = CleanOptions {
        numeric_fill: NumericFill::Zero,
        ..CleanOptions::default()
    };
    let cleaned = clean_dataset(&reloaded, &options).unwrap();
    assert_eq!(
        f64_column(&cleaned, "b"),
        vec![Some(0.0), Some(3.0), Some(0.0), Some(5.0)]
    );
}

#[test]
fn test_csv_na_tokens_load_as_nulls() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "na.csv", "a,b\n1,NA\n2,3\n");

    let dataset = load_dataset(&input).unwrap();
    let b = dataset.column("b").unwrap();
    assert!(b.data_type().is_numeric(), "b loaded as {}", b.data_type());
    assert_eq!(b.null_count(), 1);

    let analysis = analyze_dataset(&dataset).unwrap().to_value().unwrap();
    assert_eq!(analysis["missing_values"]["b"], 1);
    assert!(analysis.get("categorical_summary").is_none());

    let cleaned = clean_dataset(&dataset, &CleanOptions::default()).unwrap();
    assert_eq!(f64_column(&cleaned, "b"), vec![Some(3.0), Some(3.0)]);
}

#[test]
fn test_xlsx_fixture_loads_header_types_and_nulls() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("people.xlsx");

    let dataset = load_dataset(&path).expect("Failed to load xlsx");

    assert_eq!(dataset.num_rows(), 3);
    assert_eq!(dataset.column_names(), vec!["name", "age", "score", "active"]);

    let name = dataset.column("name").unwrap();
    assert_eq!(name.data_type(), &DataType::Utf8);
    let name = name.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(name.value(2), "carol");

    let age = dataset.column("age").unwrap();
    assert_eq!(age.data_type(), &DataType::Int64);
    let age = age.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(age.value(0), 30);
    assert!(age.is_null(1));
    assert_eq!(age.value(2), 41);

    assert_eq!(f64_column(&dataset, "score"), vec![Some(88.5), Some(92.25), None]);
    assert_eq!(dataset.column("active").unwrap().data_type(), &DataType::Boolean);

    let analysis = analyze_dataset(&dataset).unwrap().to_value().unwrap();
    assert_eq!(analysis["missing_values"]["age"], 1);
    assert_eq!(analysis["missing_values"]["score"], 1);
    assert_eq!(analysis["missing_values"]["active"], 0);
    assert_eq!(analysis["numerical_summary"]["age"]["mean"], 35.5);
}
