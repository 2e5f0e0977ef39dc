//! Load a dataset, optionally analyze and clean it, optionally save it.
//!
//! ```bash
//! process-data data/sales.csv --analyze
//! process-data data/sales.csv --clean                 # -> data/processed/sales_cleaned.csv
//! process-data data/sales.xlsx --clean --output out.parquet
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use datakit::analysis::analyze_dataset;
use datakit::clean::{clean_dataset, CategoricalFill, CleanOptions, NumericFill};
use datakit::storage::{default_cleaned_path, load_dataset, save_dataset, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Csv,
    Json,
    Parquet,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Csv => Self::Csv,
            CliFormat::Json => Self::Json,
            CliFormat::Parquet => Self::Parquet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNumericFill {
    Mean,
    Median,
    Zero,
}

impl From<CliNumericFill> for NumericFill {
    fn from(fill: CliNumericFill) -> Self {
        match fill {
            CliNumericFill::Mean => Self::Mean,
            CliNumericFill::Median => Self::Median,
            CliNumericFill::Zero => Self::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCategoricalFill {
    Mode,
    Unknown,
}

impl From<CliCategoricalFill> for CategoricalFill {
    fn from(fill: CliCategoricalFill) -> Self {
        match fill {
            CliCategoricalFill::Mode => Self::Mode,
            CliCategoricalFill::Unknown => Self::Unknown,
        }
    }
}

#[derive(Parser)]
#[command(name = "process-data")]
#[command(version, about = "Data processing utility", long_about = None)]
struct Cli {
    #[arg(help = "Input dataset file path (.csv, .json, .xlsx, .xls, .parquet)")]
    input_file: PathBuf,

    #[arg(long, help = "Output file path (optional)")]
    output: Option<PathBuf>,

    #[arg(long, help = "Print a JSON analysis of the dataset")]
    analyze: bool,

    #[arg(long, help = "Drop duplicate rows and fill missing values")]
    clean: bool,

    #[arg(
        long,
        value_enum,
        help = "Output format (if not specified, inferred from extension)"
    )]
    format: Option<CliFormat>,

    #[arg(long, value_enum, default_value = "mean", help = "Fill strategy for numeric columns")]
    fill_numeric: CliNumericFill,

    #[arg(
        long,
        value_enum,
        default_value = "mode",
        help = "Fill strategy for categorical columns"
    )]
    fill_categorical: CliCategoricalFill,

    #[arg(long, help = "Keep duplicate rows when cleaning")]
    keep_duplicates: bool,

    #[arg(long, short, help = "Show verbose debug output")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    datakit::logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    debug!("Loading dataset from: {}", cli.input_file.display());
    let mut dataset = load_dataset(&cli.input_file)?;
    debug!("Loaded dataset with shape: {dataset}");

    if cli.analyze {
        info!("Dataset Analysis:");
        println!("{}", analyze_dataset(&dataset)?.to_json()?);
    }

    if cli.clean {
        debug!("Cleaning dataset...");
        let options = CleanOptions {
            drop_duplicates: !cli.keep_duplicates,
            numeric_fill: cli.fill_numeric.into(),
            categorical_fill: cli.fill_categorical.into(),
        };
        dataset = clean_dataset(&dataset, &options)?;
        debug!("Cleaned dataset shape: {dataset}");
    }

    let format = cli.format.map(OutputFormat::from);
    if let Some(output) = &cli.output {
        save_dataset(&dataset, output, format)?;
    } else if cli.clean {
        let mut output = default_cleaned_path(&cli.input_file);
        if let Some(format) = format {
            output.set_extension(format.extension());
        }
        save_dataset(&dataset, &output, format)?;
    }

    Ok(())
}
