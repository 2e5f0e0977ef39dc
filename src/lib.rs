//! # datakit: dataset utilities
//!
//! Three independent tools share this crate:
//!
//! - [`hub`]: download a model/dataset repository snapshot with fixed-delay
//!   retries (`hub-download`)
//! - [`text`]: validate a text file and upper-case it (`transform-text`)
//! - [`storage`], [`analysis`], [`clean`]: load a table from CSV / JSON /
//!   Excel / Parquet, profile it, fill missing values and drop duplicates,
//!   then write CSV / JSON / Parquet (`process-data`)
//!
//! Everything is synchronous and single-threaded.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use datakit::analysis::analyze_dataset;
//! use datakit::clean::{clean_dataset, CleanOptions};
//! use datakit::storage::{load_dataset, save_dataset};
//! use std::path::Path;
//!
//! let dataset = load_dataset("data/sales.csv")?;
//! println!("{}", analyze_dataset(&dataset)?.to_json()?);
//!
//! let cleaned = clean_dataset(&dataset, &CleanOptions::default())?;
//! save_dataset(&cleaned, Path::new("data/sales_cleaned.parquet"), None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod clean;
pub mod error;
pub mod hub;
pub mod logging;
pub mod storage;
pub mod text;

pub use error::{Error, Result};
