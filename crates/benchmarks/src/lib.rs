//! Concurrent benchmark harness for RBPerf.
//!
//! This crate runs batches of isolated units, each loading a results page,
//! waiting for it to populate and scraping its rows, and aggregates the
//! rows into one ordered report.
//!
//! # Quick Start
//!
//! ```no_run
//! use rbperf_benchmarks::{run_and_write_batch, HarnessConfig, TrialPageFactory};
//! use rbperf_core::Settings;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let factory = Arc::new(TrialPageFactory::full_plan(settings.probe.clone()));
//! let config = HarnessConfig::from_settings(&settings.harness);
//!
//! let report = run_and_write_batch(factory, config, 3, "benchmarks/output").await?;
//! println!("{} rows", report.rows.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`session`] - Results pages and the sessions that host them
//! - [`harness`] - Concurrent launch, join and aggregation
//! - [`result`] - `RunRow` and `BatchReport`
//! - [`io`] - CSV/JSON output
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod harness;
pub mod io;
pub mod markdown;
pub mod result;
pub mod session;

pub use harness::{HarnessConfig, HarnessError, RunHarness, UnitError, UnitOutcome};
pub use result::{BatchReport, RunRow};
pub use session::{ResultsPage, SessionError, SessionFactory, TrialPage, TrialPageFactory};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from [`run_and_write_batch`].
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch itself failed.
    #[error(transparent)]
    Harness(#[from] HarnessError),

    /// Outputs could not be written.
    #[error("Failed to write batch outputs: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a batch and write its outputs to `output_dir`.
///
/// Writes `batch.csv`, `batch.json` and `summary.md`.
///
/// # Errors
///
/// Returns a [`BatchError`] if the batch is aborted or writing fails.
pub async fn run_and_write_batch(
    factory: Arc<dyn SessionFactory>,
    config: HarnessConfig,
    units: usize,
    output_dir: impl AsRef<Path>,
) -> Result<BatchReport, BatchError> {
    let report = RunHarness::new(factory, config).run_batch(units).await?;
    io::write_all_outputs(&report, output_dir)?;
    Ok(report)
}
