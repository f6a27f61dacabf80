//! CLI for RBPerf.
//!
//! This crate provides the `rbperf` command: single trials, concurrent
//! batches, and inspection of the catalog and effective configuration.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rbperf_adapters::TrialOrchestrator;
use rbperf_benchmarks::{io, HarnessConfig, HarnessError, RunHarness, TrialPageFactory};
use rbperf_core::catalog::{ObjectId, RegionId};
use rbperf_core::config::LogSettings;
use rbperf_core::{FailurePolicy, Settings, TrialRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// RBPerf CLI.
#[derive(Parser, Debug)]
#[command(name = "rbperf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (TOML). Defaults to `rbperf.toml` when present.
    #[arg(short, long, global = true, env = "RBPERF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// What to do with a batch when some units fail.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Reject the whole batch.
    Abort,
    /// Keep rows from the units that succeeded.
    Skip,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => FailurePolicy::AbortBatch,
            PolicyArg::Skip => FailurePolicy::SkipFailed,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one object from one region's bucket from both vantages and
    /// print the result record as a JSON array.
    Trial {
        /// Object to download (2mib.txt, 64mib.txt, 256mib.txt).
        #[arg(short, long)]
        object: String,

        /// Bucket region code, e.g. us-west1.
        #[arg(short, long)]
        region: String,

        /// Also write the record array to this JSON file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run a concurrent batch of full trial plans and write its outputs.
    ///
    /// Writes to the output directory:
    /// - batch.csv - every aggregated row, prefixed with timestamp and unit
    /// - batch.json - run id, unit spans and rows
    /// - summary.md - Markdown summary
    Batch {
        /// Number of concurrent units.
        #[arg(short, long)]
        units: Option<usize>,

        /// Failure policy.
        #[arg(short, long, value_enum)]
        policy: Option<PolicyArg>,

        /// Output directory override.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List the objects and regions trials can use.
    Catalog,

    /// Show version and effective configuration.
    Status {
        /// Also print the full settings as JSON.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if log.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

/// Run the CLI with the process arguments.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    init_tracing(&settings.log)?;
    execute(cli.command, settings).await
}

/// Run one command against loaded settings.
pub async fn execute(command: Commands, settings: Settings) -> anyhow::Result<()> {
    match command {
        Commands::Trial {
            object,
            region,
            output,
        } => run_trial(&settings, &object, &region, output).await,
        Commands::Batch {
            units,
            policy,
            output_dir,
        } => run_batch(&settings, units, policy, output_dir).await,
        Commands::Catalog => {
            print_catalog();
            Ok(())
        }
        Commands::Status { detailed } => print_status(&settings, detailed),
    }
}

async fn run_trial(
    settings: &Settings,
    object: &str,
    region: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let orchestrator =
        TrialOrchestrator::new(&settings.probe).context("Failed to build HTTP client")?;
    let record = orchestrator.run_trial(object, region).await?;
    if !record.has_percent_change() {
        warn!(
            bucket = %record.bucket_name,
            object = %record.object_id,
            "Client or server timing failed; percentChange is the sentinel"
        );
    }

    let records = [record];
    println!("{}", serde_json::to_string_pretty(&records)?);
    if let Some(path) = output {
        io::write_records_json(&records, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Trial record written");
    }
    Ok(())
}

async fn run_batch(
    settings: &Settings,
    units: Option<usize>,
    policy: Option<PolicyArg>,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let units = units.unwrap_or(settings.harness.units);
    if units == 0 {
        bail!("--units must be at least 1");
    }
    let mut config = HarnessConfig::from_settings(&settings.harness);
    if let Some(policy) = policy {
        config = config.with_policy(policy.into());
    }
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&settings.harness.output_dir));
    let factory = Arc::new(TrialPageFactory::full_plan(settings.probe.clone()));

    match RunHarness::new(factory, config).run_batch(units).await {
        Ok(report) => {
            let paths = io::write_all_outputs(&report, &output_dir)
                .with_context(|| format!("Failed to write outputs to {}", output_dir.display()))?;
            for span in report.failed_units() {
                warn!(
                    unit = span.unit_id,
                    status = ?span.status,
                    error = span.error_message.as_deref().unwrap_or(""),
                    "Unit contributed no rows"
                );
            }
            info!(run_id = %report.run_id, rows = %paths.rows.display(), "Batch outputs written");
            println!(
                "Completed {}/{} units, {} rows",
                report.completed_units(),
                report.units.len(),
                report.rows.len()
            );
            println!("Results written to {}", output_dir.display());
            Ok(())
        }
        Err(err) => {
            if let HarnessError::BatchAborted { units, .. } = &err {
                let path = output_dir.join(io::UNITS_FILE);
                io::ensure_output_dir(&output_dir)
                    .and_then(|_| io::write_units_json(units, &path))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                warn!(path = %path.display(), "Unit spans of aborted batch written");
            }
            Err(err.into())
        }
    }
}

fn print_catalog() {
    println!("Objects:");
    for object in ObjectId::ALL {
        println!("  {:<12} {:>4} MiB", object.as_str(), object.size_mib());
    }
    println!("\nRegions:");
    for region in RegionId::all() {
        println!(
            "  {:<26} {:<20} {}",
            region.code(),
            region.location(),
            region.bucket_name()
        );
    }
    println!("\nFull plan: {} trials", TrialRequest::full_plan().len());
}

fn print_status(settings: &Settings, detailed: bool) -> anyhow::Result<()> {
    println!("RBPerf");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Storage endpoint: {}", settings.probe.storage_base_url);
    println!("Download service: {}", settings.probe.server_base_url);
    println!(
        "Batch: {} units, {:?}, timeout {} ms",
        settings.harness.units, settings.harness.failure_policy, settings.harness.population_timeout_ms
    );
    println!("Output directory: {}", settings.harness.output_dir);

    if detailed {
        println!("\n{}", serde_json::to_string_pretty(settings)?);
    }
    Ok(())
}
