//! Concurrent run harness.
//!
//! Launches every unit of a batch at once, joins on all of them with a
//! single barrier and only then aggregates. A unit that fails early never
//! cuts the wait short for slower units; what happens to the batch when
//! some units fail is decided afterwards by the [`FailurePolicy`].
//!
//! Each unit:
//!
//! 1. launches its own session and loads the results page
//! 2. waits until the page renders the expected number of rows, bounded by
//!    the population timeout
//! 3. scrapes every rendered row and stamps it with the capture time
//! 4. closes the session, whether or not the previous steps succeeded

use crate::result::{BatchReport, RunRow};
use crate::session::{ResultsPage, SessionError, SessionFactory};
use chrono::Utc;
use futures::future::join_all;
use rbperf_core::config::HarnessSettings;
use rbperf_core::execution::UnitId;
use rbperf_core::{FailurePolicy, UnitSpan};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Why a single unit did not produce rows.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The session failed to launch or load.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The page did not populate in time.
    #[error("Timed out after {waited:?} waiting for {expected} rows ({rendered} rendered)")]
    PopulationTimeout {
        /// Rows the unit waited for.
        expected: usize,
        /// Rows rendered when the wait gave up.
        rendered: usize,
        /// Length of the wait.
        waited: Duration,
    },
}

/// Errors that fail a whole batch.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A batch needs at least one unit.
    #[error("Batch must contain at least one unit")]
    EmptyBatch,

    /// Under [`FailurePolicy::AbortBatch`], at least one unit failed.
    #[error("Batch aborted: {failed} of {total} units failed (unit {first_unit}: {first_reason})")]
    BatchAborted {
        /// Failed units.
        failed: usize,
        /// Units in the batch.
        total: usize,
        /// Lowest-numbered failed unit.
        first_unit: UnitId,
        /// Its failure.
        first_reason: String,
        /// Spans of every unit, for reporting.
        units: Vec<UnitSpan>,
    },
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// How one unit settled.
#[derive(Debug)]
pub enum UnitOutcome {
    /// The unit scraped its rows.
    Scraped {
        /// Final span.
        span: UnitSpan,
        /// Rows in scrape order.
        rows: Vec<RunRow>,
    },
    /// The unit failed.
    Failed {
        /// Final span.
        span: UnitSpan,
        /// Reason.
        error: UnitError,
    },
}

impl UnitOutcome {
    /// The unit's span.
    pub fn span(&self) -> &UnitSpan {
        match self {
            Self::Scraped { span, .. } | Self::Failed { span, .. } => span,
        }
    }
}

/// Harness tuning.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Rows to wait for; `None` uses the session factory's count.
    pub expected_rows: Option<usize>,
    /// Bound on the population wait.
    pub population_timeout: Duration,
    /// Row count polling interval.
    pub poll_interval: Duration,
    /// Batch policy on unit failure.
    pub policy: FailurePolicy,
}

impl HarnessConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &HarnessSettings) -> Self {
        Self {
            expected_rows: settings.expected_rows,
            population_timeout: settings.population_timeout(),
            poll_interval: settings.poll_interval(),
            policy: settings.failure_policy,
        }
    }

    /// Override the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Block until `page` renders at least `expected` rows or `timeout` elapses.
///
/// Returns the number of rows rendered when the condition was met.
pub async fn wait_for_population(
    page: &dyn ResultsPage,
    expected: usize,
    timeout: Duration,
    poll_interval: Duration,
) -> std::result::Result<usize, UnitError> {
    let wait = async {
        loop {
            let rendered = page.rendered_rows().await;
            if rendered >= expected {
                return rendered;
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(rendered) => Ok(rendered),
        Err(_) => Err(UnitError::PopulationTimeout {
            expected,
            rendered: page.rendered_rows().await,
            waited: timeout,
        }),
    }
}

/// Runs batches of units against a session factory.
pub struct RunHarness {
    factory: Arc<dyn SessionFactory>,
    config: HarnessConfig,
}

impl RunHarness {
    /// Create a harness.
    pub fn new(factory: Arc<dyn SessionFactory>, config: HarnessConfig) -> Self {
        Self { factory, config }
    }

    fn expected_rows(&self) -> usize {
        self.config
            .expected_rows
            .unwrap_or_else(|| self.factory.expected_rows())
    }

    /// Run `units` units concurrently and aggregate their rows.
    pub async fn run_batch(&self, units: usize) -> Result<BatchReport> {
        if units == 0 {
            return Err(HarnessError::EmptyBatch);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            units,
            expected_rows = self.expected_rows(),
            policy = ?self.config.policy,
            "Starting batch"
        );

        let outcomes = join_all((0..units).map(|unit| self.run_unit(unit))).await;

        let report = self.aggregate(run_id, started_at, outcomes)?;
        info!(
            %run_id,
            completed = report.completed_units(),
            failed = report.failed_units().len(),
            rows = report.rows.len(),
            "Batch finished"
        );
        Ok(report)
    }

    /// Run a single unit to completion. Never panics on unit failure; the
    /// failure is returned as an outcome.
    pub async fn run_unit(&self, unit: UnitId) -> UnitOutcome {
        let mut span = UnitSpan::start(unit);

        let mut page = match self.factory.launch(unit).await {
            Ok(page) => page,
            Err(e) => {
                warn!(unit, error = %e, "Unit failed to launch");
                span.fail(e.to_string());
                return UnitOutcome::Failed {
                    span,
                    error: e.into(),
                };
            }
        };

        let scraped = self.drive(unit, page.as_mut(), &mut span).await;
        page.close().await;
        span.record_event("session_closed", HashMap::new());

        match scraped {
            Ok(rows) => {
                span.complete(rows.len());
                UnitOutcome::Scraped { span, rows }
            }
            Err(error) => {
                warn!(unit, error = %error, "Unit failed");
                match error {
                    UnitError::PopulationTimeout { .. } => span.time_out(error.to_string()),
                    UnitError::Session(_) => span.fail(error.to_string()),
                }
                UnitOutcome::Failed { span, error }
            }
        }
    }

    async fn drive(
        &self,
        unit: UnitId,
        page: &mut dyn ResultsPage,
        span: &mut UnitSpan,
    ) -> std::result::Result<Vec<RunRow>, UnitError> {
        page.load().await?;
        span.record_event("page_loaded", HashMap::new());

        let expected = self.expected_rows();
        let rendered = wait_for_population(
            &*page,
            expected,
            self.config.population_timeout,
            self.config.poll_interval,
        )
        .await?;
        span.record_event(
            "page_populated",
            HashMap::from([("rendered_rows".to_string(), json!(rendered))]),
        );

        let rows: Vec<RunRow> = page
            .scrape()
            .await
            .into_iter()
            .map(|cells| RunRow::capture(unit, cells))
            .collect();
        info!(unit, rows = rows.len(), "Unit scraped results page");
        Ok(rows)
    }

    fn aggregate(
        &self,
        run_id: Uuid,
        started_at: chrono::DateTime<Utc>,
        outcomes: Vec<UnitOutcome>,
    ) -> Result<BatchReport> {
        let total = outcomes.len();
        let mut units = Vec::with_capacity(total);
        let mut rows = Vec::new();
        let mut failures: Vec<(UnitId, String)> = Vec::new();

        for outcome in outcomes {
            match outcome {
                UnitOutcome::Scraped {
                    span,
                    rows: unit_rows,
                } => {
                    rows.extend(unit_rows);
                    units.push(span);
                }
                UnitOutcome::Failed { span, error } => {
                    failures.push((span.unit_id, error.to_string()));
                    units.push(span);
                }
            }
        }

        if self.config.policy == FailurePolicy::AbortBatch {
            if let Some((first_unit, first_reason)) = failures.first().cloned() {
                return Err(HarnessError::BatchAborted {
                    failed: failures.len(),
                    total,
                    first_unit,
                    first_reason,
                    units,
                });
            }
        }

        Ok(BatchReport {
            run_id,
            policy: self.config.policy,
            started_at,
            finished_at: Utc::now(),
            units,
            rows,
        })
    }
}
