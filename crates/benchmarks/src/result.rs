//! Batch result types.
//!
//! This module provides the scraped row and the batch report produced by
//! one harness run.

use chrono::{DateTime, Utc};
use rbperf_core::execution::UnitId;
use rbperf_core::{FailurePolicy, UnitSpan, UnitStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scraped table row with its capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    /// Unit that scraped the row.
    pub unit_id: UnitId,
    /// When the row was scraped.
    pub captured_at: DateTime<Utc>,
    /// Rendered cells, in table column order.
    pub cells: Vec<String>,
}

impl RunRow {
    /// Tag `cells` scraped by `unit_id` with the current time.
    pub fn capture(unit_id: UnitId, cells: Vec<String>) -> Self {
        Self {
            unit_id,
            captured_at: Utc::now(),
            cells,
        }
    }
}

/// Everything one batch produced.
///
/// `rows` holds the rows of every contributing unit in submission order,
/// and within a unit in scrape order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// Policy the batch ran under.
    pub policy: FailurePolicy,
    /// When the first unit was launched.
    pub started_at: DateTime<Utc>,
    /// When the last unit settled.
    pub finished_at: DateTime<Utc>,
    /// One span per unit, in submission order.
    pub units: Vec<UnitSpan>,
    /// Aggregated rows.
    pub rows: Vec<RunRow>,
}

impl BatchReport {
    /// Number of units that scraped their rows.
    pub fn completed_units(&self) -> usize {
        self.units.iter().filter(|u| u.is_completed()).count()
    }

    /// Units that failed or timed out.
    pub fn failed_units(&self) -> Vec<&UnitSpan> {
        self.units
            .iter()
            .filter(|u| matches!(u.status, UnitStatus::Failed | UnitStatus::TimedOut))
            .collect()
    }

    /// Whether every unit completed.
    pub fn is_complete(&self) -> bool {
        self.completed_units() == self.units.len()
    }
}
