// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Execution spans for concurrently run units of work.
//!
//! Every unit launched by the benchmark harness gets a [`UnitSpan`] that
//! records when it started, how it settled and how many rows it produced.
//! The harness never reads a span before the unit has settled.
//!
//! # Lifecycle
//!
//! ```text
//! Running ──> Completed
//!         ├─> Failed
//!         └─> TimedOut
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a unit within its batch, in submission order.
pub type UnitId = usize;

/// Status of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    /// Unit is still running.
    Running,
    /// Unit scraped its rows.
    Completed,
    /// Unit could not launch or load its page.
    Failed,
    /// Population condition not met before the wait elapsed.
    TimedOut,
}

impl Default for UnitStatus {
    fn default() -> Self {
        UnitStatus::Running
    }
}

/// What the harness does with the batch when some units fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed unit rejects the whole batch.
    AbortBatch,
    /// Failed units are dropped; the rest still contribute rows.
    #[default]
    SkipFailed,
}

/// A timestamped event within a unit span (append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitEvent {
    /// Event name.
    pub name: String,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event attributes.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

/// Status record of one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpan {
    /// Unit index within the batch.
    pub unit_id: UnitId,
    /// Current status.
    pub status: UnitStatus,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// Set once the unit settles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds, once settled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Rows scraped by the unit.
    pub rows_scraped: usize,
    /// Events recorded while running.
    #[serde(default)]
    pub events: Vec<UnitEvent>,
    /// Reason for a failed or timed out unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl UnitSpan {
    /// Start a span for `unit_id` now.
    pub fn start(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            status: UnitStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            rows_scraped: 0,
            events: Vec::new(),
            error_message: None,
        }
    }

    fn settle(&mut self, status: UnitStatus) {
        let now = Utc::now();
        self.end_time = Some(now);
        self.duration_ms = Some(
            now.signed_duration_since(self.start_time)
                .num_milliseconds()
                .unsigned_abs(),
        );
        self.status = status;
    }

    /// Mark the unit completed with `rows` scraped rows.
    pub fn complete(&mut self, rows: usize) {
        self.rows_scraped = rows;
        self.settle(UnitStatus::Completed);
    }

    /// Mark the unit failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error_message = Some(error.into());
        self.settle(UnitStatus::Failed);
    }

    /// Mark the unit timed out waiting for its page to populate.
    pub fn time_out(&mut self, error: impl Into<String>) {
        self.error_message = Some(error.into());
        self.settle(UnitStatus::TimedOut);
    }

    /// Record an event on this span.
    pub fn record_event(
        &mut self,
        name: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
    ) {
        self.events.push(UnitEvent {
            name: name.into(),
            timestamp: Utc::now(),
            attributes,
        });
    }

    /// Whether the unit has left the running state.
    pub fn is_settled(&self) -> bool {
        self.status != UnitStatus::Running
    }

    /// Whether the unit completed.
    pub fn is_completed(&self) -> bool {
        self.status == UnitStatus::Completed
    }
}
