// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trial orchestrator.
//!
//! Validates a trial's object and region, resolves the bucket, runs the
//! dual-vantage timer and turns the decomposition into a [`ResultRecord`].
//!
//! # Example
//!
//! ```ignore
//! use rbperf_adapters::probe::orchestrator::TrialOrchestrator;
//!
//! let orchestrator = TrialOrchestrator::new(&settings.probe)?;
//! let record = orchestrator.run_trial("64mib.txt", "us-east4").await?;
//! println!("{}", serde_json::to_string_pretty(&[record])?);
//! ```

use super::dual_vantage::DualVantageTimer;
use super::latency::{LatencyProbe, Result};
use crate::TrialRunner;
use async_trait::async_trait;
use rbperf_core::config::ProbeSettings;
use rbperf_core::{Decomposition, ResultRecord, TrialRequest, ValidationError};
use tracing::{info, warn};

/// Runs single trials end to end.
#[derive(Debug, Clone)]
pub struct TrialOrchestrator {
    timer: DualVantageTimer,
}

impl TrialOrchestrator {
    /// Create an orchestrator with its own HTTP client.
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let probe = LatencyProbe::new(settings.request_timeout())?;
        Ok(Self::with_timer(DualVantageTimer::new(probe, settings.clone())))
    }

    /// Create an orchestrator around an existing timer.
    pub fn with_timer(timer: DualVantageTimer) -> Self {
        Self { timer }
    }

    /// Validate `object_id` and `region_id`, then run the trial.
    ///
    /// Invalid parameters are rejected before any request is sent.
    pub async fn run_trial(
        &self,
        object_id: &str,
        region_id: &str,
    ) -> std::result::Result<ResultRecord, ValidationError> {
        let request = TrialRequest::parse(object_id, region_id).map_err(|e| {
            warn!(object_id, region_id, error = %e, "Rejected trial request");
            e
        })?;
        Ok(self.run_request(&request).await)
    }

    /// Run an already-validated trial. Measurement failures show up as
    /// sentinel fields, never as errors.
    pub async fn run_request(&self, request: &TrialRequest) -> ResultRecord {
        let bucket_name = request.bucket_name();
        let triple = self.timer.measure(&bucket_name, request.object.as_str()).await;
        let decomposition = Decomposition::compute(
            &triple,
            request.object.size_bytes(),
            request.object.size_mib(),
        );
        let record = ResultRecord::assemble(request, &decomposition);

        info!(
            bucket = %record.bucket_name,
            object = %record.object_id,
            client_ms = %record.time_taken_client,
            server_ms = %record.time_taken_server,
            hop_ms = %record.time_taken_server_network_hop,
            percent_change = record.percent_change,
            percent_change_measured = decomposition.has_percent_change(),
            "Trial completed"
        );
        record
    }
}

#[async_trait]
impl TrialRunner for TrialOrchestrator {
    async fn run(&self, request: &TrialRequest) -> ResultRecord {
        self.run_request(request).await
    }
}
