// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Download timing against object storage and the download service.
//!
//! - **Latency**: one timed GET per call
//! - **Dual vantage**: client and server timings for one object
//! - **Orchestrator**: validated trial → [`ResultRecord`](rbperf_core::ResultRecord)
//!
//! # Example
//!
//! ```ignore
//! use rbperf_adapters::probe::TrialOrchestrator;
//!
//! let orchestrator = TrialOrchestrator::new(&settings.probe)?;
//! let record = orchestrator.run_trial("2mib.txt", "us-west1").await?;
//! ```

pub mod dual_vantage;
pub mod latency;
pub mod orchestrator;

pub use dual_vantage::DualVantageTimer;
pub use latency::{LatencyProbe, ProbeError};
pub use orchestrator::TrialOrchestrator;
