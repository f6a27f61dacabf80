// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trial adapters for RBPerf.
//!
//! This crate talks to the network: it times downloads from object storage
//! and from the download service, and turns them into result records. The
//! [`TrialRunner`] trait is the seam the benchmark harness drives trials
//! through.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod probe;

use async_trait::async_trait;
use rbperf_core::{ResultRecord, TrialRequest};

pub use probe::{DualVantageTimer, LatencyProbe, ProbeError, TrialOrchestrator};

/// Anything that can run a validated trial to a result record.
///
/// Implementations absorb measurement failures into the record; a trial
/// that was accepted always yields a fully-shaped record.
#[async_trait]
pub trait TrialRunner: Send + Sync {
    /// Run one trial.
    async fn run(&self, request: &TrialRequest) -> ResultRecord;
}
