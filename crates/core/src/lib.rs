// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for RBPerf.
//!
//! This crate holds everything that does not touch the network: the fixed
//! object and region catalogs, the [`Metric`](metric::Metric) type used to
//! carry possibly-failed measurements, the latency decomposition math, the
//! result record shape, per-unit execution spans and the layered
//! configuration.
//!
//! # Modules
//!
//! - [`catalog`] - Object sizes, regions and trial request validation
//! - [`metric`] - Measured-or-failed values and fixed-point formatting
//! - [`decomposition`] - Network hop, percent change and transfer speed
//! - [`record`] - The per-trial `ResultRecord`
//! - [`execution`] - Status spans for concurrently executed units
//! - [`config`] - Layered settings (defaults, file, environment)

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod decomposition;
pub mod error;
pub mod execution;
pub mod metric;
pub mod record;

/// HTTP header names shared by the probes and the download service.
pub mod headers {
    /// Carries the download service's own upstream fetch time in milliseconds.
    pub const CLIENT_LIBRARY_LATENCY: &str = "rbf-client-library-latency";
}

pub use catalog::{ObjectId, RegionId, TrialRequest};
pub use config::Settings;
pub use decomposition::{Decomposition, TimingTriple};
pub use error::{Error, Result, ValidationError};
pub use execution::{FailurePolicy, UnitSpan, UnitStatus};
pub use metric::{Metric, METRIC_SENTINEL};
pub use record::ResultRecord;
