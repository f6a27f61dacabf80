// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measured-or-failed values.
//!
//! A failed measurement is carried as [`Metric::Failed`] through every
//! calculation and only becomes [`METRIC_SENTINEL`] when it is formatted,
//! so a batch of trials keeps producing fully-shaped records even when
//! individual downloads fail.

use serde::{Deserialize, Serialize};
use std::ops::Sub;
use std::time::Duration;

/// Value written in place of any quantity that could not be measured.
pub const METRIC_SENTINEL: f64 = -1.0;

/// Number of fractional digits in every formatted metric.
pub const FLOAT_ROUND_DIGITS: usize = 3;

/// A quantity that was either measured or could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Metric {
    /// A finite measured value.
    Measured(f64),
    /// The measurement failed.
    Failed,
}

impl Metric {
    /// Wrap a value; non-finite values count as failures.
    pub fn measured(value: f64) -> Self {
        if value.is_finite() {
            Self::Measured(value)
        } else {
            Self::Failed
        }
    }

    /// Milliseconds elapsed in `duration`.
    pub fn from_duration(duration: Duration) -> Self {
        Self::Measured(duration.as_secs_f64() * 1000.0)
    }

    /// Whether the measurement failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// The measured value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Measured(v) => Some(*v),
            Self::Failed => None,
        }
    }

    /// The measured value, or [`METRIC_SENTINEL`].
    pub fn or_sentinel(&self) -> f64 {
        self.value().unwrap_or(METRIC_SENTINEL)
    }

    /// Apply `f` to a measured value. A non-finite result is a failure.
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Measured(v) => Self::measured(f(v)),
            Self::Failed => Self::Failed,
        }
    }

    /// Combine two metrics; fails if either side failed.
    pub fn zip_with(self, other: Metric, f: impl FnOnce(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Self::Measured(a), Self::Measured(b)) => Self::measured(f(a, b)),
            _ => Self::Failed,
        }
    }

    /// Fixed-point string with [`FLOAT_ROUND_DIGITS`] fractional digits.
    pub fn format(&self) -> String {
        format_fixed(self.or_sentinel())
    }
}

impl Sub for Metric {
    type Output = Metric;

    fn sub(self, rhs: Metric) -> Metric {
        self.zip_with(rhs, |a, b| a - b)
    }
}

/// Format `value` with [`FLOAT_ROUND_DIGITS`] fractional digits.
///
/// Values are rounded to the nearest thousandth. A value lying exactly
/// halfway between two thousandths rounds away from zero (`0.0625` prints
/// as `0.063`), unlike the round-half-to-even of `{:.3}`. Negative zero
/// prints as `0.000`.
pub fn format_fixed(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };

    // The only f64 values halfway between two thousandths are odd multiples
    // of 1/16, and scaling by 16 is exact.
    let sixteenths = value.abs() * 16.0;
    if sixteenths.fract() == 0.0 && sixteenths % 2.0 == 1.0 {
        let thousandths = (sixteenths as u64 * 125 + 1) / 2;
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}{}.{:03}", thousandths / 1000, thousandths % 1000);
    }

    format!("{:.*}", FLOAT_ROUND_DIGITS, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_formats_as_sentinel() {
        assert_eq!(Metric::Failed.format(), "-1.000");
        assert_eq!(Metric::Failed.or_sentinel(), METRIC_SENTINEL);
    }

    #[test]
    fn test_measured_rejects_non_finite() {
        assert!(Metric::measured(f64::NAN).is_failed());
        assert!(Metric::measured(f64::INFINITY).is_failed());
        assert_eq!(Metric::measured(1.5).value(), Some(1.5));
    }

    #[test]
    fn test_arithmetic_on_failed_is_total() {
        let a = Metric::Measured(10.0);
        assert!((a - Metric::Failed).is_failed());
        assert!((Metric::Failed - a).is_failed());
        assert!(Metric::Failed.map(|v| v * 2.0).is_failed());
        assert_eq!((a - Metric::Measured(12.5)).value(), Some(-2.5));
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(1048576.0), "1048576.000");
        assert_eq!(format_fixed(12.34567), "12.346");
        assert_eq!(format_fixed(-0.0), "0.000");
    }

    #[test]
    fn test_format_fixed_rounds_ties_away_from_zero() {
        assert_eq!(format_fixed(0.0625), "0.063");
        assert_eq!(format_fixed(12.0625), "12.063");
        assert_eq!(format_fixed(0.1875), "0.188");
        assert_eq!(format_fixed(-0.0625), "-0.063");
        assert_eq!(format_fixed(2.5), "2.500");
        assert_eq!(format_fixed(0.0624), "0.062");
        assert_eq!(Metric::Measured(12.0625).format(), "12.063");
    }

    #[test]
    fn test_from_duration_in_millis() {
        let m = Metric::from_duration(Duration::from_micros(1500));
        assert_eq!(m.format(), "1.500");
    }
}
