// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types shared across RBPerf crates.

use thiserror::Error;

/// A trial parameter that is not part of its catalog.
///
/// These are raised before any network activity and are the only errors
/// meant to reach an external caller of a single trial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The object identifier is not in the object size catalog.
    #[error("Invalid object id '{value}': must be one of {}", .allowed.join(", "))]
    UnknownObject {
        /// The rejected value.
        value: String,
        /// Every accepted object identifier.
        allowed: Vec<&'static str>,
    },

    /// The region identifier is not in the region catalog.
    #[error("Invalid region id '{value}': must be one of {}", .allowed.join(", "))]
    UnknownRegion {
        /// The rejected value.
        value: String,
        /// Every accepted region code.
        allowed: Vec<&'static str>,
    },
}

impl ValidationError {
    /// Name of the offending parameter.
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::UnknownObject { .. } => "object_id",
            Self::UnknownRegion { .. } => "region_id",
        }
    }
}

/// Errors produced by the core crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A trial parameter failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid input outside of trial validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Settings could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create an [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
