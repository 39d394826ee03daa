// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Triplog trip engine.

use thiserror::Error;

use crate::types::SessionStatus;

/// The primary error type used across all Triplog adapter traits and core operations.
#[derive(Debug, Error)]
pub enum TriplogError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A telemetry source could not be opened or decoded at all.
    #[error("ingest error: {source}")]
    Ingest {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single raw record could not be turned into a sample.
    #[error("unparsable record: {reason}")]
    UnparsableRecord { reason: String },

    /// A raw record lacks latitude or longitude.
    #[error("record is missing mandatory field `{field}`")]
    MissingMandatoryField { field: &'static str },

    /// The reverse-geocoding quota is exhausted.
    #[error("geocoding rate limit exceeded")]
    RateLimitExceeded,

    /// Reverse geocoding failed for a reason other than quota.
    #[error("address resolution failed: {message}")]
    ResolutionFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A session operation was invoked from a state that does not allow it.
    #[error("cannot {operation} a session in state {from}")]
    InvalidStateTransition {
        operation: &'static str,
        from: SessionStatus,
    },

    /// No session is stored under the given uid.
    #[error("session not found: {uid}")]
    SessionNotFound { uid: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
