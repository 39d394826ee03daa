// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Triplog trip engine.
//!
//! This crate provides the error taxonomy, the canonical telemetry and
//! session types, and the collaborator traits that storage backends and
//! geocoders implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TriplogError;
pub use types::{
    AdapterType, GeoPoint, HealthStatus, Sample, SessionRecord, SessionStatus, SessionUid,
    SessionUpdate, TelemetryField, UNSET_METRIC,
};

pub use traits::{GeocodeProvider, PluginAdapter, SessionStore};
