// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Triplog integration tests.
//!
//! Provides a mock geocoder, Torque CSV fixtures and a harness wiring them to
//! a `TripController`, for fast tests without network access.
//!
//! # Components
//!
//! - [`MockGeocoder`] - Geocoder replaying scripted outcomes
//! - [`TorqueLog`] - Builder for Torque-shaped CSV exports
//! - [`TestHarness`] - Controller over throwaway storage

pub mod fixtures;
pub mod harness;
pub mod mock_geocoder;

pub use fixtures::{TorqueLog, paris_trip};
pub use harness::TestHarness;
pub use mock_geocoder::{DEFAULT_ADDRESS, GeocodeOutcome, MockGeocoder};
