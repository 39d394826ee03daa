// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reverse-geocoding provider trait.

use async_trait::async_trait;

use crate::error::TriplogError;
use crate::traits::adapter::PluginAdapter;

/// Turns a coordinate into a human-readable place name.
#[async_trait]
pub trait GeocodeProvider: PluginAdapter {
    /// Returns the formatted address closest to `(latitude, longitude)`.
    ///
    /// Fails with [`TriplogError::RateLimitExceeded`] when the provider quota
    /// is exhausted and [`TriplogError::ResolutionFailed`] otherwise.
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, TriplogError>;
}
