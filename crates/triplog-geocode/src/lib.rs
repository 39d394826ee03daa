// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenCage reverse-geocoding provider for Triplog.
//!
//! This crate implements [`GeocodeProvider`] on top of the OpenCage
//! geocoding API. The API key is taken from configuration only.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use triplog_config::GeocodeConfig;
use triplog_core::{
    AdapterType, GeocodeProvider, HealthStatus, PluginAdapter, TriplogError,
};

use crate::client::OpenCageClient;

/// OpenCage provider implementing [`GeocodeProvider`].
pub struct OpenCageGeocoder {
    client: OpenCageClient,
}

impl OpenCageGeocoder {
    /// Creates a provider from the `[geocode]` configuration section.
    ///
    /// Fails with [`TriplogError::Config`] when no API key is configured.
    pub fn new(config: &GeocodeConfig) -> Result<Self, TriplogError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                TriplogError::Config(
                    "geocode.api_key must be set (or TRIPLOG_GEOCODE_API_KEY)".into(),
                )
            })?;

        let client = OpenCageClient::new(
            api_key,
            config.language.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(language = %config.language, "OpenCage geocoder initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for OpenCageGeocoder {
    fn name(&self) -> &str {
        "opencage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Geocoder
    }

    async fn health_check(&self) -> Result<HealthStatus, TriplogError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriplogError> {
        Ok(())
    }
}

#[async_trait]
impl GeocodeProvider for OpenCageGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, TriplogError> {
        self.client.reverse(latitude, longitude).await
    }
}
