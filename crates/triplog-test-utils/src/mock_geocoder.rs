// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock geocoder for deterministic testing.
//!
//! `MockGeocoder` implements `GeocodeProvider` with scripted outcomes and
//! records every coordinate it was asked about.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use triplog_core::{
    AdapterType, GeoPoint, GeocodeProvider, HealthStatus, PluginAdapter, TriplogError,
};

/// Address returned when no outcome is queued.
pub const DEFAULT_ADDRESS: &str = "1 Rue de Rivoli, 75001 Paris, France";

/// One scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Address(String),
    RateLimited,
    Fail(String),
}

/// A mock geocoder that replays queued outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// [`DEFAULT_ADDRESS`] is returned.
pub struct MockGeocoder {
    outcomes: Arc<Mutex<VecDeque<GeocodeOutcome>>>,
    calls: Arc<Mutex<Vec<GeoPoint>>>,
    delay: Option<Duration>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_outcomes(outcomes: Vec<GeocodeOutcome>) -> Self {
        let mock = Self::new();
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            ..mock
        }
    }

    /// Sleeps before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn push(&self, outcome: GeocodeOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Coordinates requested so far, in call order.
    pub async fn calls(&self) -> Vec<GeoPoint> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGeocoder {
    fn name(&self) -> &str {
        "mock-geocoder"
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
impl GeocodeProvider for MockGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, TriplogError> {
        self.calls
            .lock()
            .await
            .push(GeoPoint::new(latitude, longitude));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcomes.lock().await.pop_front();
        match outcome {
            None => Ok(DEFAULT_ADDRESS.to_string()),
            Some(GeocodeOutcome::Address(address)) => Ok(address),
            Some(GeocodeOutcome::RateLimited) => Err(TriplogError::RateLimitExceeded),
            Some(GeocodeOutcome::Fail(message)) => Err(TriplogError::ResolutionFailed {
                message,
                source: None,
            }),
        }
    }
}
