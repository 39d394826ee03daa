// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordinate to address resolution with graceful quota degradation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use triplog_config::GeocodeConfig;
use triplog_core::{GeoPoint, GeocodeProvider, TriplogError};

use crate::budget::RequestBudget;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The provider returned an address.
    Address(String),
    /// The quota is exhausted; carries the placeholder text.
    Unavailable(String),
}

impl Resolution {
    pub fn into_text(self) -> String {
        match self {
            Resolution::Address(text) | Resolution::Unavailable(text) => text,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Resolution::Unavailable(_))
    }
}

/// Resolves coordinates through an optional [`GeocodeProvider`].
///
/// Cloning is cheap; clones share the provider and the request budget.
#[derive(Clone)]
pub struct AddressResolver {
    provider: Option<Arc<dyn GeocodeProvider>>,
    budget: Arc<Mutex<RequestBudget>>,
    timeout: Duration,
    placeholder: String,
}

impl AddressResolver {
    pub fn new(
        provider: Option<Arc<dyn GeocodeProvider>>,
        budget: Arc<Mutex<RequestBudget>>,
        timeout: Duration,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            budget,
            timeout,
            placeholder: placeholder.into(),
        }
    }

    /// Builds a resolver with a fresh budget from the `[geocode]` section.
    pub fn from_config(provider: Option<Arc<dyn GeocodeProvider>>, config: &GeocodeConfig) -> Self {
        Self::new(
            provider,
            Arc::new(Mutex::new(RequestBudget::from_config(config))),
            Duration::from_secs(config.timeout_secs),
            config.placeholder.clone(),
        )
    }

    /// A resolver without provider. Every call fails.
    pub fn disabled() -> Self {
        Self::from_config(None, &GeocodeConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn budget(&self) -> Arc<Mutex<RequestBudget>> {
        Arc::clone(&self.budget)
    }

    /// Resolves `point` to an address.
    ///
    /// Quota exhaustion, whether from the local budget or the provider, yields
    /// [`Resolution::Unavailable`]. Any other failure is returned as an error.
    pub async fn resolve(&self, point: GeoPoint) -> Result<Resolution, TriplogError> {
        let Some(provider) = &self.provider else {
            return Err(TriplogError::ResolutionFailed {
                message: "geocoding is disabled".into(),
                source: None,
            });
        };

        {
            let mut budget = self.budget.lock().await;
            if budget.check().is_err() {
                debug!(%point, "geocoding budget exhausted, using placeholder");
                return Ok(Resolution::Unavailable(self.placeholder.clone()));
            }
            budget.record_request();
        }

        let call = provider.reverse_geocode(point.latitude, point.longitude);
        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => Err(TriplogError::Timeout {
                duration: self.timeout,
            }),
            Ok(Ok(address)) => {
                debug!(%point, address = %address, "address resolved");
                Ok(Resolution::Address(address))
            }
            Ok(Err(TriplogError::RateLimitExceeded)) => {
                warn!("geocoding rate limit exceeded");
                self.budget.lock().await.exhaust();
                Ok(Resolution::Unavailable(self.placeholder.clone()))
            }
            Ok(Err(e)) => Err(e),
        }
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .field("placeholder", &self.placeholder)
            .finish()
    }
}
