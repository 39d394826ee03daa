// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the configured store, geocoder and controller.

use std::sync::Arc;

use tracing::info;
use triplog_config::TriplogConfig;
use triplog_core::{GeocodeProvider, PluginAdapter, SessionStore, TriplogError};
use triplog_geocode::OpenCageGeocoder;
use triplog_session::{AddressResolver, TripController};
use triplog_storage::store_from_config;

/// Everything a command needs to drive sessions.
pub struct App {
    pub controller: TripController,
    store: Arc<dyn SessionStore>,
}

impl App {
    /// Opens the configured store and, when enabled, the OpenCage geocoder.
    pub async fn open(config: &TriplogConfig) -> Result<Self, TriplogError> {
        let store = store_from_config(&config.storage);
        store.initialize().await?;

        let provider: Option<Arc<dyn GeocodeProvider>> = if config.geocode.enabled {
            Some(Arc::new(OpenCageGeocoder::new(&config.geocode)?))
        } else {
            info!("geocoding disabled, addresses will stay empty");
            None
        };
        let resolver = AddressResolver::from_config(provider, &config.geocode);
        let controller = TripController::new(Arc::clone(&store), resolver, &config.trip);

        info!(store = store.name(), "session store ready");
        Ok(Self { controller, store })
    }

    /// Flushes and closes the store.
    pub async fn close(&self) -> Result<(), TriplogError> {
        self.store.close().await
    }
}
