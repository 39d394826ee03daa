// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end trip tests.
//!
//! `TestHarness` assembles a store, a mock geocoder and a `TripController`.
//! The store is the in-memory document store by default, or SQLite in a temp
//! directory.

use std::sync::Arc;

use triplog_config::model::{GeocodeConfig, TriplogConfig};
use triplog_core::{GeocodeProvider, SessionStore, TriplogError};
use triplog_session::{AddressResolver, TripController};
use triplog_storage::{DocumentSessionStore, SqliteSessionStore};

use crate::mock_geocoder::{GeocodeOutcome, MockGeocoder};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    outcomes: Vec<GeocodeOutcome>,
    daily_request_limit: Option<u32>,
    dilution_threshold_km: Option<f64>,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            daily_request_limit: None,
            dilution_threshold_km: None,
            sqlite: false,
        }
    }

    /// Queue geocoder outcomes.
    pub fn with_geocode_outcomes(mut self, outcomes: Vec<GeocodeOutcome>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn with_daily_request_limit(mut self, limit: u32) -> Self {
        self.daily_request_limit = Some(limit);
        self
    }

    pub fn with_dilution_threshold(mut self, km: f64) -> Self {
        self.dilution_threshold_km = Some(km);
        self
    }

    /// Use a SQLite database in a temp directory instead of the document store.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, TriplogError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| TriplogError::Storage { source: e.into() })?;

        let mut config = TriplogConfig::default();
        config.storage.database_path = temp_dir
            .path()
            .join("triplog.db")
            .to_string_lossy()
            .to_string();
        config.geocode = GeocodeConfig {
            enabled: true,
            api_key: Some("test-key".into()),
            daily_request_limit: self.daily_request_limit,
            ..GeocodeConfig::default()
        };
        if let Some(km) = self.dilution_threshold_km {
            config.trip.dilution_threshold_km = km;
        }

        let store: Arc<dyn SessionStore> = if self.sqlite {
            Arc::new(SqliteSessionStore::new(config.storage.clone()))
        } else {
            Arc::new(DocumentSessionStore::new())
        };
        store.initialize().await?;

        let geocoder = Arc::new(MockGeocoder::with_outcomes(self.outcomes));
        let resolver = AddressResolver::from_config(
            Some(Arc::clone(&geocoder) as Arc<dyn GeocodeProvider>),
            &config.geocode,
        );
        let controller = TripController::new(Arc::clone(&store), resolver, &config.trip);

        Ok(TestHarness {
            geocoder,
            store,
            controller,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock geocoder and throwaway storage.
pub struct TestHarness {
    /// The mock geocoder.
    pub geocoder: Arc<MockGeocoder>,
    /// The session store behind the controller.
    pub store: Arc<dyn SessionStore>,
    pub controller: TripController,
    pub config: TriplogConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Add an outcome to the mock geocoder's queue.
    pub async fn add_geocode_outcome(&self, outcome: GeocodeOutcome) {
        self.geocoder.push(outcome).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triplog_core::PluginAdapter;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.controller.list().await.unwrap().is_empty());
        assert_eq!(harness.store.name(), "document");
    }

    #[tokio::test]
    async fn sqlite_harness_uses_temp_database() {
        let harness = TestHarness::builder().with_sqlite().build().await.unwrap();
        assert_eq!(harness.store.name(), "sqlite");
        assert!(harness.config.storage.database_path.ends_with("triplog.db"));
        harness.controller.create("car").await.unwrap();
        assert_eq!(harness.controller.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn temp_stores_are_unique_per_harness() {
        let h1 = TestHarness::builder().with_sqlite().build().await.unwrap();
        let h2 = TestHarness::builder().with_sqlite().build().await.unwrap();
        h1.controller.create("only-in-h1").await.unwrap();
        assert_eq!(h1.controller.list().await.unwrap().len(), 1);
        assert!(h2.controller.list().await.unwrap().is_empty());
    }
}
