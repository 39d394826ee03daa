// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session factory and query facade over a [`SessionStore`].

use std::sync::Arc;

use tracing::info;
use triplog_config::TripConfig;
use triplog_core::{Sample, SessionRecord, SessionStore, SessionUid, TriplogError};

use crate::resolver::AddressResolver;
use crate::session::TripSession;

/// Creates and looks up [`TripSession`]s.
#[derive(Clone)]
pub struct TripController {
    store: Arc<dyn SessionStore>,
    resolver: AddressResolver,
    dilution_threshold_km: f64,
}

impl TripController {
    pub fn new(store: Arc<dyn SessionStore>, resolver: AddressResolver, trip: &TripConfig) -> Self {
        Self {
            store,
            resolver,
            dilution_threshold_km: trip.dilution_threshold_km,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Creates the session for `origin`, or returns the existing one.
    pub async fn create(&self, origin: &str) -> Result<TripSession, TriplogError> {
        let uid = SessionUid::from_origin(origin);
        let created = self.store.create_session(&uid, origin).await?;
        info!(%uid, origin, created, "creating session");
        self.get(&uid).await
    }

    /// Deletes any session for `origin` and creates a fresh one.
    pub async fn recreate(&self, origin: &str) -> Result<TripSession, TriplogError> {
        let uid = SessionUid::from_origin(origin);
        let removed = self.store.delete_session(&uid).await?;
        info!(%uid, origin, removed, "re-creating session");
        self.create(origin).await
    }

    pub async fn get(&self, uid: &SessionUid) -> Result<TripSession, TriplogError> {
        let record = self
            .store
            .get_session(uid)
            .await?
            .ok_or_else(|| TriplogError::SessionNotFound {
                uid: uid.to_string(),
            })?;
        TripSession::from_record(
            record,
            Arc::clone(&self.store),
            self.resolver.clone(),
            self.dilution_threshold_km,
        )
        .await
    }

    /// All stored sessions, most recently active first.
    pub async fn list(&self) -> Result<Vec<SessionRecord>, TriplogError> {
        self.store.list_sessions().await
    }

    pub async fn samples(
        &self,
        uid: &SessionUid,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Sample>, TriplogError> {
        self.store.get_samples(uid, offset, limit).await
    }
}
