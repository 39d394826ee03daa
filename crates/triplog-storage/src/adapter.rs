// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the SessionStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use triplog_config::model::StorageConfig;
use triplog_core::{
    AdapterType, HealthStatus, PluginAdapter, Sample, SessionRecord, SessionStore, SessionUid,
    SessionUpdate, TriplogError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed session store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`SessionStore::initialize`].
pub struct SqliteSessionStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteSessionStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`SessionStore::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, TriplogError> {
        self.db.get().ok_or_else(|| TriplogError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TriplogError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriplogError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn initialize(&self) -> Result<(), TriplogError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TriplogError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite session store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TriplogError> {
        self.db()?.close().await?;
        debug!("SQLite session store closed");
        Ok(())
    }

    async fn create_session(&self, uid: &SessionUid, origin: &str) -> Result<bool, TriplogError> {
        queries::sessions::create_session(self.db()?, uid, origin).await
    }

    async fn get_session(&self, uid: &SessionUid) -> Result<Option<SessionRecord>, TriplogError> {
        queries::sessions::get_session(self.db()?, uid).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, TriplogError> {
        queries::sessions::list_sessions(self.db()?).await
    }

    async fn update_session(
        &self,
        uid: &SessionUid,
        update: &SessionUpdate,
    ) -> Result<(), TriplogError> {
        if !queries::sessions::update_session(self.db()?, uid, update).await? {
            return Err(TriplogError::SessionNotFound {
                uid: uid.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_session(&self, uid: &SessionUid) -> Result<u64, TriplogError> {
        queries::sessions::delete_session(self.db()?, uid).await
    }

    async fn append_sample(&self, uid: &SessionUid, sample: &Sample) -> Result<(), TriplogError> {
        if !queries::samples::append_sample(self.db()?, uid, sample).await? {
            return Err(TriplogError::SessionNotFound {
                uid: uid.to_string(),
            });
        }
        Ok(())
    }

    async fn get_samples(
        &self,
        uid: &SessionUid,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Sample>, TriplogError> {
        queries::samples::get_samples(self.db()?, uid, offset, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use triplog_config::model::StorageBackend;
    use triplog_core::SessionStatus;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: path.to_string(),
            wal_mode: true,
            snapshot_path: None,
        }
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteSessionStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteSessionStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(store.initialize().await.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let store = SqliteSessionStore::new(make_config(db_path.to_str().unwrap()));

        assert!(store.health_check().await.is_err());
        store.initialize().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn unknown_uid_is_session_not_found() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("missing.db");
        let store = SqliteSessionStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        let uid = SessionUid::from_origin("ghost");
        let err = store
            .update_session(&uid, &SessionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TriplogError::SessionNotFound { .. }));
        let err = store
            .append_sample(&uid, &Sample::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TriplogError::SessionNotFound { .. }));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn full_session_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteSessionStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        let uid = SessionUid::from_origin("car-7");
        assert!(store.create_session(&uid, "car-7").await.unwrap());
        store
            .update_session(
                &uid,
                &SessionUpdate {
                    status: Some(SessionStatus::Ongoing),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .append_sample(&uid, &Sample::at(0.0, 48.8566, 2.3522))
            .await
            .unwrap();

        let record = store.get_session(&uid).await.unwrap().unwrap();
        assert_eq!(record.status, SessionStatus::Ongoing);
        assert_eq!(store.get_samples(&uid, None, None).await.unwrap().len(), 1);
        assert_eq!(store.list_sessions().await.unwrap().len(), 1);

        assert_eq!(store.delete_session(&uid).await.unwrap(), 1);
        assert!(store.get_session(&uid).await.unwrap().is_none());

        store.shutdown().await.unwrap();
        store.close().await.unwrap();
    }
}
