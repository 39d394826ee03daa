// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence for the Triplog trip engine.
//!
//! Two [`SessionStore`](triplog_core::SessionStore) backends live here:
//! a WAL-mode SQLite store with embedded migrations and a single-writer
//! concurrency model via `tokio-rusqlite`, and a JSON document store with an
//! optional snapshot file.

pub mod adapter;
pub mod database;
pub mod document;
pub mod migrations;
pub mod queries;

use std::sync::Arc;

use triplog_config::model::{StorageBackend, StorageConfig};
use triplog_core::SessionStore;

pub use adapter::SqliteSessionStore;
pub use database::Database;
pub use document::DocumentSessionStore;

/// Build the store selected by `config.backend`. Call `initialize` before use.
pub fn store_from_config(config: &StorageConfig) -> Arc<dyn SessionStore> {
    match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteSessionStore::new(config.clone())),
        StorageBackend::Document => match &config.snapshot_path {
            Some(path) => Arc::new(DocumentSessionStore::with_snapshot(path)),
            None => Arc::new(DocumentSessionStore::new()),
        },
    }
}
