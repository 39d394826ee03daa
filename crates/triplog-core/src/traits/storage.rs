// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for trip sessions and their samples.

use async_trait::async_trait;

use crate::error::TriplogError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Sample, SessionRecord, SessionUid, SessionUpdate};

/// Adapter for session persistence backends.
///
/// Implementations own the storage layout. Every mutation refreshes the
/// session's `last_comm`. Samples are kept in append order and returned sorted
/// by timestamp.
#[async_trait]
pub trait SessionStore: PluginAdapter {
    /// Initializes the backend (migrations, snapshot loading, etc.).
    async fn initialize(&self) -> Result<(), TriplogError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), TriplogError>;

    /// Creates a `NOT_STARTED` session. Returns `false` if `uid` already exists.
    async fn create_session(&self, uid: &SessionUid, origin: &str) -> Result<bool, TriplogError>;

    async fn get_session(&self, uid: &SessionUid) -> Result<Option<SessionRecord>, TriplogError>;

    /// All sessions, most recently active first.
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, TriplogError>;

    /// Merges the set fields of `update` into the stored session.
    async fn update_session(
        &self,
        uid: &SessionUid,
        update: &SessionUpdate,
    ) -> Result<(), TriplogError>;

    /// Deletes a session and its samples, returning the number of sessions removed.
    async fn delete_session(&self, uid: &SessionUid) -> Result<u64, TriplogError>;

    async fn append_sample(&self, uid: &SessionUid, sample: &Sample) -> Result<(), TriplogError>;

    /// Samples ordered by timestamp, optionally paged.
    async fn get_samples(
        &self,
        uid: &SessionUid,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Sample>, TriplogError>;
}
