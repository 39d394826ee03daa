// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Triplog trip engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Triplog configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriplogConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Session storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reverse-geocoding settings.
    #[serde(default)]
    pub geocode: GeocodeConfig,

    /// Trip validity settings.
    #[serde(default)]
    pub trip: TripConfig,

    /// Telemetry import settings.
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which [`SessionStore`](triplog_core::SessionStore) implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Relational store in a SQLite database file.
    #[default]
    Sqlite,
    /// JSON document store, optionally snapshotted to a file.
    Document,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// JSON snapshot file for the document backend. `None` keeps documents in memory only.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            snapshot_path: None,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("triplog").join("triplog.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("triplog.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Reverse-geocoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeocodeConfig {
    /// Resolve first/last addresses of trips.
    #[serde(default)]
    pub enabled: bool,

    /// OpenCage API key. Required when `enabled` is true.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_geocode_base_url")]
    pub base_url: String,

    /// Language of formatted addresses.
    #[serde(default = "default_geocode_language")]
    pub language: String,

    /// Upper bound on a single reverse-geocoding request.
    #[serde(default = "default_geocode_timeout_secs")]
    pub timeout_secs: u64,

    /// Requests allowed per UTC day. `None` means unlimited.
    #[serde(default = "default_daily_request_limit")]
    pub daily_request_limit: Option<u32>,

    /// Address recorded when the quota is exhausted.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: default_geocode_base_url(),
            language: default_geocode_language(),
            timeout_secs: default_geocode_timeout_secs(),
            daily_request_limit: default_daily_request_limit(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_geocode_base_url() -> String {
    "https://api.opencagedata.com/geocode/v1/json".to_string()
}

fn default_geocode_language() -> String {
    "fr".to_string()
}

fn default_geocode_timeout_secs() -> u64 {
    10
}

fn default_daily_request_limit() -> Option<u32> {
    Some(2500)
}

fn default_placeholder() -> String {
    "<Limit reached, try later>".to_string()
}

/// Trip validity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TripConfig {
    /// Trips whose bounding-box diagonal is shorter than this are discarded.
    #[serde(default = "default_dilution_threshold_km")]
    pub dilution_threshold_km: f64,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            dilution_threshold_km: default_dilution_threshold_km(),
        }
    }
}

fn default_dilution_threshold_km() -> f64 {
    1.0
}

/// Telemetry import configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Extra source column names mapped to canonical field names.
    #[serde(default)]
    pub field_aliases: BTreeMap<String, String>,

    /// Log progress every N records.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            field_aliases: BTreeMap::new(),
            progress_every: default_progress_every(),
        }
    }
}

fn default_progress_every() -> u64 {
    100
}
