// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./triplog.toml` > `~/.config/triplog/triplog.toml` > `/etc/triplog/triplog.toml`
//! with environment variable overrides via `TRIPLOG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TriplogConfig;

/// Top-level sections that environment variables are routed into.
const SECTIONS: &[&str] = &["log", "storage", "geocode", "trip", "ingest"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/triplog/triplog.toml` (system-wide)
/// 3. `~/.config/triplog/triplog.toml` (user XDG config)
/// 4. `./triplog.toml` (local directory)
/// 5. `TRIPLOG_*` environment variables
pub fn load_config() -> Result<TriplogConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TriplogConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TriplogConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TriplogConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TriplogConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files consulted by [`load_config`], highest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("triplog.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("triplog").join("triplog.toml"));
    }
    paths.push(PathBuf::from("/etc/triplog/triplog.toml"));
    paths
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    let files = search_paths()
        .into_iter()
        .rev()
        .fold(Figment::new(), |figment, path| figment.merge(Toml::file(path)));
    Figment::new()
        .merge(Serialized::defaults(TriplogConfig::default()))
        .merge(files)
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `TRIPLOG_GEOCODE_API_KEY` maps to `geocode.api_key`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("TRIPLOG_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
