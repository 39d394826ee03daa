// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Triplog trip engine.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use triplog_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("dilution threshold: {} km", config.trip.dilution_threshold_km);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, ConfigKey, ConfigSources, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    GeocodeConfig, IngestConfig, LogConfig, StorageBackend, StorageConfig, TripConfig,
    TriplogConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. Either kind of failure becomes a diagnostic pointing at the key in
///    the file that set it
pub fn load_and_validate() -> Result<TriplogConfig, Vec<ConfigError>> {
    let sources = ConfigSources::read(loader::search_paths());
    finish(loader::load_config(), &sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<TriplogConfig, Vec<ConfigError>> {
    let sources = ConfigSources::read([path]);
    finish(loader::load_config_from_path(path), &sources)
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TriplogConfig, Vec<ConfigError>> {
    let mut sources = ConfigSources::new();
    sources.push("<inline>", toml_content);
    finish(loader::load_config_from_str(toml_content), &sources)
}

fn finish(
    loaded: Result<TriplogConfig, figment::Error>,
    sources: &ConfigSources,
) -> Result<TriplogConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::from_figment(err, sources))?;
    validation::validate_config(&config).map_err(|errors| {
        errors
            .into_iter()
            .map(|error| error.located(sources, None))
            .collect::<Vec<_>>()
    })?;
    Ok(config)
}
