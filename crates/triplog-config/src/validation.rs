// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as finite thresholds, non-empty paths, and canonical alias targets.

use strum::VariantNames;
use triplog_core::TelemetryField;

use crate::diagnostic::{ConfigError, ConfigKey};
use crate::model::{StorageBackend, TriplogConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast). Each error names
/// the offending key so it can be located in the source files.
pub fn validate_config(config: &TriplogConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::unknown_value(
            ConfigKey::parse("log.level"),
            &config.log.level,
            LOG_LEVELS,
        ));
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty with the sqlite backend",
        ));
    }

    if config
        .storage
        .snapshot_path
        .as_deref()
        .is_some_and(|path| path.trim().is_empty())
    {
        errors.push(ConfigError::invalid(
            "storage.snapshot_path",
            "must not be empty when set",
        ));
    }

    let threshold = config.trip.dilution_threshold_km;
    if !threshold.is_finite() || threshold < 0.0 {
        errors.push(ConfigError::invalid(
            "trip.dilution_threshold_km",
            format!("must be a non-negative number of km, got {threshold}"),
        ));
    }

    if config.geocode.timeout_secs == 0 {
        errors.push(ConfigError::invalid("geocode.timeout_secs", "must be at least 1"));
    }

    if config.geocode.enabled
        && config
            .geocode
            .api_key
            .as_deref()
            .is_none_or(|key| key.trim().is_empty())
    {
        errors.push(ConfigError::invalid(
            "geocode.api_key",
            "required when geocode.enabled = true (or set TRIPLOG_GEOCODE_API_KEY)",
        ));
    }

    if config.geocode.placeholder.trim().is_empty() {
        errors.push(ConfigError::invalid("geocode.placeholder", "must not be empty"));
    }

    if config.ingest.progress_every == 0 {
        errors.push(ConfigError::invalid("ingest.progress_every", "must be at least 1"));
    }

    let aliases = ConfigKey::parse("ingest.field_aliases");
    for (column, target) in &config.ingest.field_aliases {
        if !TelemetryField::VARIANTS.contains(&target.as_str()) {
            errors.push(ConfigError::unknown_value(
                aliases.child(column.clone()),
                target,
                TelemetryField::VARIANTS,
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_key(errors: &[ConfigError], key: &str) -> bool {
        errors
            .iter()
            .any(|e| e.key().is_some_and(|k| k.to_string() == key))
    }

    #[test]
    fn default_config_validates() {
        let config = TriplogConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_for_sqlite_only() {
        let mut config = TriplogConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_key(&errors, "storage.database_path"));

        config.storage.backend = StorageBackend::Document;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn negative_threshold_fails_validation() {
        let mut config = TriplogConfig::default();
        config.trip.dilution_threshold_km = -0.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_key(&errors, "trip.dilution_threshold_km"));

        config.trip.dilution_threshold_km = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn enabled_geocoding_requires_api_key() {
        let mut config = TriplogConfig::default();
        config.geocode.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_key(&errors, "geocode.api_key"));

        config.geocode.api_key = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn alias_to_unknown_field_fails_validation() {
        let mut config = TriplogConfig::default();
        config
            .ingest
            .field_aliases
            .insert("Lat".to_string(), "latitude".to_string());
        assert!(validate_config(&config).is_ok());

        config
            .ingest
            .field_aliases
            .insert("Boost".to_string(), "turbo_pressure".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_key(&errors, "ingest.field_aliases.Boost"));
        assert!(matches!(
            &errors[0],
            ConfigError::UnknownValue { value, expected, .. }
                if value == "turbo_pressure" && expected.contains("coolant_temp")
        ));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = TriplogConfig::default();
        config.log.level = "loud".to_string();
        config.geocode.timeout_secs = 0;
        config.ingest.progress_every = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
