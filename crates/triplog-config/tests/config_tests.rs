// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Triplog configuration system.

use triplog_config::diagnostic::{ConfigError, ConfigKey};
use triplog_config::model::{StorageBackend, TriplogConfig};
use triplog_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_triplog_config() {
    let toml = r#"
[log]
level = "debug"

[storage]
backend = "document"
database_path = "/tmp/trips.db"
wal_mode = false
snapshot_path = "/tmp/sessions.json"

[geocode]
enabled = true
api_key = "oc-123"
language = "en"
timeout_secs = 3
daily_request_limit = 100
placeholder = "n/a"

[trip]
dilution_threshold_km = 0.5

[ingest]
progress_every = 500

[ingest.field_aliases]
"Lat" = "latitude"
"Lon" = "longitude"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.storage.backend, StorageBackend::Document);
    assert_eq!(config.storage.database_path, "/tmp/trips.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(
        config.storage.snapshot_path.as_deref(),
        Some("/tmp/sessions.json")
    );
    assert!(config.geocode.enabled);
    assert_eq!(config.geocode.api_key.as_deref(), Some("oc-123"));
    assert_eq!(config.geocode.language, "en");
    assert_eq!(config.geocode.timeout_secs, 3);
    assert_eq!(config.geocode.daily_request_limit, Some(100));
    assert_eq!(config.geocode.placeholder, "n/a");
    assert_eq!(config.trip.dilution_threshold_km, 0.5);
    assert_eq!(config.ingest.progress_every, 500);
    assert_eq!(config.ingest.field_aliases.len(), 2);
    assert_eq!(config.ingest.field_aliases["Lat"], "latitude");
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.log.level, "info");
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert!(config.storage.wal_mode);
    assert!(config.storage.database_path.ends_with("triplog.db"));
    assert!(!config.geocode.enabled);
    assert!(config.geocode.api_key.is_none());
    assert_eq!(
        config.geocode.base_url,
        "https://api.opencagedata.com/geocode/v1/json"
    );
    assert_eq!(config.geocode.language, "fr");
    assert_eq!(config.geocode.daily_request_limit, Some(2500));
    assert_eq!(config.geocode.placeholder, "<Limit reached, try later>");
    assert_eq!(config.trip.dilution_threshold_km, 1.0);
    assert_eq!(config.ingest.progress_every, 100);
    assert!(config.ingest.field_aliases.is_empty());
}

/// Unknown field in [geocode] is rejected.
#[test]
fn unknown_field_in_geocode_produces_error() {
    let toml = r#"
[geocode]
langage = "en"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("langage"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown top-level section is rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[mqtt]
broker = "localhost"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Serialized defaults survive a TOML round trip through the Figment layer.
#[test]
fn serialized_defaults_are_sensible() {
    let defaults = TriplogConfig::default();
    let text = toml::to_string(&defaults).expect("defaults serialize");
    let reloaded = load_config_from_str(&text).expect("serialized defaults reload");
    assert_eq!(reloaded.trip.dilution_threshold_km, 1.0);
    assert_eq!(reloaded.geocode.timeout_secs, defaults.geocode.timeout_secs);
}

/// Error output from load_and_validate_str includes the unknown key and a suggestion.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[trip]
dilution_treshold_km = 2.0
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key.to_string() == "trip.dilution_treshold_km"
                && suggestion.as_deref() == Some("dilution_threshold_km")
                && valid_keys.contains("dilution_threshold_km")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error with suggestion, got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[geocode]
timeout_secs = "soon"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("timeout_secs"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: ConfigKey::parse("geocode.langage"),
        suggestion: Some("language".to_string()),
        valid_keys: "enabled, api_key, language".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `language`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("langage"));
}

fn span_text<'a>(toml: &'a str, error: &ConfigError) -> &'a str {
    let span = match error {
        ConfigError::UnknownKey { span, .. }
        | ConfigError::UnknownValue { span, .. }
        | ConfigError::InvalidValue { span, .. } => span.expect("span attached"),
        ConfigError::Other(_) => panic!("no span on {error:?}"),
    };
    &toml[span.offset()..span.offset() + span.len()]
}

/// The unknown key is underlined in the source it came from.
#[test]
fn unknown_key_points_at_the_typo() {
    let toml = "[trip]\ndilution_treshold_km = 2.0\n";
    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert_eq!(span_text(toml, &errors[0]), "dilution_treshold_km");
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_geocoding_without_key() {
    let toml = r#"
[geocode]
enabled = true
"#;

    let errors = load_and_validate_str(toml).expect_err("missing key should fail");
    let error = errors
        .iter()
        .find(|e| e.key().is_some_and(|k| k.to_string() == "geocode.api_key"))
        .expect("api_key error");
    // The key is absent, so the enclosing table is underlined.
    assert_eq!(span_text(toml, error), "geocode");
}

/// A semantic check points at the key that carries the bad value.
#[test]
fn negative_threshold_points_at_its_key() {
    let toml = r#"
[trip]
dilution_threshold_km = -1.5
"#;

    let errors = load_and_validate_str(toml).expect_err("negative threshold should fail");
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ConfigError::InvalidValue { message, .. } if message.contains("-1.5")));
    assert_eq!(span_text(toml, &errors[0]), "dilution_threshold_km");
}

/// An alias to a field that does not exist names the column and suggests the field.
#[test]
fn unknown_alias_target_points_at_its_column() {
    let toml = r#"
[ingest.field_aliases]
"GPS Lat" = "lattitude"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad alias should fail");
    let ConfigError::UnknownValue { key, suggestion, .. } = &errors[0] else {
        panic!("unexpected error {errors:?}");
    };
    assert_eq!(key.to_string(), r#"ingest.field_aliases."GPS Lat""#);
    assert_eq!(suggestion.as_deref(), Some("latitude"));
    assert_eq!(span_text(toml, &errors[0]), r#""GPS Lat""#);
}

/// Unknown storage backend is a deserialization error, not a silent default.
#[test]
fn unknown_backend_is_rejected() {
    let toml = r#"
[storage]
backend = "mongodb"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown backend should fail");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownValue { key, value, .. }
                if key.to_string() == "storage.backend" && value == "mongodb"
        )),
        "got: {errors:?}"
    );
}
