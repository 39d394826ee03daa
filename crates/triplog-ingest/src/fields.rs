// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source column dictionary.

use std::collections::BTreeMap;
use std::str::FromStr;

use triplog_config::IngestConfig;
use triplog_core::{TelemetryField, TriplogError};

/// Torque Pro column headers and the canonical field each one carries.
const TORQUE_COLUMNS: &[(&str, TelemetryField)] = &[
    ("Device Time", TelemetryField::DeviceTime),
    ("GPS Latitude(°)", TelemetryField::Latitude),
    ("Latitude", TelemetryField::Latitude),
    ("GPS Longitude(°)", TelemetryField::Longitude),
    ("Longitude", TelemetryField::Longitude),
    ("GPS Altitude(m)", TelemetryField::Altitude),
    ("Altitude", TelemetryField::Altitude),
    ("Speed (GPS)(km/h)", TelemetryField::GpsSpeed),
    ("GPS Bearing(°)", TelemetryField::Direction),
    ("Bearing", TelemetryField::Direction),
    ("Engine RPM(rpm)", TelemetryField::Rpm),
    ("Speed (OBD)(km/h)", TelemetryField::ObdSpeed),
    ("Engine Coolant Temperature(°C)", TelemetryField::CoolantTemp),
    ("Engine Oil Temperature(°C)", TelemetryField::OilTemp),
    ("Acceleration Sensor(X axis)(g)", TelemetryField::AccelX),
    ("G(x)", TelemetryField::AccelX),
    ("Acceleration Sensor(Y axis)(g)", TelemetryField::AccelY),
    ("G(y)", TelemetryField::AccelY),
    ("Acceleration Sensor(Z axis)(g)", TelemetryField::AccelZ),
    ("G(z)", TelemetryField::AccelZ),
];

/// Maps raw source keys to canonical [`TelemetryField`]s.
///
/// Several source spellings may map to the same field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: BTreeMap<String, TelemetryField>,
}

impl FieldMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The Torque Pro dictionary.
    pub fn torque() -> Self {
        TORQUE_COLUMNS
            .iter()
            .fold(Self::empty(), |map, (key, field)| map.with_alias(*key, *field))
    }

    /// The Torque dictionary extended with `[ingest.field_aliases]`.
    pub fn from_config(config: &IngestConfig) -> Result<Self, TriplogError> {
        let mut map = Self::torque();
        for (source, target) in &config.field_aliases {
            let field = TelemetryField::from_str(target).map_err(|_| {
                TriplogError::Config(format!(
                    "ingest.field_aliases: `{source}` maps to unknown field `{target}`"
                ))
            })?;
            map.insert(source.clone(), field);
        }
        Ok(map)
    }

    pub fn with_alias(mut self, source: impl Into<String>, field: TelemetryField) -> Self {
        self.insert(source.into(), field);
        self
    }

    pub fn insert(&mut self, source: String, field: TelemetryField) {
        self.entries.insert(source, field);
    }

    /// Looks a key up exactly, then with surrounding whitespace trimmed.
    pub fn lookup(&self, key: &str) -> Option<TelemetryField> {
        self.entries
            .get(key)
            .or_else(|| self.entries.get(key.trim()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
