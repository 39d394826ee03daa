// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw record to canonical [`Sample`] mapping.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use tracing::{debug, warn};
use triplog_core::{GeoPoint, Sample, TelemetryField, TriplogError};

use crate::coerce::{Value, coerce, coerce_flag};
use crate::datetime::parse_device_time;
use crate::fields::FieldMap;

/// Turns raw `(key, value)` records into samples.
///
/// A normalizer belongs to one run: the first device time it accepts becomes
/// the epoch every later timestamp is measured from.
#[derive(Debug)]
pub struct SampleNormalizer<'m> {
    fields: &'m FieldMap,
    epoch: Option<NaiveDateTime>,
    not_supported: BTreeSet<String>,
}

impl<'m> SampleNormalizer<'m> {
    pub fn new(fields: &'m FieldMap) -> Self {
        Self {
            fields,
            epoch: None,
            not_supported: BTreeSet::new(),
        }
    }

    pub fn epoch(&self) -> Option<NaiveDateTime> {
        self.epoch
    }

    /// Source keys seen so far with no canonical mapping.
    pub fn not_supported(&self) -> &BTreeSet<String> {
        &self.not_supported
    }

    /// Normalizes one record given in column order.
    ///
    /// Empty values count as absent. Latitude and longitude are mandatory.
    pub fn normalize<'r, I>(&mut self, record: I) -> Result<Sample, TriplogError>
    where
        I: IntoIterator<Item = (&'r str, &'r str)>,
    {
        let mut raw: BTreeMap<TelemetryField, &'r str> = BTreeMap::new();
        for (key, value) in record {
            let Some(field) = self.fields.lookup(key) else {
                if self.not_supported.insert(key.to_string()) {
                    warn!(key, "no mapping found for source key");
                }
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            raw.entry(field).or_insert(value);
        }

        let mut sample = Sample::default();
        sample.latitude = mandatory_coordinate(&raw, TelemetryField::Latitude)?;
        sample.longitude = mandatory_coordinate(&raw, TelemetryField::Longitude)?;

        for (&field, &text) in &raw {
            match field {
                TelemetryField::Latitude
                | TelemetryField::Longitude
                | TelemetryField::DeviceTime
                | TelemetryField::Fix => {}
                _ => match coerce(text) {
                    Value::Number(n) => sample.set(field, n),
                    other => {
                        debug!(%field, value = ?other, "non-numeric value, using sentinel");
                    }
                },
            }
        }

        let derived = GeoPoint::new(sample.latitude, sample.longitude).is_fix();
        sample.fix = raw
            .get(&TelemetryField::Fix)
            .and_then(|text| coerce_flag(text))
            .unwrap_or(derived);

        if let Some(text) = raw.get(&TelemetryField::DeviceTime) {
            let time = parse_device_time(text)?;
            let epoch = *self.epoch.get_or_insert(time);
            sample.timestamp = (time - epoch).num_milliseconds() as f64 / 1000.0;
        }

        Ok(sample)
    }
}

fn mandatory_coordinate(
    raw: &BTreeMap<TelemetryField, &str>,
    field: TelemetryField,
) -> Result<f64, TriplogError> {
    let text = raw
        .get(&field)
        .ok_or(TriplogError::MissingMandatoryField {
            field: field.into(),
        })?;
    coerce(text)
        .as_f64()
        .ok_or_else(|| TriplogError::UnparsableRecord {
            reason: format!("{field} `{text}` is not a number"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const LAT: &str = "GPS Latitude(°)";
    const LON: &str = "GPS Longitude(°)";
    const TIME: &str = "Device Time";

    #[test]
    fn first_record_is_epoch_and_later_ones_are_relative() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);

        let first = normalizer
            .normalize([(TIME, "11-mai-2016 20:23:42.000"), (LAT, "48.85"), (LON, "2.35")])
            .unwrap();
        assert_eq!(first.timestamp, 0.0);
        assert!(first.fix);

        let second = normalizer
            .normalize([(TIME, "11-mai-2016 20:24:42.000"), (LAT, "48.86"), (LON, "2.36")])
            .unwrap();
        assert_eq!(second.timestamp, 60.0);
    }

    #[test]
    fn missing_coordinates_are_rejected() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);
        let err = normalizer.normalize([(LAT, "48.85")]).unwrap_err();
        assert!(matches!(
            err,
            TriplogError::MissingMandatoryField { field: "longitude" }
        ));
        let err = normalizer.normalize([(LAT, ""), (LON, "2.0")]).unwrap_err();
        assert!(matches!(
            err,
            TriplogError::MissingMandatoryField { field: "latitude" }
        ));
    }

    #[test]
    fn non_numeric_coordinate_is_unparsable() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);
        let err = normalizer
            .normalize([(LAT, "north"), (LON, "2.0")])
            .unwrap_err();
        assert!(matches!(err, TriplogError::UnparsableRecord { .. }));
    }

    #[test]
    fn bad_device_time_rejects_without_setting_epoch() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);
        let err = normalizer
            .normalize([(TIME, "someday"), (LAT, "1"), (LON, "1")])
            .unwrap_err();
        assert!(matches!(err, TriplogError::UnparsableRecord { .. }));
        assert!(normalizer.epoch().is_none());
    }

    #[test]
    fn dash_and_text_values() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);
        let sample = normalizer
            .normalize([
                (LAT, "0"),
                (LON, "-"),
                ("Engine RPM(rpm)", "-"),
                ("Speed (OBD)(km/h)", "n/a"),
                ("GPS Altitude(m)", "35"),
            ])
            .unwrap();
        assert_eq!(sample.rpm, 0.0);
        assert_eq!(sample.obd_speed, -1.0);
        assert_eq!(sample.altitude, 35.0);
        assert!(!sample.fix);
        assert_eq!(sample.timestamp, -1.0);
        assert_eq!(sample.accel_x, 0.0);
    }

    #[test]
    fn explicit_fix_column_overrides_derivation() {
        let fields = FieldMap::torque().with_alias("fix", TelemetryField::Fix);
        let mut normalizer = SampleNormalizer::new(&fields);
        let sample = normalizer
            .normalize([(LAT, "48.0"), (LON, "2.0"), ("fix", "false")])
            .unwrap();
        assert!(!sample.fix);
    }

    #[test]
    fn first_column_with_a_value_wins() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);
        let sample = normalizer
            .normalize([
                ("Latitude", ""),
                (LAT, "48.5"),
                ("Latitude", "10.0"),
                (LON, "2.0"),
            ])
            .unwrap();
        assert_eq!(sample.latitude, 48.5);
    }

    #[test]
    #[traced_test]
    fn unknown_keys_are_reported_once() {
        let fields = FieldMap::torque();
        let mut normalizer = SampleNormalizer::new(&fields);
        for _ in 0..3 {
            normalizer
                .normalize([(LAT, "1"), (LON, "1"), ("GPS Satellites", "7")])
                .unwrap();
        }
        assert_eq!(normalizer.not_supported().len(), 1);
        assert!(normalizer.not_supported().contains("GPS Satellites"));
        logs_assert(|lines: &[&str]| {
            let hits = lines
                .iter()
                .filter(|line| line.contains("no mapping found for source key"))
                .count();
            if hits == 1 {
                Ok(())
            } else {
                Err(format!("expected one warning, got {hits}"))
            }
        });
    }
}
