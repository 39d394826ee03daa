// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reads a Torque-shaped export from disk.

use std::io::Write;

use triplog_core::TelemetryField;
use triplog_ingest::{FieldMap, RecordSource, TelemetryIngestParser};

const HEADER: &str = "GPS Time, Device Time, Longitude, Latitude,GPS Speed (Meters/second), \
Horizontal Dilution of Precision, Altitude, Bearing, G(x), G(y), G(z), G(calibrated),\
Engine Coolant Temperature(°C),Engine RPM(rpm),Speed (OBD)(km/h)";

fn write_log(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

#[test]
fn padded_torque_headers_map_and_report() {
    let file = write_log(&[
        "Wed May 11 20:23:42 GMT+02:00 2016,11-mai-2016 20:23:42.000,2.3522,48.8566,0,1.2,35,90,0.01,0.02,0.98,1,71,850,0",
        "Wed May 11 20:23:43 GMT+02:00 2016,11-mai-2016 20:23:43.500,2.3523,48.8567,4,1.2,35,91,0.03,-0.01,0.99,1,72,1200,12",
    ]);

    let parser = TelemetryIngestParser::open(
        RecordSource::File(file.path().to_path_buf()),
        FieldMap::torque(),
    )
    .unwrap()
    .with_progress_every(1);

    let report = parser.report();
    assert_eq!(report.total_records, 2);
    for unmapped in [
        "GPS Time",
        "GPS Speed (Meters/second)",
        " Horizontal Dilution of Precision",
        " G(calibrated)",
    ] {
        assert!(
            report.not_supported_fields.contains(unmapped),
            "{unmapped} should be reported, got {:?}",
            report.not_supported_fields
        );
    }
    assert!(report.missing_fields.contains(&TelemetryField::GpsSpeed));
    assert!(!report.missing_fields.contains(&TelemetryField::AccelZ));

    let samples: Vec<_> = parser.samples().unwrap().collect();
    assert_eq!(samples.len(), 2);
    let last = &samples[1];
    assert_eq!(last.timestamp, 1.5);
    assert_eq!(last.latitude, 48.8567);
    assert_eq!(last.direction, 91.0);
    assert_eq!(last.accel_y, -0.01);
    assert_eq!(last.coolant_temp, 72.0);
    assert_eq!(last.obd_speed, 12.0);
    assert_eq!(last.gps_speed, -1.0);
    assert!(last.fix);
}

#[test]
fn configured_alias_fills_a_missing_field() {
    let file = write_log(&[
        "x,11-mai-2016 20:23:42.000,2.35,48.85,13.5,1,35,0,0,0,1,1,70,800,0",
    ]);
    let fields = FieldMap::torque().with_alias("GPS Speed (Meters/second)", TelemetryField::GpsSpeed);
    let parser =
        TelemetryIngestParser::open(RecordSource::File(file.path().to_path_buf()), fields).unwrap();
    assert!(!parser.report().missing_fields.contains(&TelemetryField::GpsSpeed));
    let sample = parser.samples().unwrap().next().unwrap();
    assert_eq!(sample.gps_speed, 13.5);
}
