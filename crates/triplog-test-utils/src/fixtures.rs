// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Torque-shaped CSV fixtures.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};

const FRENCH_MONTHS: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

pub const TORQUE_HEADER: &str = "GPS Time, Device Time, Longitude, Latitude,GPS Speed (Meters/second), \
Altitude, Bearing, G(x), G(y), G(z),Engine RPM(rpm),Speed (OBD)(km/h),Engine Coolant Temperature(°C)";

/// Formats a time the way a French-locale Torque export does.
pub fn torque_time(time: NaiveDateTime) -> String {
    let month = FRENCH_MONTHS[time.month0() as usize];
    format!(
        "{:02}-{month}-{}",
        time.day(),
        time.format("%Y %H:%M:%S%.3f")
    )
}

/// Builder for a Torque trackLog export.
#[derive(Debug, Clone)]
pub struct TorqueLog {
    start: NaiveDateTime,
    rows: Vec<String>,
}

impl TorqueLog {
    /// A log starting at 2016-05-11 20:23:42, like the recordings it mimics.
    pub fn new() -> Self {
        let start = NaiveDate::from_ymd_opt(2016, 5, 11)
            .and_then(|d| d.and_hms_opt(20, 23, 42))
            .unwrap_or_default();
        Self::starting_at(start)
    }

    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            rows: Vec::new(),
        }
    }

    /// Adds a row `offset_secs` after the start at the given position.
    pub fn fix(mut self, offset_secs: i64, latitude: f64, longitude: f64) -> Self {
        let time = self.start + TimeDelta::seconds(offset_secs);
        self.rows.push(format!(
            "-,{},{longitude},{latitude},0,35,0,0.01,0.02,0.98,850,0,71",
            torque_time(time)
        ));
        self
    }

    /// Adds a row with "no fix" coordinates.
    pub fn no_fix(self, offset_secs: i64) -> Self {
        self.fix(offset_secs, 0.0, 0.0)
    }

    /// Adds a verbatim row.
    pub fn raw(mut self, row: impl Into<String>) -> Self {
        self.rows.push(row.into());
        self
    }

    pub fn to_csv(&self) -> String {
        let mut text = String::from(TORQUE_HEADER);
        text.push('\n');
        for row in &self.rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    /// Writes the log as `trackLog.csv` inside `dir`.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join("trackLog.csv");
        std::fs::write(&path, self.to_csv())?;
        Ok(path)
    }
}

impl Default for TorqueLog {
    fn default() -> Self {
        Self::new()
    }
}

/// The Paris scenario: no fix, Hôtel de Ville, then the Louvre.
pub fn paris_trip() -> TorqueLog {
    TorqueLog::new()
        .no_fix(0)
        .fix(10, 48.8566, 2.3522)
        .fix(20, 48.8606, 2.3376)
}
