// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the ingest pipeline, the session engine and the
//! storage adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

/// Distance and duration value stored before a session has one.
pub const UNSET_METRIC: f64 = -1.0;

/// Content-derived identifier of a trip session.
///
/// The same origin always yields the same uid, which makes session creation
/// idempotent across processes and storage backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionUid(pub String);

impl SessionUid {
    /// Derives the uid as the lowercase hex SHA-256 digest of `origin`.
    pub fn from_origin(origin: &str) -> Self {
        let digest = Sha256::digest(origin.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a trip session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    NotStarted,
    Ongoing,
    Terminated,
}

/// A WGS84 coordinate pair. `(0, 0)` means "no fix".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const NO_FIX: GeoPoint = GeoPoint {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// A point is a real fix when neither coordinate is zero.
    pub fn is_fix(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Canonical telemetry fields a raw exporter column can map to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TelemetryField {
    DeviceTime,
    Latitude,
    Longitude,
    Fix,
    Altitude,
    GpsSpeed,
    Direction,
    Rpm,
    ObdSpeed,
    CoolantTemp,
    OilTemp,
    AccelX,
    AccelY,
    AccelZ,
}

impl TelemetryField {
    /// Fields computed from other fields when the exporter does not provide them.
    pub fn is_derivable(&self) -> bool {
        matches!(self, TelemetryField::Fix)
    }

    /// The value a sample carries when the field is absent.
    pub fn sentinel(&self) -> f64 {
        match self {
            TelemetryField::Latitude
            | TelemetryField::Longitude
            | TelemetryField::AccelX
            | TelemetryField::AccelY
            | TelemetryField::AccelZ => 0.0,
            _ => -1.0,
        }
    }
}

/// One canonical telemetry reading.
///
/// Every field is always populated; absent readings carry the sentinel given
/// by [`TelemetryField::sentinel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the first record of the run.
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub fix: bool,
    pub altitude: f64,
    pub gps_speed: f64,
    pub direction: f64,
    pub rpm: f64,
    pub obd_speed: f64,
    pub coolant_temp: f64,
    pub oil_temp: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    /// Cumulative trip distance in km at this sample.
    pub distance: f64,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            timestamp: -1.0,
            latitude: 0.0,
            longitude: 0.0,
            fix: false,
            altitude: -1.0,
            gps_speed: -1.0,
            direction: -1.0,
            rpm: -1.0,
            obd_speed: -1.0,
            coolant_temp: -1.0,
            oil_temp: -1.0,
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 0.0,
            distance: 0.0,
        }
    }
}

impl Sample {
    /// Builds a sample at a position, deriving `fix` from the coordinates.
    pub fn at(timestamp: f64, latitude: f64, longitude: f64) -> Self {
        let position = GeoPoint::new(latitude, longitude);
        Self {
            timestamp,
            latitude,
            longitude,
            fix: position.is_fix(),
            ..Self::default()
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Writes a numeric value into the field it belongs to.
    ///
    /// `DeviceTime` and `Fix` are not plain numeric fields and are ignored here.
    pub fn set(&mut self, field: TelemetryField, value: f64) {
        match field {
            TelemetryField::Latitude => self.latitude = value,
            TelemetryField::Longitude => self.longitude = value,
            TelemetryField::Altitude => self.altitude = value,
            TelemetryField::GpsSpeed => self.gps_speed = value,
            TelemetryField::Direction => self.direction = value,
            TelemetryField::Rpm => self.rpm = value,
            TelemetryField::ObdSpeed => self.obd_speed = value,
            TelemetryField::CoolantTemp => self.coolant_temp = value,
            TelemetryField::OilTemp => self.oil_temp = value,
            TelemetryField::AccelX => self.accel_x = value,
            TelemetryField::AccelY => self.accel_y = value,
            TelemetryField::AccelZ => self.accel_z = value,
            TelemetryField::DeviceTime | TelemetryField::Fix => {}
        }
    }
}

/// Persisted shape of a trip session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub uid: SessionUid,
    pub origin: String,
    pub status: SessionStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub start_point: Option<GeoPoint>,
    pub end_date: Option<DateTime<Utc>>,
    pub end_point: Option<GeoPoint>,
    pub first_address: Option<String>,
    pub last_address: Option<String>,
    /// Kilometres, [`UNSET_METRIC`] until the vehicle first moves.
    pub distance: f64,
    /// Seconds, [`UNSET_METRIC`] until the session terminates.
    pub duration: f64,
    pub last_comm: DateTime<Utc>,
}

impl SessionRecord {
    /// A freshly created session in `NOT_STARTED`.
    pub fn new(uid: SessionUid, origin: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            origin: origin.into(),
            status: SessionStatus::NotStarted,
            start_date: None,
            start_point: None,
            end_date: None,
            end_point: None,
            first_address: None,
            last_address: None,
            distance: UNSET_METRIC,
            duration: UNSET_METRIC,
            last_comm: now,
        }
    }
}

/// A partial update of a [`SessionRecord`]. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub start_point: Option<GeoPoint>,
    pub end_date: Option<DateTime<Utc>>,
    pub end_point: Option<GeoPoint>,
    pub first_address: Option<String>,
    pub last_address: Option<String>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
}

impl SessionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == SessionUpdate::default()
    }

    /// Merges the set fields into `record`.
    pub fn apply_to(&self, record: &mut SessionRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(date) = self.start_date {
            record.start_date = Some(date);
        }
        if let Some(point) = self.start_point {
            record.start_point = Some(point);
        }
        if let Some(date) = self.end_date {
            record.end_date = Some(date);
        }
        if let Some(point) = self.end_point {
            record.end_point = Some(point);
        }
        if let Some(address) = &self.first_address {
            record.first_address = Some(address.clone());
        }
        if let Some(address) = &self.last_address {
            record.last_address = Some(address.clone());
        }
        if let Some(distance) = self.distance {
            record.distance = distance;
        }
        if let Some(duration) = self.duration {
            record.duration = duration;
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Geocoder,
}
