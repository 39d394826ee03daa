// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON document implementation of the SessionStore trait.
//!
//! Sessions and samples are kept as `serde_json` documents in two
//! collections. Updates are merged into the stored document key by key.
//! Documents are converted to typed records through explicit field mappings,
//! so keys written by older exporters (`_id`, `car_datas`, ...) are logged and
//! dropped instead of leaking into the record.
//!
//! With a snapshot path configured, the collections are loaded on
//! [`SessionStore::initialize`] and written back on [`SessionStore::close`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info};

use triplog_core::{
    AdapterType, GeoPoint, HealthStatus, PluginAdapter, Sample, SessionRecord, SessionStatus,
    SessionStore, SessionUid, SessionUpdate, TelemetryField, TriplogError, UNSET_METRIC,
};

/// A schemaless JSON object.
pub type Document = Map<String, Value>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    #[serde(default)]
    sessions: BTreeMap<String, Document>,
    #[serde(default)]
    samples: BTreeMap<String, Vec<Document>>,
}

/// In-process document store.
pub struct DocumentSessionStore {
    snapshot_path: Option<PathBuf>,
    data: Mutex<Collections>,
}

impl DocumentSessionStore {
    /// A store that lives only in memory.
    pub fn new() -> Self {
        Self {
            snapshot_path: None,
            data: Mutex::new(Collections::default()),
        }
    }

    /// A store persisted to a JSON snapshot file.
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(path.into()),
            data: Mutex::new(Collections::default()),
        }
    }

    async fn write_snapshot(&self) -> Result<(), TriplogError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let data = self.data.lock().await;
        let text = serde_json::to_string_pretty(&*data).map_err(storage_err)?;
        tokio::fs::write(path, text).await.map_err(storage_err)?;
        debug!(path = %path.display(), sessions = data.sessions.len(), "snapshot written");
        Ok(())
    }
}

impl Default for DocumentSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_err<E>(e: E) -> TriplogError
where
    E: std::error::Error + Send + Sync + 'static,
{
    TriplogError::Storage {
        source: Box::new(e),
    }
}

fn invalid(message: String) -> TriplogError {
    TriplogError::Storage {
        source: message.into(),
    }
}

fn date_value(date: &DateTime<Utc>) -> Value {
    Value::String(date.to_rfc3339())
}

fn point_value(point: &GeoPoint) -> Value {
    json!({ "latitude": point.latitude, "longitude": point.longitude })
}

fn read_date(key: &str, value: &Value) -> Result<Option<DateTime<Utc>>, TriplogError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| invalid(format!("field `{key}`: {e}"))),
        other => Err(invalid(format!("field `{key}`: expected a date, got {other}"))),
    }
}

fn read_point(key: &str, value: &Value) -> Result<Option<GeoPoint>, TriplogError> {
    if value.is_null() {
        return Ok(None);
    }
    let lat = value.get("latitude").and_then(Value::as_f64);
    let lon = value.get("longitude").and_then(Value::as_f64);
    match (lat, lon) {
        (Some(latitude), Some(longitude)) => Ok(Some(GeoPoint::new(latitude, longitude))),
        _ => Err(invalid(format!("field `{key}`: expected a point, got {value}"))),
    }
}

fn read_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Serialize a session record into its document shape.
pub fn record_to_document(record: &SessionRecord) -> Document {
    let mut doc = Document::new();
    doc.insert("uid".into(), Value::String(record.uid.to_string()));
    doc.insert("origin".into(), Value::String(record.origin.clone()));
    doc.insert("status".into(), Value::String(record.status.to_string()));
    doc.insert(
        "start_date".into(),
        record.start_date.as_ref().map_or(Value::Null, date_value),
    );
    doc.insert(
        "start_point".into(),
        record.start_point.as_ref().map_or(Value::Null, point_value),
    );
    doc.insert(
        "end_date".into(),
        record.end_date.as_ref().map_or(Value::Null, date_value),
    );
    doc.insert(
        "end_point".into(),
        record.end_point.as_ref().map_or(Value::Null, point_value),
    );
    doc.insert(
        "first_address".into(),
        record.first_address.clone().map_or(Value::Null, Value::String),
    );
    doc.insert(
        "last_address".into(),
        record.last_address.clone().map_or(Value::Null, Value::String),
    );
    doc.insert("distance".into(), json!(record.distance));
    doc.insert("duration".into(), json!(record.duration));
    doc.insert("last_comm".into(), date_value(&record.last_comm));
    doc
}

/// Build a session record from a stored document, field by field.
///
/// `origin` is required. A missing `uid` is derived from the origin, missing
/// metrics fall back to their unset sentinel and unknown keys are dropped.
pub fn record_from_document(doc: &Document) -> Result<SessionRecord, TriplogError> {
    let origin = doc
        .get("origin")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("session document has no `origin`".to_string()))?;
    let mut record = SessionRecord::new(SessionUid::from_origin(origin), origin, Utc::now());
    let mut last_comm = None;

    for (key, value) in doc {
        match key.as_str() {
            "origin" => {}
            "uid" => {
                if let Some(uid) = value.as_str() {
                    record.uid = SessionUid(uid.to_string());
                }
            }
            "status" => {
                let text = value.as_str().unwrap_or_default();
                record.status = text
                    .parse::<SessionStatus>()
                    .map_err(|_| invalid(format!("unknown session status `{text}`")))?;
            }
            "start_date" => record.start_date = read_date(key, value)?,
            "start_point" => record.start_point = read_point(key, value)?,
            "end_date" => record.end_date = read_date(key, value)?,
            "end_point" => record.end_point = read_point(key, value)?,
            "first_address" => record.first_address = read_text(value),
            "last_address" => record.last_address = read_text(value),
            "distance" => record.distance = value.as_f64().unwrap_or(UNSET_METRIC),
            "duration" => record.duration = value.as_f64().unwrap_or(UNSET_METRIC),
            "last_comm" => last_comm = read_date(key, value)?,
            unknown => debug!(key = unknown, "dropping unknown session document key"),
        }
    }

    record.last_comm = last_comm.unwrap_or_else(Utc::now);
    Ok(record)
}

/// The `$set` document for a partial update.
fn update_to_document(update: &SessionUpdate) -> Document {
    let mut set = Document::new();
    if let Some(status) = update.status {
        set.insert("status".into(), Value::String(status.to_string()));
    }
    if let Some(date) = &update.start_date {
        set.insert("start_date".into(), date_value(date));
    }
    if let Some(point) = &update.start_point {
        set.insert("start_point".into(), point_value(point));
    }
    if let Some(date) = &update.end_date {
        set.insert("end_date".into(), date_value(date));
    }
    if let Some(point) = &update.end_point {
        set.insert("end_point".into(), point_value(point));
    }
    if let Some(address) = &update.first_address {
        set.insert("first_address".into(), Value::String(address.clone()));
    }
    if let Some(address) = &update.last_address {
        set.insert("last_address".into(), Value::String(address.clone()));
    }
    if let Some(distance) = update.distance {
        set.insert("distance".into(), json!(distance));
    }
    if let Some(duration) = update.duration {
        set.insert("duration".into(), json!(duration));
    }
    set
}

const SAMPLE_NUMERIC_FIELDS: [TelemetryField; 12] = [
    TelemetryField::Latitude,
    TelemetryField::Longitude,
    TelemetryField::Altitude,
    TelemetryField::GpsSpeed,
    TelemetryField::Direction,
    TelemetryField::Rpm,
    TelemetryField::ObdSpeed,
    TelemetryField::CoolantTemp,
    TelemetryField::OilTemp,
    TelemetryField::AccelX,
    TelemetryField::AccelY,
    TelemetryField::AccelZ,
];

fn sample_value(sample: &Sample, field: TelemetryField) -> f64 {
    match field {
        TelemetryField::Latitude => sample.latitude,
        TelemetryField::Longitude => sample.longitude,
        TelemetryField::Altitude => sample.altitude,
        TelemetryField::GpsSpeed => sample.gps_speed,
        TelemetryField::Direction => sample.direction,
        TelemetryField::Rpm => sample.rpm,
        TelemetryField::ObdSpeed => sample.obd_speed,
        TelemetryField::CoolantTemp => sample.coolant_temp,
        TelemetryField::OilTemp => sample.oil_temp,
        TelemetryField::AccelX => sample.accel_x,
        TelemetryField::AccelY => sample.accel_y,
        TelemetryField::AccelZ => sample.accel_z,
        TelemetryField::DeviceTime | TelemetryField::Fix => field.sentinel(),
    }
}

pub fn sample_to_document(sample: &Sample) -> Document {
    let mut doc = Document::new();
    doc.insert("timestamp".into(), json!(sample.timestamp));
    doc.insert("fix".into(), Value::Bool(sample.fix));
    doc.insert("distance".into(), json!(sample.distance));
    for field in SAMPLE_NUMERIC_FIELDS {
        let name: &'static str = field.into();
        doc.insert(name.into(), json!(sample_value(sample, field)));
    }
    doc
}

/// Build a sample from a stored document; absent or non-numeric fields get their sentinel.
pub fn sample_from_document(doc: &Document) -> Sample {
    let mut sample = Sample::default();
    for (key, value) in doc {
        match key.as_str() {
            "timestamp" => sample.timestamp = value.as_f64().unwrap_or(sample.timestamp),
            "distance" => sample.distance = value.as_f64().unwrap_or(0.0),
            "fix" => sample.fix = value.as_bool().unwrap_or(false),
            other => match other.parse::<TelemetryField>() {
                Ok(field) if SAMPLE_NUMERIC_FIELDS.contains(&field) => {
                    sample.set(field, value.as_f64().unwrap_or(field.sentinel()));
                }
                _ => debug!(key = other, "dropping unknown sample document key"),
            },
        }
    }
    if !doc.contains_key("fix") {
        sample.fix = sample.position().is_fix();
    }
    sample
}

#[async_trait]
impl PluginAdapter for DocumentSessionStore {
    fn name(&self) -> &str {
        "document"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TriplogError> {
        match &self.snapshot_path {
            Some(path) if path.parent().is_some_and(|p| !p.as_os_str().is_empty() && !p.exists()) => {
                Ok(HealthStatus::Degraded(format!(
                    "snapshot directory for {} does not exist",
                    path.display()
                )))
            }
            _ => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), TriplogError> {
        self.write_snapshot().await
    }
}

#[async_trait]
impl SessionStore for DocumentSessionStore {
    async fn initialize(&self) -> Result<(), TriplogError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if !tokio::fs::try_exists(path).await.map_err(storage_err)? {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(());
        }

        let text = tokio::fs::read_to_string(path).await.map_err(storage_err)?;
        let raw: Collections = serde_json::from_str(&text).map_err(storage_err)?;

        let mut loaded = Collections::default();
        for doc in raw.sessions.values() {
            let record = record_from_document(doc)?;
            loaded
                .sessions
                .insert(record.uid.to_string(), record_to_document(&record));
        }
        for (uid, docs) in raw.samples {
            if !loaded.sessions.contains_key(&uid) {
                debug!(uid, "dropping samples of unknown session");
                continue;
            }
            let docs = docs
                .iter()
                .map(|doc| sample_to_document(&sample_from_document(doc)))
                .collect();
            loaded.samples.insert(uid, docs);
        }

        info!(
            path = %path.display(),
            sessions = loaded.sessions.len(),
            "document snapshot loaded"
        );
        *self.data.lock().await = loaded;
        Ok(())
    }

    async fn close(&self) -> Result<(), TriplogError> {
        self.write_snapshot().await
    }

    async fn create_session(&self, uid: &SessionUid, origin: &str) -> Result<bool, TriplogError> {
        let mut data = self.data.lock().await;
        if data.sessions.contains_key(uid.as_str()) {
            return Ok(false);
        }
        let record = SessionRecord::new(uid.clone(), origin, Utc::now());
        data.sessions
            .insert(uid.to_string(), record_to_document(&record));
        Ok(true)
    }

    async fn get_session(&self, uid: &SessionUid) -> Result<Option<SessionRecord>, TriplogError> {
        let data = self.data.lock().await;
        data.sessions
            .get(uid.as_str())
            .map(record_from_document)
            .transpose()
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, TriplogError> {
        let data = self.data.lock().await;
        let mut records = data
            .sessions
            .values()
            .map(record_from_document)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| b.last_comm.cmp(&a.last_comm).then(a.uid.cmp(&b.uid)));
        Ok(records)
    }

    async fn update_session(
        &self,
        uid: &SessionUid,
        update: &SessionUpdate,
    ) -> Result<(), TriplogError> {
        let mut data = self.data.lock().await;
        let doc = data
            .sessions
            .get_mut(uid.as_str())
            .ok_or_else(|| TriplogError::SessionNotFound {
                uid: uid.to_string(),
            })?;
        doc.extend(update_to_document(update));
        doc.insert("last_comm".into(), date_value(&Utc::now()));
        Ok(())
    }

    async fn delete_session(&self, uid: &SessionUid) -> Result<u64, TriplogError> {
        let mut data = self.data.lock().await;
        data.samples.remove(uid.as_str());
        Ok(u64::from(data.sessions.remove(uid.as_str()).is_some()))
    }

    async fn append_sample(&self, uid: &SessionUid, sample: &Sample) -> Result<(), TriplogError> {
        let mut data = self.data.lock().await;
        let doc = data
            .sessions
            .get_mut(uid.as_str())
            .ok_or_else(|| TriplogError::SessionNotFound {
                uid: uid.to_string(),
            })?;
        doc.insert("last_comm".into(), date_value(&Utc::now()));
        data.samples
            .entry(uid.to_string())
            .or_default()
            .push(sample_to_document(sample));
        Ok(())
    }

    async fn get_samples(
        &self,
        uid: &SessionUid,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Sample>, TriplogError> {
        let data = self.data.lock().await;
        let mut samples: Vec<Sample> = data
            .samples
            .get(uid.as_str())
            .map(|docs| docs.iter().map(sample_from_document).collect())
            .unwrap_or_default();
        // Stable sort keeps append order for equal timestamps.
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(samples
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_is_idempotent_and_merges_updates() {
        let store = DocumentSessionStore::new();
        store.initialize().await.unwrap();
        let uid = SessionUid::from_origin("car-1");

        assert!(store.create_session(&uid, "car-1").await.unwrap());
        assert!(!store.create_session(&uid, "car-1").await.unwrap());

        store
            .update_session(
                &uid,
                &SessionUpdate {
                    status: Some(SessionStatus::Ongoing),
                    first_address: Some("Paris".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .update_session(
                &uid,
                &SessionUpdate {
                    distance: Some(2.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let record = store.get_session(&uid).await.unwrap().unwrap();
        assert_eq!(record.status, SessionStatus::Ongoing);
        assert_eq!(record.first_address.as_deref(), Some("Paris"));
        assert_eq!(record.distance, 2.0);
        assert_eq!(record.duration, UNSET_METRIC);
        assert_eq!(store.list_sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = DocumentSessionStore::new();
        let uid = SessionUid::from_origin("ghost");
        assert!(matches!(
            store.append_sample(&uid, &Sample::default()).await,
            Err(TriplogError::SessionNotFound { .. })
        ));
        assert!(matches!(
            store.update_session(&uid, &SessionUpdate::default()).await,
            Err(TriplogError::SessionNotFound { .. })
        ));
        assert_eq!(store.delete_session(&uid).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn samples_are_sorted_and_paged() {
        let store = DocumentSessionStore::new();
        let uid = SessionUid::from_origin("car-1");
        store.create_session(&uid, "car-1").await.unwrap();
        for ts in [20.0, 0.0, 10.0, 30.0] {
            store
                .append_sample(&uid, &Sample::at(ts, 48.0, 2.0))
                .await
                .unwrap();
        }
        let page = store.get_samples(&uid, Some(1), Some(2)).await.unwrap();
        let stamps: Vec<f64> = page.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![10.0, 20.0]);

        assert_eq!(store.delete_session(&uid).await.unwrap(), 1);
        assert!(store.get_samples(&uid, None, None).await.unwrap().is_empty());
    }

    #[test]
    fn legacy_document_keys_are_dropped() {
        let doc = json!({
            "_id": "5731d4c1",
            "origin": "car-legacy",
            "status": "TERMINATED",
            "car_datas": ["a", "b"],
            "distance": 12.5,
            "first_address": "Lyon",
            "start_point": { "latitude": 45.76, "longitude": 4.83 }
        });
        let Value::Object(doc) = doc else {
            unreachable!()
        };
        let record = record_from_document(&doc).unwrap();
        assert_eq!(record.uid, SessionUid::from_origin("car-legacy"));
        assert_eq!(record.status, SessionStatus::Terminated);
        assert_eq!(record.distance, 12.5);
        assert_eq!(record.duration, UNSET_METRIC);
        assert_eq!(record.start_point, Some(GeoPoint::new(45.76, 4.83)));
        assert_eq!(record.first_address.as_deref(), Some("Lyon"));

        let round = record_to_document(&record);
        assert!(!round.contains_key("_id"));
        assert!(!round.contains_key("car_datas"));
    }

    #[test]
    fn document_without_origin_is_rejected() {
        let Value::Object(doc) = json!({ "status": "ONGOING" }) else {
            unreachable!()
        };
        assert!(record_from_document(&doc).is_err());
    }

    #[test]
    fn sample_document_fills_sentinels() {
        let Value::Object(doc) = json!({
            "timestamp": 5.0,
            "latitude": 48.85,
            "longitude": 2.35,
            "rpm": "n/a",
            "turbo": 1.2
        }) else {
            unreachable!()
        };
        let sample = sample_from_document(&doc);
        assert_eq!(sample.timestamp, 5.0);
        assert!(sample.fix);
        assert_eq!(sample.rpm, -1.0);
        assert_eq!(sample.accel_x, 0.0);
        assert_eq!(sample_from_document(&sample_to_document(&sample)), sample);
    }

    #[tokio::test]
    async fn snapshot_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let uid = SessionUid::from_origin("car-9");

        let store = DocumentSessionStore::with_snapshot(&path);
        store.initialize().await.unwrap();
        store.create_session(&uid, "car-9").await.unwrap();
        store
            .append_sample(&uid, &Sample::at(0.0, 48.85, 2.35))
            .await
            .unwrap();
        store.close().await.unwrap();
        assert!(path.exists());

        let reopened = DocumentSessionStore::with_snapshot(&path);
        reopened.initialize().await.unwrap();
        let record = reopened.get_session(&uid).await.unwrap().unwrap();
        assert_eq!(record.origin, "car-9");
        assert_eq!(reopened.get_samples(&uid, None, None).await.unwrap().len(), 1);
    }
}
