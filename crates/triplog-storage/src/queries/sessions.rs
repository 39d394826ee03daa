// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations.

use std::str::FromStr;

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Row, params, params_from_iter};
use triplog_core::{GeoPoint, SessionRecord, SessionStatus, SessionUid, SessionUpdate, TriplogError};

use crate::database::{Database, format_date, map_tr_err, parse_date};

const SESSION_COLUMNS: &str = "id, origin, status, start_date, start_lat, start_lon, end_date, \
     end_lat, end_lon, first_address, last_address, distance, duration, last_comm";

fn point_from_columns(lat: Option<f64>, lon: Option<f64>) -> Option<GeoPoint> {
    match (lat, lon) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
        _ => None,
    }
}

fn optional_date(
    row: &Row<'_>,
    idx: usize,
) -> Result<Option<chrono::DateTime<Utc>>, rusqlite::Error> {
    row.get::<_, Option<String>>(idx)?
        .map(|text| parse_date(idx, &text))
        .transpose()
}

fn row_to_record(row: &Row<'_>) -> Result<SessionRecord, rusqlite::Error> {
    let status: String = row.get(2)?;
    let status = SessionStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let last_comm: String = row.get(13)?;
    Ok(SessionRecord {
        uid: SessionUid(row.get(0)?),
        origin: row.get(1)?,
        status,
        start_date: optional_date(row, 3)?,
        start_point: point_from_columns(row.get(4)?, row.get(5)?),
        end_date: optional_date(row, 6)?,
        end_point: point_from_columns(row.get(7)?, row.get(8)?),
        first_address: row.get(9)?,
        last_address: row.get(10)?,
        distance: row.get(11)?,
        duration: row.get(12)?,
        last_comm: parse_date(13, &last_comm)?,
    })
}

/// Insert a `NOT_STARTED` session unless one already exists for `uid`.
///
/// Returns `true` when a row was inserted.
pub async fn create_session(
    db: &Database,
    uid: &SessionUid,
    origin: &str,
) -> Result<bool, TriplogError> {
    let id = uid.to_string();
    let origin = origin.to_string();
    let now = format_date(&Utc::now());
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO sessions (id, origin, status, distance, duration, last_comm)
                 VALUES (?1, ?2, ?3, -1.0, -1.0, ?4)",
                params![id, origin, SessionStatus::NotStarted.to_string(), now],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by uid.
pub async fn get_session(
    db: &Database,
    uid: &SessionUid,
) -> Result<Option<SessionRecord>, TriplogError> {
    let id = uid.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_record) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List all sessions, most recently active first.
pub async fn list_sessions(db: &Database) -> Result<Vec<SessionRecord>, TriplogError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY last_comm DESC, id"
            ))?;
            let rows = stmt.query_map([], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

fn real_or_null(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

/// Translate a partial update into `SET` assignments.
fn assignments(update: &SessionUpdate) -> Vec<(&'static str, Value)> {
    let mut set = Vec::new();
    if let Some(status) = update.status {
        set.push(("status", Value::Text(status.to_string())));
    }
    if let Some(date) = &update.start_date {
        set.push(("start_date", Value::Text(format_date(date))));
    }
    if let Some(point) = update.start_point {
        set.push(("start_lat", real_or_null(Some(point.latitude))));
        set.push(("start_lon", real_or_null(Some(point.longitude))));
    }
    if let Some(date) = &update.end_date {
        set.push(("end_date", Value::Text(format_date(date))));
    }
    if let Some(point) = update.end_point {
        set.push(("end_lat", real_or_null(Some(point.latitude))));
        set.push(("end_lon", real_or_null(Some(point.longitude))));
    }
    if let Some(address) = &update.first_address {
        set.push(("first_address", Value::Text(address.clone())));
    }
    if let Some(address) = &update.last_address {
        set.push(("last_address", Value::Text(address.clone())));
    }
    if let Some(distance) = update.distance {
        set.push(("distance", Value::Real(distance)));
    }
    if let Some(duration) = update.duration {
        set.push(("duration", Value::Real(duration)));
    }
    set
}

/// Merge the set fields of `update` into a session and refresh `last_comm`.
///
/// Returns `false` when no session exists for `uid`.
pub async fn update_session(
    db: &Database,
    uid: &SessionUid,
    update: &SessionUpdate,
) -> Result<bool, TriplogError> {
    let mut set = assignments(update);
    set.push(("last_comm", Value::Text(format_date(&Utc::now()))));

    let clause = set
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE sessions SET {clause} WHERE id = ?{}", set.len() + 1);

    let mut values: Vec<Value> = set.into_iter().map(|(_, value)| value).collect();
    values.push(Value::Text(uid.to_string()));

    db.connection()
        .call(move |conn| {
            let changed = conn.execute(&sql, params_from_iter(values))?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a session and all of its samples. Returns the number of sessions removed.
pub async fn delete_session(db: &Database, uid: &SessionUid) -> Result<u64, TriplogError> {
    let id = uid.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM samples WHERE session_id = ?1", params![id])?;
            let removed = tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(removed as u64)
        })
        .await
        .map_err(map_tr_err)
}
