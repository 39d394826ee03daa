// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample append and paging queries.

use chrono::Utc;
use rusqlite::{Row, params};
use triplog_core::{Sample, SessionUid, TriplogError};

use crate::database::{Database, format_date, map_tr_err};

fn row_to_sample(row: &Row<'_>) -> Result<Sample, rusqlite::Error> {
    Ok(Sample {
        timestamp: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        fix: row.get(3)?,
        altitude: row.get(4)?,
        gps_speed: row.get(5)?,
        direction: row.get(6)?,
        rpm: row.get(7)?,
        obd_speed: row.get(8)?,
        coolant_temp: row.get(9)?,
        oil_temp: row.get(10)?,
        accel_x: row.get(11)?,
        accel_y: row.get(12)?,
        accel_z: row.get(13)?,
        distance: row.get(14)?,
    })
}

/// Append a sample to a session and refresh the session's `last_comm`.
///
/// Returns `false` (and stores nothing) when the session does not exist.
pub async fn append_sample(
    db: &Database,
    uid: &SessionUid,
    sample: &Sample,
) -> Result<bool, TriplogError> {
    let id = uid.to_string();
    let s = sample.clone();
    let now = format_date(&Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let touched = tx.execute(
                "UPDATE sessions SET last_comm = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            if touched == 0 {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO samples (session_id, timestamp, latitude, longitude, fix, altitude, \
                 gps_speed, direction, rpm, obd_speed, coolant_temp, oil_temp, accel_x, accel_y, \
                 accel_z, distance)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    id,
                    s.timestamp,
                    s.latitude,
                    s.longitude,
                    s.fix,
                    s.altitude,
                    s.gps_speed,
                    s.direction,
                    s.rpm,
                    s.obd_speed,
                    s.coolant_temp,
                    s.oil_temp,
                    s.accel_x,
                    s.accel_y,
                    s.accel_z,
                    s.distance,
                ],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Samples of a session ordered by timestamp (then insertion order).
pub async fn get_samples(
    db: &Database,
    uid: &SessionUid,
    offset: Option<usize>,
    limit: Option<usize>,
) -> Result<Vec<Sample>, TriplogError> {
    let id = uid.to_string();
    // SQLite only accepts OFFSET after LIMIT; -1 means no limit.
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let offset = offset.unwrap_or(0) as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, latitude, longitude, fix, altitude, gps_speed, direction, rpm, \
                 obd_speed, coolant_temp, oil_temp, accel_x, accel_y, accel_z, distance
                 FROM samples WHERE session_id = ?1
                 ORDER BY timestamp ASC, id ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt.query_map(params![id, limit, offset], row_to_sample)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::{create_session, delete_session, get_session};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("samples.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn append_and_page_samples() {
        let (db, _dir) = setup_db().await;
        let uid = SessionUid::from_origin("car-1");
        create_session(&db, &uid, "car-1").await.unwrap();

        for i in 0..5 {
            let mut sample = Sample::at(i as f64 * 10.0, 48.85 + i as f64 * 0.001, 2.35);
            sample.rpm = 1500.0 + i as f64;
            assert!(append_sample(&db, &uid, &sample).await.unwrap());
        }

        let all = get_samples(&db, &uid, None, None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].timestamp, 0.0);
        assert_eq!(all[4].rpm, 1504.0);
        assert!(all.iter().all(|s| s.fix));

        let page = get_samples(&db, &uid, Some(1), Some(2)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].timestamp, 10.0);
        assert_eq!(page[1].timestamp, 20.0);

        let tail = get_samples(&db, &uid, Some(3), None).await.unwrap();
        assert_eq!(tail.len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn samples_are_sorted_by_timestamp() {
        let (db, _dir) = setup_db().await;
        let uid = SessionUid::from_origin("car-1");
        create_session(&db, &uid, "car-1").await.unwrap();

        for ts in [20.0, 0.0, 10.0] {
            append_sample(&db, &uid, &Sample::at(ts, 1.0, 1.0))
                .await
                .unwrap();
        }
        let stamps: Vec<f64> = get_samples(&db, &uid, None, None)
            .await
            .unwrap()
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![0.0, 10.0, 20.0]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_to_unknown_session_stores_nothing() {
        let (db, _dir) = setup_db().await;
        let uid = SessionUid::from_origin("ghost");
        assert!(!append_sample(&db, &uid, &Sample::default()).await.unwrap());
        assert!(get_samples(&db, &uid, None, None).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_refreshes_last_comm_and_delete_removes_samples() {
        let (db, _dir) = setup_db().await;
        let uid = SessionUid::from_origin("car-1");
        create_session(&db, &uid, "car-1").await.unwrap();
        let created = get_session(&db, &uid).await.unwrap().unwrap().last_comm;

        append_sample(&db, &uid, &Sample::at(0.0, 1.0, 1.0))
            .await
            .unwrap();
        let touched = get_session(&db, &uid).await.unwrap().unwrap().last_comm;
        assert!(touched >= created);

        delete_session(&db, &uid).await.unwrap();
        assert!(get_samples(&db, &uid, None, None).await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
