// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The trip session state machine.
//!
//! A session moves `NOT_STARTED -> ONGOING -> TERMINATED`. Stopping a session
//! whose fixes stay within the dilution threshold deletes it instead.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};
use triplog_core::{
    GeoPoint, Sample, SessionRecord, SessionStatus, SessionStore, SessionUid, SessionUpdate,
    TriplogError, UNSET_METRIC,
};

use crate::backoff::RetryBackoff;
use crate::dilution::DilutionFilter;
use crate::distance::DistanceAccumulator;
use crate::resolver::AddressResolver;

/// Result of [`TripSession::stop`].
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The session was kept with its final metrics.
    Terminated(SessionRecord),
    /// The fixes spread less than the threshold; session and samples were deleted.
    Discarded { uid: SessionUid, diagonal_km: f64 },
}

/// One trip, driven by a single ingestion stream.
pub struct TripSession {
    record: SessionRecord,
    store: Arc<dyn SessionStore>,
    resolver: AddressResolver,
    accumulator: DistanceAccumulator,
    first_address_backoff: RetryBackoff,
    dilution_threshold_km: f64,
}

impl TripSession {
    /// Rebuilds a session from its stored record.
    ///
    /// An `ONGOING` session picks its running distance back up from the
    /// samples already stored.
    pub async fn from_record(
        record: SessionRecord,
        store: Arc<dyn SessionStore>,
        resolver: AddressResolver,
        dilution_threshold_km: f64,
    ) -> Result<Self, TriplogError> {
        let accumulator = if record.status == SessionStatus::Ongoing {
            let samples = store.get_samples(&record.uid, None, None).await?;
            let previous = samples
                .iter()
                .rev()
                .map(Sample::position)
                .find(GeoPoint::is_fix);
            let total = samples.last().map_or(UNSET_METRIC, |s| s.distance);
            debug!(uid = %record.uid, samples = samples.len(), total, "resuming ongoing session");
            DistanceAccumulator::resume(total, previous)
        } else {
            DistanceAccumulator::new()
        };

        Ok(Self {
            record,
            store,
            resolver,
            accumulator,
            first_address_backoff: RetryBackoff::default(),
            dilution_threshold_km,
        })
    }

    pub fn uid(&self) -> &SessionUid {
        &self.record.uid
    }

    pub fn status(&self) -> SessionStatus {
        self.record.status
    }

    /// The session as last written by this handle.
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    /// Running distance in km, [`UNSET_METRIC`] until the vehicle moves.
    pub fn distance(&self) -> f64 {
        if self.accumulator.has_moved() {
            self.accumulator.total_km()
        } else {
            UNSET_METRIC
        }
    }

    fn expect_status(
        &self,
        expected: SessionStatus,
        operation: &'static str,
    ) -> Result<(), TriplogError> {
        if self.record.status == expected {
            Ok(())
        } else {
            Err(TriplogError::InvalidStateTransition {
                operation,
                from: self.record.status,
            })
        }
    }

    async fn write(&mut self, update: SessionUpdate) -> Result<(), TriplogError> {
        self.store.update_session(&self.record.uid, &update).await?;
        update.apply_to(&mut self.record);
        self.record.last_comm = Utc::now();
        Ok(())
    }

    /// Starts the session at `start_date`.
    pub async fn start(&mut self, start_date: DateTime<Utc>) -> Result<(), TriplogError> {
        self.expect_status(SessionStatus::NotStarted, "start")?;
        info!(uid = %self.record.uid, %start_date, "starting session");
        self.write(SessionUpdate {
            status: Some(SessionStatus::Ongoing),
            start_date: Some(start_date),
            distance: Some(UNSET_METRIC),
            duration: Some(UNSET_METRIC),
            ..SessionUpdate::default()
        })
        .await
    }

    /// Starts the session now.
    pub async fn start_now(&mut self) -> Result<(), TriplogError> {
        self.start(Utc::now()).await
    }

    /// Stamps `sample` with the running distance and appends it.
    ///
    /// The first fix of the session resolves its first address. After a
    /// failed resolution, fixes skip the lookup until the retry cool-down
    /// has elapsed. The stored session distance follows the running total.
    pub async fn record_sample(&mut self, mut sample: Sample) -> Result<Sample, TriplogError> {
        self.expect_status(SessionStatus::Ongoing, "record samples for")?;

        let position = sample.position();
        sample.distance = self.accumulator.advance(position);

        if self.record.first_address.is_none()
            && position.is_fix()
            && self.first_address_backoff.is_ready()
        {
            self.resolve_first_address(position).await?;
        }

        self.store.append_sample(&self.record.uid, &sample).await?;

        let distance = self.distance();
        if distance != self.record.distance {
            self.write(SessionUpdate {
                distance: Some(distance),
                ..SessionUpdate::default()
            })
            .await?;
        } else {
            self.record.last_comm = Utc::now();
        }
        Ok(sample)
    }

    async fn resolve_first_address(&mut self, position: GeoPoint) -> Result<(), TriplogError> {
        match self.resolver.resolve(position).await {
            Ok(resolution) => {
                self.first_address_backoff.record_success();
                self.write(SessionUpdate {
                    first_address: Some(resolution.into_text()),
                    ..SessionUpdate::default()
                })
                .await
            }
            Err(e) => {
                let retry_in = self.first_address_backoff.record_failure();
                warn!(
                    uid = %self.record.uid,
                    error = %e,
                    failures = self.first_address_backoff.failures(),
                    retry_in_secs = retry_in.as_secs(),
                    "first address unresolved"
                );
                Ok(())
            }
        }
    }

    /// Terminates the session, or deletes it when the trip is too diluted.
    pub async fn stop(mut self) -> Result<StopOutcome, TriplogError> {
        self.expect_status(SessionStatus::Ongoing, "stop")?;
        info!(uid = %self.record.uid, "stopping session");

        let samples = self.store.get_samples(&self.record.uid, None, None).await?;

        let mut filter = DilutionFilter::new();
        let mut latest_fix = None;
        for sample in samples.iter().rev() {
            let position = sample.position();
            filter.observe(position);
            if latest_fix.is_none() && position.is_fix() {
                latest_fix = Some(position);
            }
        }

        let diagonal_km = filter.diagonal_km();
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return self.discard(diagonal_km).await;
        };
        if filter.rejects(self.dilution_threshold_km) {
            return self.discard(diagonal_km).await;
        }

        let duration = last.timestamp;
        let distance = if self.accumulator.has_moved() {
            last.distance
        } else {
            UNSET_METRIC
        };
        let end_date = self
            .record
            .start_date
            .zip(TimeDelta::try_milliseconds((duration.max(0.0) * 1000.0) as i64))
            .and_then(|(start, elapsed)| start.checked_add_signed(elapsed));

        let mut last_address = None;
        if self.record.last_address.is_none() {
            if let Some(point) = latest_fix {
                match self.resolver.resolve(point).await {
                    Ok(resolution) => last_address = Some(resolution.into_text()),
                    Err(e) => warn!(uid = %self.record.uid, error = %e, "last address unresolved"),
                }
            }
        }

        self.write(SessionUpdate {
            status: Some(SessionStatus::Terminated),
            start_point: Some(first.position()),
            end_point: Some(last.position()),
            end_date,
            last_address,
            duration: Some(duration),
            distance: Some(distance),
            ..SessionUpdate::default()
        })
        .await?;

        log_summary(&self.record);
        Ok(StopOutcome::Terminated(self.record))
    }

    async fn discard(self, diagonal_km: f64) -> Result<StopOutcome, TriplogError> {
        warn!(
            uid = %self.record.uid,
            diagonal_km = (diagonal_km * 1000.0).round() / 1000.0,
            "deleting session with too small geographical dilution"
        );
        self.store.delete_session(&self.record.uid).await?;
        Ok(StopOutcome::Discarded {
            uid: self.record.uid,
            diagonal_km,
        })
    }
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn log_summary(record: &SessionRecord) {
    info!(
        uid = %record.uid,
        origin = %record.origin,
        status = %record.status,
        start_date = %display_opt(&record.start_date),
        start_point = %display_opt(&record.start_point),
        first_address = %display_opt(&record.first_address),
        end_date = %display_opt(&record.end_date),
        end_point = %display_opt(&record.end_point),
        last_address = %display_opt(&record.last_address),
        duration_secs = record.duration,
        distance_km = record.distance,
        "session terminated"
    );
}

impl std::fmt::Debug for TripSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripSession")
            .field("record", &self.record)
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}
