// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Great-circle distance and the running trip total.

use triplog_core::GeoPoint;

/// Mean earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Running distance over consecutive fixes.
///
/// Pairs where either side is "no fix" add nothing. The fix among them, if
/// any, becomes the previous point for the next pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceAccumulator {
    total_km: f64,
    previous: Option<GeoPoint>,
    moved: bool,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores an accumulator for a session that was already running.
    ///
    /// A negative `total_km` means the vehicle never moved.
    pub fn resume(total_km: f64, previous: Option<GeoPoint>) -> Self {
        Self {
            total_km: total_km.max(0.0),
            previous: previous.filter(GeoPoint::is_fix),
            moved: total_km > 0.0,
        }
    }

    /// Adds the distance from `prev` to `next` and returns the new total.
    pub fn accumulate(&mut self, prev: GeoPoint, next: GeoPoint) -> f64 {
        if prev.is_fix() && next.is_fix() {
            self.total_km += haversine_km(prev, next);
            self.moved = true;
            self.previous = Some(next);
        } else if next.is_fix() {
            self.previous = Some(next);
        } else if prev.is_fix() {
            self.previous = Some(prev);
        }
        self.total_km
    }

    /// Pairs `next` with the remembered previous fix.
    pub fn advance(&mut self, next: GeoPoint) -> f64 {
        match self.previous {
            Some(prev) => self.accumulate(prev, next),
            None => {
                if next.is_fix() {
                    self.previous = Some(next);
                }
                self.total_km
            }
        }
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    pub fn previous(&self) -> Option<GeoPoint> {
        self.previous
    }

    /// Whether at least one pair of fixes was accumulated.
    pub fn has_moved(&self) -> bool {
        self.moved
    }
}
