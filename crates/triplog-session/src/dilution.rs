// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geographic dilution of a trip: how far apart its fixes spread.

use triplog_core::GeoPoint;

use crate::distance::haversine_km;

/// Axis-aligned box around a set of fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(point: GeoPoint) -> Self {
        Self {
            min_lat: point.latitude,
            max_lat: point.latitude,
            min_lon: point.longitude,
            max_lon: point.longitude,
        }
    }

    pub fn extend(&mut self, point: GeoPoint) {
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lat = self.max_lat.max(point.latitude);
        self.min_lon = self.min_lon.min(point.longitude);
        self.max_lon = self.max_lon.max(point.longitude);
    }

    /// Great-circle length of the south-west to north-east diagonal.
    pub fn diagonal_km(&self) -> f64 {
        haversine_km(
            GeoPoint::new(self.min_lat, self.min_lon),
            GeoPoint::new(self.max_lat, self.max_lon),
        )
    }
}

/// Incremental bounding box that ignores "no fix" points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DilutionFilter {
    bounds: Option<BoundingBox>,
}

impl DilutionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, point: GeoPoint) {
        if !point.is_fix() {
            return;
        }
        match &mut self.bounds {
            Some(bounds) => bounds.extend(point),
            None => self.bounds = Some(BoundingBox::around(point)),
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Diagonal of the box, `0` without any fix.
    pub fn diagonal_km(&self) -> f64 {
        self.bounds.map(|b| b.diagonal_km()).unwrap_or(0.0)
    }

    /// A trip is too diluted to keep when its diagonal is under `threshold_km`.
    pub fn rejects(&self, threshold_km: f64) -> bool {
        self.diagonal_km() < threshold_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_rejects() {
        let filter = DilutionFilter::new();
        assert_eq!(filter.diagonal_km(), 0.0);
        assert!(filter.rejects(1.0));
        assert!(!filter.rejects(0.0));
    }

    #[test]
    fn no_fix_points_do_not_stretch_the_box() {
        let mut filter = DilutionFilter::new();
        filter.observe(GeoPoint::NO_FIX);
        filter.observe(GeoPoint::new(48.8566, 2.3522));
        filter.observe(GeoPoint::new(0.0, 2.0));
        filter.observe(GeoPoint::new(48.8566, 2.3522));
        assert_eq!(filter.diagonal_km(), 0.0);
        assert!(filter.rejects(1.0));
    }

    #[test]
    fn paris_hop_is_kept() {
        let mut filter = DilutionFilter::new();
        filter.observe(GeoPoint::new(48.8566, 2.3522));
        filter.observe(GeoPoint::new(48.8606, 2.3376));
        let bounds = filter.bounds().unwrap();
        assert_eq!(bounds.min_lon, 2.3376);
        assert_eq!(bounds.max_lat, 48.8606);
        assert!((filter.diagonal_km() - 1.16).abs() < 0.05);
        assert!(!filter.rejects(1.0));
    }
}
