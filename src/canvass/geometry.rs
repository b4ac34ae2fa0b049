//! Planar containment tests for area polygons.
//!
//! Coordinates are treated as plain Cartesian values (`x = lng`, `y = lat`);
//! no geodesic correction is applied.
//!
//! Points lying exactly on a polygon edge may resolve either way. The
//! half-open crossing rule below is what decides them today, and whether
//! boundary points should count as inside is still an open policy question,
//! so nothing downstream may rely on it.

use super::domain::GeoPoint;
use serde::Serialize;

/// Axis-aligned bounding box of a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }
}

/// Even-odd ray cast. Polygons with fewer than three vertices contain nothing.
///
/// The polygon is closed implicitly; a repeated first vertex is harmless.
pub fn point_in_polygon(point: &GeoPoint, polygon: &[GeoPoint]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let (px, py) = (point.lng, point.lat);
    let mut inside = false;

    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        let (ax, ay) = (a.lng, a.lat);
        let (bx, by) = (b.lng, b.lat);

        // (ay > py) != (by > py) is inclusive at one end and exclusive at the
        // other, so a vertex shared by two edges is crossed once.
        if (ay > py) != (by > py) {
            let x_crossing = ax + (py - ay) * (bx - ax) / (by - ay);
            if px < x_crossing {
                inside = !inside;
            }
        }
    }

    inside
}
