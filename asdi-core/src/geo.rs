//! Great-circle helpers: haversine distance and bearing/range projection.

use crate::nav::{DistanceCalculator, Fix};

const EARTH_RADIUS_NM: f64 = 3440.065;

/// Great-circle distance in nautical miles.
pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_NM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Point reached from `(lat, lon)` along a true bearing for `range_nm`.
///
/// Longitude is normalized to [-180, 180).
pub fn destination(lat: f64, lon: f64, bearing_deg: f64, range_nm: f64) -> (f64, f64) {
    let delta = range_nm / EARTH_RADIUS_NM;
    let theta = bearing_deg.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lon2 = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (phi2.to_degrees(), lon2)
}

/// Haversine distance between fixes, in nautical miles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircle;

impl DistanceCalculator for GreatCircle {
    fn distance(&self, a: &Fix, b: &Fix) -> f64 {
        haversine_nm(a.lat(), a.lon(), b.lat(), b.lon())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let d = haversine_nm(35.0, -82.0, 35.0, -82.0);
        assert!(d < 0.01, "Same point should be ~0 nm");
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine_nm(40.0, -75.0, 41.0, -75.0);
        assert!((d - 60.04).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_destination_north() {
        let (lat, lon) = destination(40.0, -75.0, 0.0, 60.0);
        assert!((lat - 40.9993).abs() < 0.01, "got {lat}");
        assert!((lon + 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_roundtrip_distance() {
        let (lat, lon) = destination(35.4362, -82.5418, 73.0, 96.0);
        let d = haversine_nm(35.4362, -82.5418, lat, lon);
        assert!((d - 96.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_destination_wraps_antimeridian() {
        let (_, lon) = destination(0.0, 179.5, 90.0, 60.0);
        assert!(lon < -179.0 && lon > -180.0, "got {lon}");
    }

    #[test]
    fn test_great_circle_calculator() {
        let a = Fix::new("A", 40.0, -75.0);
        let b = Fix::new("B", 41.0, -75.0);
        let d = GreatCircle.distance(&a, &b);
        assert!((d - 60.04).abs() < 0.1);
    }
}
