//! # Geographic Utilities
//!
//! Great-circle distance and unit helpers shared by extraction, deduplication
//! and clustering.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points, in meters |
//! | [`haversine_miles`] | Great-circle distance between two points, in miles |
//! | [`within_radius`] | Whether a point lies inside a radius around a center |
//! | [`round_miles`] | Round a distance to the precision used in reports |
//! | [`search_padding_degrees`] | Degree envelope guaranteed to contain a distance radius |
//!
//! ## Example
//!
//! ```rust
//! use poi_proximity::{GeoPoint, geo_utils};
//!
//! let property = GeoPoint::new(41.2811, -73.4985);
//! let school = GeoPoint::new(41.2900, -73.4950);
//!
//! let miles = geo_utils::haversine_miles(&property, &school);
//! assert!(miles > 0.5 && miles < 0.7);
//! assert!(geo_utils::within_radius(&property, &school, 1.0));
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Every distance in this crate goes through the haversine formula on a
//! spherical Earth. Thresholds configured in miles are converted with
//! [`METERS_PER_MILE`] and compared against the same formula, so a merge
//! threshold and a cluster radius always mean the same physical distance.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use geo::{Distance, Haversine, Point};

use crate::GeoPoint;

/// International mile.
pub const METERS_PER_MILE: f64 = 1609.344;

// Polar radius. Smaller than the mean radius used by the haversine metric,
// so envelopes derived from it are never too tight.
const ENVELOPE_EARTH_RADIUS_METERS: f64 = 6_356_752.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use poi_proximity::{GeoPoint, geo_utils};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Great-circle distance in miles.
#[inline]
pub fn haversine_miles(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    meters_to_miles(haversine_distance(p1, p2))
}

#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

#[inline]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Round a distance in miles to three decimals, the precision reported
/// downstream.
#[inline]
pub fn round_miles(miles: f64) -> f64 {
    (miles * 1000.0).round() / 1000.0
}

/// Check whether `point` lies within `radius_miles` of `center`.
///
/// Returns `false` for any point whose distance cannot be computed
/// (non-finite coordinates), never panics.
pub fn within_radius(center: &GeoPoint, point: &GeoPoint, radius_miles: f64) -> bool {
    let miles = haversine_miles(center, point);
    miles.is_finite() && miles <= radius_miles
}

// =============================================================================
// Envelope Functions
// =============================================================================

/// Compute latitude and longitude padding (in degrees) around `latitude` that
/// contains every point within `meters` great-circle distance.
///
/// Returns `(lat_padding, lng_padding)`, or `None` when no bounded longitude
/// padding exists (the radius reaches a pole) or the input is not finite.
/// Callers must fall back to an exhaustive scan in that case.
///
/// # Notes
///
/// Latitude padding is exact on the sphere. Longitude padding uses the
/// smallest `cos(latitude)` reachable within the latitude padding, so the
/// envelope errs on the large side.
///
/// # Example
///
/// ```rust
/// use poi_proximity::geo_utils;
///
/// let (lat_pad, lng_pad) = geo_utils::search_padding_degrees(1000.0, 45.0).unwrap();
/// assert!(lat_pad > 0.008 && lat_pad < 0.01);
/// assert!(lng_pad > lat_pad);
///
/// // A radius reaching the pole cannot be bounded in longitude
/// assert!(geo_utils::search_padding_degrees(50_000.0, 89.9).is_none());
/// ```
pub fn search_padding_degrees(meters: f64, latitude: f64) -> Option<(f64, f64)> {
    if !meters.is_finite() || !latitude.is_finite() || meters < 0.0 {
        return None;
    }

    let angular = meters / ENVELOPE_EARTH_RADIUS_METERS;
    let lat_pad = angular.to_degrees();

    let farthest_lat = latitude.abs() + lat_pad;
    if farthest_lat >= 90.0 {
        return None;
    }

    // sin(dlng / 2) <= sin(d / 2R) / cos(lat) for the worst-case latitude
    let ratio = (angular / 2.0).sin() / farthest_lat.to_radians().cos();
    if ratio >= 1.0 {
        return None;
    }
    let lng_pad = (2.0 * ratio.asin()).to_degrees();

    Some((lat_pad, lng_pad))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GeoPoint::new(41.2811, -73.4985);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_miles_known_value() {
        // London to Paris is approximately 213 miles
        let london = GeoPoint::new(51.5074, -0.1278);
        let paris = GeoPoint::new(48.8566, 2.3522);
        assert!(approx_eq(haversine_miles(&london, &paris), 213.5, 3.0));
    }

    #[test]
    fn test_unit_round_trip() {
        assert!(approx_eq(miles_to_meters(1.0), 1609.344, 1e-9));
        assert!(approx_eq(meters_to_miles(40.0), 0.024855, 1e-6));
    }

    #[test]
    fn test_round_miles() {
        assert_eq!(round_miles(0.12345), 0.123);
        assert_eq!(round_miles(0.1237), 0.124);
        assert_eq!(round_miles(0.0), 0.0);
    }

    #[test]
    fn test_within_radius() {
        let center = GeoPoint::new(0.0, 0.0);
        // 0.01 degrees of latitude is ~0.69 miles
        assert!(within_radius(&center, &GeoPoint::new(0.01, 0.0), 1.0));
        assert!(!within_radius(&center, &GeoPoint::new(0.02, 0.0), 1.0));
        assert!(!within_radius(&center, &GeoPoint::new(f64::NAN, 0.0), 1.0));
    }

    #[test]
    fn test_padding_contains_radius() {
        // Points exactly `meters` away due north and due east must fall inside
        let meters = 500.0;
        for lat in [0.0, 30.0, 60.0, -75.0] {
            let (lat_pad, lng_pad) = search_padding_degrees(meters, lat).unwrap();
            let center = GeoPoint::new(lat, 10.0);

            let north = GeoPoint::new(lat + lat_pad, 10.0);
            assert!(haversine_distance(&center, &north) >= meters);

            let east = GeoPoint::new(lat, 10.0 + lng_pad);
            assert!(haversine_distance(&center, &east) >= meters);
        }
    }

    #[test]
    fn test_padding_rejects_invalid() {
        assert!(search_padding_degrees(f64::NAN, 0.0).is_none());
        assert!(search_padding_degrees(10.0, f64::INFINITY).is_none());
        assert!(search_padding_degrees(-1.0, 0.0).is_none());
        assert_eq!(search_padding_degrees(0.0, 12.0), Some((0.0, 0.0)));
    }
}
