//! Pure geographic helpers.
//!
//! Distances use a spherical Earth. The planar helpers ([`cos_lat`],
//! [`radius_squared_degrees`]) are approximations meant for a cheap
//! pre-filter at regional radii, never for final distances.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude used by the planar approximations.
pub const KM_PER_DEGREE: f64 = 111.32;

/// Floor for [`cos_lat`] so longitude scaling never divides by zero.
const MIN_COS_LAT: f64 = 1e-9;

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new point.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in kilometers.
    #[must_use]
    pub fn distance_km(self, other: Self) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// A geographic bounding box in WGS84 coordinates.
///
/// Boxes never wrap: `west <= east` always holds for boxes produced by
/// [`make_bounds`]. A region crossing the antimeridian is expressed as two
/// boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// A degenerate box covering exactly one point.
    #[must_use]
    pub const fn from_point(lat: f64, lng: f64) -> Self {
        Self::new(lng, lat, lng, lat)
    }

    /// Returns `true` if the point lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }

    /// Returns `true` if the two boxes share any point.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::new(
            f64::midpoint(self.south, self.north),
            f64::midpoint(self.west, self.east),
        )
    }
}

/// Great-circle distance between two points in kilometers.
///
/// The haversine term is clamped to `[0, 1]` so floating-point overshoot at
/// coincident or antipodal points cannot produce `NaN`.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).abs().to_radians();
    let d_lng = (lng2 - lng1).abs().to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Cosine of a latitude in degrees, floored to a small positive value near
/// the poles.
#[must_use]
pub fn cos_lat(lat: f64) -> f64 {
    lat.to_radians().cos().max(MIN_COS_LAT)
}

/// Converts a radius in kilometers to a squared-degree threshold for the
/// planar pre-filter.
#[must_use]
pub fn radius_squared_degrees(radius_km: f64) -> f64 {
    let degrees = radius_km / KM_PER_DEGREE;
    degrees * degrees
}

/// Signed longitude difference `to - from`, wrapped into `[-180, 180]` so
/// points on either side of the antimeridian compare as neighbors.
#[must_use]
pub fn longitude_delta(from: f64, to: f64) -> f64 {
    let delta = to - from;
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Squared planar distance in degrees, with longitude scaled by `cos_lat0`.
#[must_use]
pub fn planar_distance_squared(origin: LatLng, point: LatLng, cos_lat0: f64) -> f64 {
    let dx = longitude_delta(origin.lng, point.lng) * cos_lat0;
    let dy = point.lat - origin.lat;
    dx.mul_add(dx, dy * dy)
}

/// Computes the rectangle(s) covering a circle of `radius_km` around a
/// point.
///
/// The extents are the exact spherical ones: the latitude half-height is
/// the angular radius, and the longitude half-width is
/// `asin(sin(angular radius) / cos_lat)`, which grows with meridian
/// convergence. Every point within `radius_km` (by [`haversine_km`]) lies in
/// the result. When the rectangle would cross the antimeridian it is split
/// into exactly two boxes; the query area is the union of the result. When
/// the circle reaches a pole, or the half-width spans the whole globe, a
/// single box covering every longitude is returned.
#[must_use]
pub fn make_bounds(lat: f64, lng: f64, radius_km: f64) -> Vec<BoundingBox> {
    let angular = radius_km / EARTH_RADIUS_KM;
    let d_lat = angular.to_degrees();
    let south = lat - d_lat;
    let north = lat + d_lat;

    if south <= -90.0 || north >= 90.0 {
        return vec![BoundingBox::new(
            -180.0,
            south.max(-90.0),
            180.0,
            north.min(90.0),
        )];
    }

    let ratio = angular.sin() / cos_lat(lat);
    if ratio >= 1.0 {
        return vec![BoundingBox::new(-180.0, south, 180.0, north)];
    }
    let d_lng = ratio.asin().to_degrees();

    let west = lng - d_lng;
    let east = lng + d_lng;

    if west < -180.0 {
        vec![
            BoundingBox::new(west + 360.0, south, 180.0, north),
            BoundingBox::new(-180.0, south, east, north),
        ]
    } else if east > 180.0 {
        vec![
            BoundingBox::new(west, south, 180.0, north),
            BoundingBox::new(-180.0, south, east - 360.0, north),
        ]
    } else {
        vec![BoundingBox::new(west, south, east, north)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(boxes: &[BoundingBox], lat: f64, lng: f64) -> bool {
        boxes.iter().any(|b| b.contains(lat, lng))
    }

    #[test]
    fn haversine_is_zero_for_same_point() {
        assert!(haversine_km(37.0, -122.0, 37.0, -122.0).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_is_symmetric() {
        let pairs = [
            ((37.7749, -122.4194), (34.0522, -118.2437)),
            ((-33.8688, 151.2093), (51.5074, -0.1278)),
            ((10.0, 179.9), (10.0, -179.9)),
            ((0.0, 0.0), (0.0, 180.0)),
        ];
        for ((a_lat, a_lng), (b_lat, b_lng)) in pairs {
            let ab = haversine_km(a_lat, a_lng, b_lat, b_lng);
            let ba = haversine_km(b_lat, b_lng, a_lat, a_lng);
            assert!((ab - ba).abs() < f64::EPSILON, "{ab} != {ba}");
        }
    }

    #[test]
    fn haversine_matches_known_distance() {
        // San Francisco to Los Angeles is roughly 559 km.
        let d = haversine_km(37.7749, -122.4194, 34.0522, -118.2437);
        assert!((d - 559.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn haversine_handles_antipodal_points() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!(!d.is_nan());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn cos_lat_is_floored_at_poles() {
        assert!(cos_lat(90.0) >= MIN_COS_LAT);
        assert!(cos_lat(-90.0) >= MIN_COS_LAT);
        assert!((cos_lat(0.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn radius_squared_uses_fixed_km_per_degree() {
        let r = radius_squared_degrees(KM_PER_DEGREE * 2.0);
        assert!((r - 4.0).abs() < 1e-12);
    }

    #[test]
    fn longitude_delta_wraps_across_antimeridian() {
        assert!((longitude_delta(179.9, -179.9) - 0.2).abs() < 1e-9);
        assert!((longitude_delta(-179.9, 179.9) + 0.2).abs() < 1e-9);
        assert!((longitude_delta(10.0, 20.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn splits_box_east_of_antimeridian() {
        let boxes = make_bounds(10.0, 179.5, 200.0);
        assert_eq!(boxes.len(), 2);
        assert!((boxes[0].east - 180.0).abs() < f64::EPSILON);
        assert!((boxes[1].west + 180.0).abs() < f64::EPSILON);
        assert!(boxes[1].east > -180.0);
    }

    #[test]
    fn splits_box_west_of_antimeridian() {
        let boxes = make_bounds(-20.0, -179.8, 50.0);
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().any(|b| (b.east - 180.0).abs() < f64::EPSILON));
        assert!(boxes.iter().any(|b| (b.west + 180.0).abs() < f64::EPSILON));
    }

    #[test]
    fn single_box_away_from_antimeridian() {
        let boxes = make_bounds(37.0, -122.0, 50.0);
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].contains(37.0, -122.0));
    }

    #[test]
    fn split_boxes_cover_points_across_the_line() {
        let (lat, lng, radius) = (10.0, 179.5, 200.0);
        let boxes = make_bounds(lat, lng, radius);
        // A point 100 km east, on the far side of the antimeridian.
        let east_lng = -179.5 + 0.2;
        assert!(haversine_km(lat, lng, lat, east_lng) < radius);
        assert!(covered(&boxes, lat, east_lng));
        // And one to the west, on the near side.
        assert!(covered(&boxes, lat, 178.5));
    }

    #[test]
    fn circle_reaching_pole_spans_all_longitudes() {
        let boxes = make_bounds(89.5, 45.0, 100.0);
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].west + 180.0).abs() < f64::EPSILON);
        assert!((boxes[0].east - 180.0).abs() < f64::EPSILON);
        assert!((boxes[0].north - 90.0).abs() < f64::EPSILON);
        assert!(covered(&boxes, 89.9, -135.0));
    }

    #[test]
    fn boxes_cover_every_point_within_radius_at_high_latitude() {
        for lat in [0.0_f64, 45.0, 60.0, 70.0, 80.0] {
            let boxes = make_bounds(lat, 10.0, 500.0);
            for step in 0..360u32 {
                let bearing = f64::from(step).to_radians();
                let angular = 499.9 / EARTH_RADIUS_KM;
                // Destination point on the sphere.
                let lat1 = lat.to_radians();
                let lat2 = (lat1.sin() * angular.cos()
                    + lat1.cos() * angular.sin() * bearing.cos())
                .asin();
                let lng2 = 10.0_f64.to_radians()
                    + (bearing.sin() * angular.sin() * lat1.cos())
                        .atan2(angular.cos() - lat1.sin() * lat2.sin());
                let (p_lat, p_lng) = (lat2.to_degrees(), lng2.to_degrees());
                assert!(haversine_km(lat, 10.0, p_lat, p_lng) <= 500.0);
                assert!(covered(&boxes, p_lat, p_lng), "lat {lat} bearing {step}");
            }
        }
    }

    #[test]
    fn box_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&BoundingBox::new(10.0, 10.0, 20.0, 20.0)));
        assert!(a.intersects(&BoundingBox::from_point(5.0, 5.0)));
        assert!(!a.intersects(&BoundingBox::new(10.1, 0.0, 20.0, 10.0)));
    }
}
