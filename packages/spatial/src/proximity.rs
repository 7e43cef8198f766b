//! Proximity and viewport queries over a [`SpatialIndex`].
//!
//! `nearby` is two-phase: the R-tree narrows the search to candidates
//! inside the radius' bounding box(es), a planar squared-distance check
//! drops the corners, and the survivors are measured with the haversine
//! formula. The haversine distance decides membership, so no hit is ever
//! farther than the radius.
//!
//! The planar check scales longitude by the cosine of whichever latitude
//! (query or candidate) is closer to a pole, and compares against the
//! radius widened by [`PLANAR_SLACK`], so it only discards points that are
//! clearly outside. Its error grows near the poles, so it is skipped when
//! the search box reaches past [`PLANAR_MAX_LAT`].

use crate::geo_math::{
    LatLng, cos_lat, haversine_km, make_bounds, planar_distance_squared, radius_squared_degrees,
};
use crate::index::{RowId, SpatialIndex};
use crate::query::{BoundsQuery, NearbyQuery};

/// Relative widening of the radius for the planar pre-filter.
pub const PLANAR_SLACK: f64 = 0.05;

/// Highest latitude a search box may reach for the planar pre-filter to be
/// applied.
pub const PLANAR_MAX_LAT: f64 = 70.0;

/// A hotspot row found by [`nearby`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyHit {
    /// Row identifier.
    pub id: RowId,
    /// Great-circle distance from the query point.
    pub distance_km: f64,
}

/// Finds up to `query.limit()` indexed points within `query.radius_km()`
/// of the query point, nearest first.
#[must_use]
pub fn nearby(index: &SpatialIndex, query: &NearbyQuery) -> Vec<NearbyHit> {
    let origin = LatLng::new(query.latitude(), query.longitude());
    let boxes = make_bounds(origin.lat, origin.lng, query.radius_km());
    let r_sq = radius_squared_degrees(query.radius_km() * (1.0 + PLANAR_SLACK));
    let cos_lat0 = cos_lat(origin.lat);

    let use_planar = boxes
        .iter()
        .all(|b| b.south >= -PLANAR_MAX_LAT && b.north <= PLANAR_MAX_LAT);

    let candidates = index.candidates(&boxes);
    let candidate_count = candidates.len();

    let mut hits: Vec<NearbyHit> = candidates
        .into_iter()
        .filter(|entry| {
            if !use_planar {
                return true;
            }
            let point = LatLng::new(entry.latitude, entry.longitude);
            let cos_scale = cos_lat0.min(cos_lat(point.lat));
            planar_distance_squared(origin, point, cos_scale) <= r_sq
        })
        .map(|entry| NearbyHit {
            id: entry.id,
            distance_km: haversine_km(origin.lat, origin.lng, entry.latitude, entry.longitude),
        })
        .filter(|hit| hit.distance_km <= query.radius_km())
        .collect();

    hits.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.id.cmp(&b.id))
    });
    hits.truncate(query.limit());

    log::trace!(
        "nearby({}, {}, {}km): {candidate_count} candidates, {} results",
        origin.lat,
        origin.lng,
        query.radius_km(),
        hits.len()
    );

    hits
}

/// Row ids of every indexed point inside the viewport. No distance
/// filtering is applied.
#[must_use]
pub fn within_bounds(index: &SpatialIndex, query: &BoundsQuery) -> Vec<RowId> {
    index.query_intersecting(&query.boxes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;

    /// Offsets a point by `km` along a bearing of due east.
    fn east_of(lat: f64, lng: f64, km: f64) -> (f64, f64) {
        (lat, lng + km / (111.195 * lat.to_radians().cos()))
    }

    fn fixture() -> SpatialIndex {
        let (lat, lng) = (37.0, -122.0);
        let near = [
            east_of(lat, lng, 1.0),
            (lat + 2.0 / 111.195, lng),
            east_of(lat, lng, 4.5),
        ];
        let far = [(lat + 60.0 / 111.195, lng), east_of(lat, lng, 80.0)];

        SpatialIndex::bulk_load(near.iter().chain(far.iter()).enumerate().map(
            |(i, &(latitude, longitude))| IndexEntry {
                id: i as RowId + 1,
                latitude,
                longitude,
            },
        ))
    }

    #[test]
    fn returns_only_points_inside_radius_nearest_first() {
        let index = fixture();
        let query = NearbyQuery::new(37.0, -122.0, 10.0, Some(5)).unwrap();
        let hits = nearby(&index, &query);

        let ids: Vec<RowId> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(hits.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert!(hits.iter().all(|h| h.distance_km <= 10.0));
    }

    #[test]
    fn truncates_to_limit() {
        let index = fixture();
        let query = NearbyQuery::new(37.0, -122.0, 10.0, Some(2)).unwrap();
        let ids: Vec<RowId> = nearby(&index, &query).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn finds_neighbors_across_antimeridian() {
        let index = SpatialIndex::bulk_load([
            IndexEntry {
                id: 1,
                latitude: -17.0,
                longitude: 179.95,
            },
            IndexEntry {
                id: 2,
                latitude: -17.0,
                longitude: -179.95,
            },
            IndexEntry {
                id: 3,
                latitude: -17.0,
                longitude: 178.0,
            },
        ]);
        let query = NearbyQuery::new(-17.0, 179.99, 20.0, None).unwrap();
        let hits = nearby(&index, &query);
        let ids: Vec<RowId> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(hits.iter().all(|h| h.distance_km < 20.0));
    }

    #[test]
    fn results_stay_within_radius_tolerance() {
        // A ring of points right around the 50 km boundary.
        let (lat, lng) = (45.0_f64, 10.0_f64);
        let mut entries = Vec::new();
        for step in 0..72u32 {
            let bearing = f64::from(step * 5).to_radians();
            let km = 49.0 + f64::from(step % 3);
            let d_lat = km * bearing.cos() / 111.195;
            let d_lng = km * bearing.sin() / (111.195 * lat.to_radians().cos());
            entries.push(IndexEntry {
                id: RowId::from(step),
                latitude: lat + d_lat,
                longitude: lng + d_lng,
            });
        }
        let index = SpatialIndex::bulk_load(entries);
        let query = NearbyQuery::new(lat, lng, 50.0, Some(1000)).unwrap();
        let hits = nearby(&index, &query);
        assert!(!hits.is_empty());
        for hit in &hits {
            assert!(hit.distance_km <= 50.0, "{hit:?}");
        }
    }

    /// Points 480 to 520 km from `(lat, lng)` every half degree of bearing.
    fn ring(lat: f64, lng: f64) -> Vec<IndexEntry> {
        (0..720u32)
            .map(|step| {
                let bearing = (f64::from(step) * 0.5).to_radians();
                let km = 480.0 + f64::from(step % 41);
                let d_lat = km * bearing.cos() / 111.195;
                let d_lng = km * bearing.sin() / (111.195 * lat.to_radians().cos());
                IndexEntry {
                    id: RowId::from(step),
                    latitude: lat + d_lat,
                    longitude: lng + d_lng,
                }
            })
            .collect()
    }

    #[test]
    fn high_latitude_rings_never_exceed_radius() {
        for lat in [45.0_f64, 60.0, 70.0] {
            let entries = ring(lat, 10.0);
            let mut expected: Vec<RowId> = entries
                .iter()
                .filter(|e| haversine_km(lat, 10.0, e.latitude, e.longitude) <= 500.0)
                .map(|e| e.id)
                .collect();
            expected.sort_unstable();
            assert!(!expected.is_empty());

            let index = SpatialIndex::bulk_load(entries);
            let query = NearbyQuery::new(lat, 10.0, 500.0, Some(1000)).unwrap();
            let hits = nearby(&index, &query);

            for hit in &hits {
                assert!(hit.distance_km <= 500.0, "lat {lat}: {hit:?}");
            }
            let mut ids: Vec<RowId> = hits.iter().map(|h| h.id).collect();
            ids.sort_unstable();
            assert_eq!(ids, expected, "lat {lat}");
        }
    }

    #[test]
    fn limit_keeps_the_nearest_after_exact_filtering() {
        let entries = ring(70.0, 10.0);
        let mut nearest: Vec<f64> = entries
            .iter()
            .map(|e| haversine_km(70.0, 10.0, e.latitude, e.longitude))
            .filter(|&d| d <= 500.0)
            .collect();
        nearest.sort_by(f64::total_cmp);
        nearest.truncate(5);

        let index = SpatialIndex::bulk_load(entries);
        let query = NearbyQuery::new(70.0, 10.0, 500.0, Some(5)).unwrap();
        let distances: Vec<f64> = nearby(&index, &query)
            .iter()
            .map(|h| h.distance_km)
            .collect();
        assert_eq!(distances, nearest);
    }

    #[test]
    fn empty_index_yields_nothing() {
        let query = NearbyQuery::new(0.0, 0.0, 10.0, None).unwrap();
        assert!(nearby(&SpatialIndex::new(), &query).is_empty());
    }

    #[test]
    fn within_bounds_has_no_distance_filter() {
        let index = fixture();
        let query = BoundsQuery::new(-123.0, 36.0, -120.0, 38.0).unwrap();
        assert_eq!(within_bounds(&index, &query), vec![1, 2, 3, 4, 5]);
    }
}
