//! Greedy k-center clustering for map markers.
//!
//! Centers are chosen by farthest-point selection: after seeding, each new
//! center is the input point farthest from every center chosen so far.
//! This is a 2-approximation of the optimal k-center covering radius.
//! Ties go to the earliest input point, so identical input always yields
//! identical output.

use serde::{Deserialize, Serialize};

use crate::geo_math::LatLng;

/// Smallest number of clusters produced for a non-empty point set.
pub const MIN_CLUSTERS: usize = 1;

/// Largest number of clusters produced regardless of input size.
pub const MAX_CLUSTERS: usize = 40;

/// A representative center and the number of points assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterCenter {
    /// Center latitude.
    pub lat: f64,
    /// Center longitude.
    pub lng: f64,
    /// Points whose nearest center this is.
    pub count: usize,
}

/// Number of clusters to build for `n` points.
///
/// `ceil(sqrt(n) / 2)` clamped to `[MIN_CLUSTERS, MAX_CLUSTERS]` and never
/// more than `n`. The curve only affects marker density on the map.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn desired_clusters(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let k = ((n as f64).sqrt() / 2.0).ceil() as usize;
    k.clamp(MIN_CLUSTERS, MAX_CLUSTERS).min(n)
}

/// Picks up to `k` centers. Each center is paired with its distance to the
/// nearest previously chosen center at the moment it was selected (the
/// covering radius of the run so far); the seed reports infinity.
///
/// Selection stops early once every point coincides with a center.
fn select_centers(points: &[LatLng], k: usize, anchor: Option<LatLng>) -> Vec<(LatLng, f64)> {
    let Some(&first_point) = points.first() else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }

    let seed = anchor.unwrap_or(first_point);
    let mut centers = vec![(seed, f64::INFINITY)];
    let mut nearest: Vec<f64> = points.iter().map(|p| p.distance_km(seed)).collect();

    while centers.len() < k {
        let mut best: Option<(usize, f64)> = None;
        for (i, &d) in nearest.iter().enumerate() {
            if best.is_none_or(|(_, best_d)| d > best_d) {
                best = Some((i, d));
            }
        }

        let Some((idx, radius)) = best else {
            break;
        };
        if radius <= 0.0 {
            break;
        }

        let center = points[idx];
        centers.push((center, radius));
        for (slot, point) in nearest.iter_mut().zip(points) {
            *slot = slot.min(point.distance_km(center));
        }
    }

    centers
}

/// Index of the center nearest to `point`; ties go to the earlier center.
fn nearest_center(point: LatLng, centers: &[(LatLng, f64)]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, (center, _)) in centers.iter().enumerate() {
        let d = point.distance_km(*center);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// Reduces `points` to at most `k` cluster centers.
///
/// If `anchor` is given (typically the region centroid) it becomes the
/// first center; otherwise the first input point does. Every input point
/// is then counted against its nearest center.
#[must_use]
pub fn build_clusters(points: &[LatLng], k: usize, anchor: Option<LatLng>) -> Vec<ClusterCenter> {
    if points.is_empty() {
        return Vec::new();
    }

    let centers = select_centers(points, k.max(MIN_CLUSTERS), anchor);
    let mut counts = vec![0usize; centers.len()];
    for point in points {
        counts[nearest_center(*point, &centers)] += 1;
    }

    centers
        .iter()
        .zip(counts)
        .map(|((center, _), count)| ClusterCenter {
            lat: center.lat,
            lng: center.lng,
            count,
        })
        .collect()
}
