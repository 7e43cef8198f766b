//! Region-level pack assembly: geometry, clusters, and the derived index
//! and storage records.

use chrono::{DateTime, Utc};
use geo::{BoundingRect, Centroid, MultiPoint, Point};
use hotspot_map_hotspot_models::{Hotspot, RegionCode};
use hotspot_map_observations::SeriesMap;
use hotspot_map_pack_models::{PackBounds, PackData, PackMetadata, PackRecord};
use hotspot_map_spatial::{BoundingBox, ClusterCenter, LatLng, build_clusters, desired_clusters};

use crate::assemble::{AssembleError, PackLookups, assemble};

/// Resolved bounds and center of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionGeometry {
    /// Region bounding box.
    pub bounds: BoundingBox,
    /// Region center, used as the first cluster center.
    pub center: LatLng,
    /// `true` when `center` came from an operator override.
    pub has_custom_center: bool,
}

impl RegionGeometry {
    /// Resolves region geometry.
    ///
    /// The center is the first available of: `custom_center`, the upstream
    /// centroid, the centroid of the hotspots, the midpoint of the bounds.
    /// The bounds are the upstream bounds, else the bounding rectangle of
    /// the hotspots, else a zero-size box at the known center. A region
    /// with none of these gets a zero-size box at `(0, 0)`.
    #[must_use]
    pub fn resolve(
        hotspots: &[Hotspot],
        upstream_bounds: Option<BoundingBox>,
        upstream_centroid: Option<LatLng>,
        custom_center: Option<LatLng>,
    ) -> Self {
        let points: MultiPoint<f64> = hotspots
            .iter()
            .map(|h| Point::new(h.longitude, h.latitude))
            .collect::<Vec<_>>()
            .into();

        let known_center = custom_center
            .or(upstream_centroid)
            .or_else(|| points.centroid().map(|p| LatLng::new(p.y(), p.x())));

        let bounds = upstream_bounds
            .or_else(|| {
                points.bounding_rect().map(|rect| {
                    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
                })
            })
            .unwrap_or_else(|| {
                let fallback = known_center.unwrap_or(LatLng::new(0.0, 0.0));
                BoundingBox::from_point(fallback.lat, fallback.lng)
            });

        Self {
            bounds,
            center: known_center.unwrap_or_else(|| bounds.center()),
            has_custom_center: custom_center.is_some(),
        }
    }

    /// Bounds in pack-record form.
    #[must_use]
    pub const fn pack_bounds(&self) -> PackBounds {
        PackBounds {
            min_x: self.bounds.west,
            min_y: self.bounds.south,
            max_x: self.bounds.east,
            max_y: self.bounds.north,
        }
    }
}

/// Everything needed to assemble one region's pack.
#[derive(Debug, Clone, Copy)]
pub struct RegionPackInput<'a> {
    /// Region code.
    pub region: &'a RegionCode,
    /// Dataset version tag.
    pub version: &'a str,
    /// Hotspots belonging to the region.
    pub hotspots: &'a [Hotspot],
    /// Aggregated observation series.
    pub series: &'a SeriesMap,
    /// Species code and region name lookups.
    pub lookups: PackLookups<'a>,
    /// Upstream region bounds, if known.
    pub upstream_bounds: Option<BoundingBox>,
    /// Upstream region centroid, if known.
    pub upstream_centroid: Option<LatLng>,
    /// Operator-configured center override.
    pub custom_center: Option<LatLng>,
}

/// A region's assembled pack plus the data needed for its index and
/// storage records.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPack {
    /// Pack body.
    pub data: PackData,
    /// Resolved region geometry.
    pub geometry: RegionGeometry,
    /// Cluster markers, anchored at the region center.
    pub clusters: Vec<ClusterCenter>,
}

impl AssembledPack {
    /// Index entry for this pack once its compressed `size` is known.
    #[must_use]
    pub fn metadata(
        &self,
        id: u32,
        region: &RegionCode,
        name: &str,
        size: u64,
        updated_at: DateTime<Utc>,
    ) -> PackMetadata {
        PackMetadata {
            v: self.data.v.clone(),
            id,
            region: region.to_string(),
            name: name.to_string(),
            hotspots: self.data.hotspots.len(),
            clusters: PackMetadata::cluster_coords(&self.clusters),
            size,
            updated_at,
        }
    }

    /// Storage record for this pack.
    #[must_use]
    pub fn record(
        &self,
        id: u32,
        region: &RegionCode,
        name: &str,
        last_synced_at: DateTime<Utc>,
    ) -> PackRecord {
        PackRecord {
            id,
            region: region.to_string(),
            name: name.to_string(),
            hotspots: self.data.hotspots.len(),
            last_synced_at,
            bounds: self.geometry.pack_bounds(),
            center: self.geometry.center,
            has_custom_center: self.geometry.has_custom_center,
            clusters: self.clusters.clone(),
        }
    }
}

/// Assembles a region's pack body, resolves its geometry, and builds
/// cluster markers over the hotspots that made it into the pack.
///
/// # Errors
///
/// Returns [`AssembleError::DuplicateSpeciesCode`] if a target would
/// repeat a species code. A region without hotspots is not an error: it
/// yields an empty pack with no clusters.
pub fn assemble_region(input: &RegionPackInput<'_>) -> Result<AssembledPack, AssembleError> {
    let data = assemble(
        input.region,
        input.version,
        input.hotspots,
        input.series,
        &input.lookups,
    )?;

    let geometry = RegionGeometry::resolve(
        input.hotspots,
        input.upstream_bounds,
        input.upstream_centroid,
        input.custom_center,
    );

    let points: Vec<LatLng> = data
        .hotspots
        .iter()
        .map(|h| LatLng::new(h.lat, h.lng))
        .collect();
    let clusters = build_clusters(
        &points,
        desired_clusters(points.len()),
        Some(geometry.center),
    );

    log::debug!(
        "{}: {} hotspots, {} targets, {} clusters",
        input.region,
        data.hotspots.len(),
        data.targets.len(),
        clusters.len()
    );

    Ok(AssembledPack {
        data,
        geometry,
        clusters,
    })
}
