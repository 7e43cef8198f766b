//! R-tree index over hotspot coordinates.
//!
//! Each hotspot is stored as a degenerate bounding box keyed by its row id.
//! The index only returns candidates whose box intersects a query box; it
//! never computes distances.

use std::collections::BTreeMap;

use rstar::{AABB, RTree, RTreeObject};

use crate::geo_math::BoundingBox;

/// Stable row identifier assigned by the storage layer.
pub type RowId = u64;

/// A hotspot point stored in the R-tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    /// Row identifier.
    pub id: RowId,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.longitude, self.latitude])
    }
}

/// Converts a [`BoundingBox`] to an R-tree envelope (`x` = longitude).
fn to_envelope(bounds: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bounds.west, bounds.south], [bounds.east, bounds.north])
}

/// Bounding-box index with one entry per row id.
///
/// Mutation takes `&mut self`; callers that share the index across
/// threads wrap it in a lock (see the storage layer).
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
    /// row id -> the exact entry stored in the tree, needed for removal.
    entries: BTreeMap<RowId, IndexEntry>,
}

impl SpatialIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a batch of entries in one pass.
    ///
    /// Later entries win when the same row id appears more than once.
    #[must_use]
    pub fn bulk_load(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let entries: BTreeMap<RowId, IndexEntry> = entries.into_iter().map(|e| (e.id, e)).collect();
        let tree = RTree::bulk_load(entries.values().copied().collect());
        log::debug!("Bulk loaded {} entries into spatial index", tree.size());
        Self { tree, entries }
    }

    /// Inserts a point. An existing entry for `id` is replaced.
    pub fn insert(&mut self, id: RowId, latitude: f64, longitude: f64) {
        self.delete(id);
        let entry = IndexEntry {
            id,
            latitude,
            longitude,
        };
        self.tree.insert(entry);
        self.entries.insert(id, entry);
    }

    /// Moves an existing entry. Returns `false` if `id` is not indexed.
    pub fn update(&mut self, id: RowId, latitude: f64, longitude: f64) -> bool {
        if !self.entries.contains_key(&id) {
            return false;
        }
        self.insert(id, latitude, longitude);
        true
    }

    /// Removes an entry. Returns `false` if `id` was not indexed.
    pub fn delete(&mut self, id: RowId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        if self.tree.remove(&entry).is_none() {
            log::warn!("Spatial index entry {id} was tracked but missing from the R-tree");
        }
        true
    }

    /// Returns the indexed entry for `id`.
    #[must_use]
    pub fn get(&self, id: RowId) -> Option<&IndexEntry> {
        self.entries.get(&id)
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every entry whose box intersects any of `boxes`, ordered by
    /// row id. An entry matched by several boxes is returned once.
    #[must_use]
    pub fn candidates(&self, boxes: &[BoundingBox]) -> Vec<IndexEntry> {
        let mut hits: BTreeMap<RowId, IndexEntry> = BTreeMap::new();
        for bounds in boxes {
            for entry in self.tree.locate_in_envelope_intersecting(&to_envelope(bounds)) {
                hits.insert(entry.id, *entry);
            }
        }
        hits.into_values().collect()
    }

    /// Row ids of every entry intersecting any of `boxes` (logical OR).
    #[must_use]
    pub fn query_intersecting(&self, boxes: &[BoundingBox]) -> Vec<RowId> {
        self.candidates(boxes).into_iter().map(|e| e.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_math::make_bounds;

    fn sample() -> SpatialIndex {
        SpatialIndex::bulk_load([
            IndexEntry {
                id: 1,
                latitude: 37.0,
                longitude: -122.0,
            },
            IndexEntry {
                id: 2,
                latitude: 37.5,
                longitude: -121.5,
            },
            IndexEntry {
                id: 3,
                latitude: 10.0,
                longitude: 179.9,
            },
            IndexEntry {
                id: 4,
                latitude: 10.0,
                longitude: -179.9,
            },
        ])
    }

    #[test]
    fn queries_single_box() {
        let index = sample();
        let ids = index.query_intersecting(&[BoundingBox::new(-123.0, 36.0, -121.8, 37.2)]);
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn ors_across_boxes() {
        let index = sample();
        let ids = index.query_intersecting(&make_bounds(10.0, 179.95, 50.0));
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn overlapping_boxes_do_not_duplicate() {
        let index = sample();
        let b = BoundingBox::new(-123.0, 36.0, -121.0, 38.0);
        assert_eq!(index.query_intersecting(&[b, b]), vec![1, 2]);
    }

    #[test]
    fn update_moves_entry() {
        let mut index = sample();
        assert!(index.update(1, 10.0, 179.8));
        let ids = index.query_intersecting(&[BoundingBox::new(179.0, 9.0, 180.0, 11.0)]);
        assert_eq!(ids, vec![1, 3]);
        assert!(
            index
                .query_intersecting(&[BoundingBox::new(-122.1, 36.9, -121.9, 37.1)])
                .is_empty()
        );
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn update_of_unknown_id_is_rejected() {
        let mut index = sample();
        assert!(!index.update(99, 0.0, 0.0));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn delete_removes_entry() {
        let mut index = sample();
        assert!(index.delete(2));
        assert!(!index.delete(2));
        assert_eq!(index.len(), 3);
        let ids = index.query_intersecting(&[BoundingBox::new(-180.0, -90.0, 180.0, 90.0)]);
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn insert_replaces_existing_id() {
        let mut index = SpatialIndex::new();
        index.insert(7, 1.0, 1.0);
        index.insert(7, 2.0, 2.0);
        assert_eq!(index.len(), 1);
        let entry = index.get(7).unwrap();
        assert!((entry.latitude - 2.0).abs() < f64::EPSILON);
    }
}
