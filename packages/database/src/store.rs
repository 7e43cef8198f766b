//! The in-memory hotspot table and its spatial index.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use hotspot_map_hotspot_models::{Hotspot, RegionCode, coordinates_in_range};
use hotspot_map_spatial::{
    BoundsQuery, IndexEntry, NearbyQuery, RowId, SpatialIndex, nearby, within_bounds,
};

use crate::StoreError;

/// A hotspot returned by [`HotspotStore::nearby`] with its distance.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyHotspot {
    /// The hotspot.
    pub hotspot: Hotspot,
    /// Great-circle distance from the query point in kilometers.
    pub distance_km: f64,
}

#[derive(Debug, Default)]
struct StoreInner {
    hotspots: BTreeMap<RowId, Hotspot>,
    row_ids: BTreeMap<String, RowId>,
    index: SpatialIndex,
    next_row_id: RowId,
}

impl StoreInner {
    fn row_id(&self, id: &str) -> Result<RowId, StoreError> {
        self.row_ids
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn insert_new(&mut self, hotspot: Hotspot) -> RowId {
        self.next_row_id += 1;
        let row_id = self.next_row_id;
        self.index
            .insert(row_id, hotspot.latitude, hotspot.longitude);
        self.row_ids.insert(hotspot.id.clone(), row_id);
        self.hotspots.insert(row_id, hotspot);
        row_id
    }

    fn replace(&mut self, row_id: RowId, hotspot: Hotspot) {
        self.index
            .insert(row_id, hotspot.latitude, hotspot.longitude);
        self.hotspots.insert(row_id, hotspot);
    }
}

fn validate(id: &str, latitude: f64, longitude: f64) -> Result<(), StoreError> {
    if coordinates_in_range(latitude, longitude) {
        Ok(())
    } else {
        Err(StoreError::InvalidCoordinates {
            id: id.to_string(),
            latitude,
            longitude,
        })
    }
}

/// Hotspot table plus spatial index, guarded by one read-write lock.
///
/// Queries take the read lock and may run from any number of threads;
/// mutations take the write lock. Row ids are assigned internally and are
/// never reused.
#[derive(Debug, Default)]
pub struct HotspotStore {
    inner: RwLock<StoreInner>,
}

impl HotspotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds a store from a batch of hotspots, bulk-loading the index.
    /// Later duplicates of an external id replace earlier ones.
    ///
    /// # Errors
    ///
    /// * [`StoreError::InvalidCoordinates`] if any hotspot is out of range
    pub fn from_hotspots(hotspots: impl IntoIterator<Item = Hotspot>) -> Result<Self, StoreError> {
        let mut inner = StoreInner::default();

        for hotspot in hotspots {
            validate(&hotspot.id, hotspot.latitude, hotspot.longitude)?;
            if let Some(&row_id) = inner.row_ids.get(&hotspot.id) {
                inner.hotspots.insert(row_id, hotspot);
            } else {
                inner.next_row_id += 1;
                inner.row_ids.insert(hotspot.id.clone(), inner.next_row_id);
                inner.hotspots.insert(inner.next_row_id, hotspot);
            }
        }

        inner.index = SpatialIndex::bulk_load(inner.hotspots.iter().map(|(&id, h)| IndexEntry {
            id,
            latitude: h.latitude,
            longitude: h.longitude,
        }));

        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Inserts a new hotspot.
    ///
    /// # Errors
    ///
    /// * [`StoreError::InvalidCoordinates`] if the coordinates are out of
    ///   range
    /// * [`StoreError::Duplicate`] if the external id already exists
    pub fn insert(&self, hotspot: Hotspot) -> Result<RowId, StoreError> {
        validate(&hotspot.id, hotspot.latitude, hotspot.longitude)?;

        let mut inner = self.write();
        if inner.row_ids.contains_key(&hotspot.id) {
            return Err(StoreError::Duplicate(hotspot.id));
        }
        Ok(inner.insert_new(hotspot))
    }

    /// Inserts a hotspot or replaces the existing one with the same
    /// external id. A replaced hotspot keeps its original `created_at`.
    ///
    /// # Errors
    ///
    /// * [`StoreError::InvalidCoordinates`] if the coordinates are out of
    ///   range
    pub fn upsert(&self, mut hotspot: Hotspot) -> Result<RowId, StoreError> {
        validate(&hotspot.id, hotspot.latitude, hotspot.longitude)?;

        let mut inner = self.write();
        let Some(&row_id) = inner.row_ids.get(&hotspot.id) else {
            return Ok(inner.insert_new(hotspot));
        };

        if let Some(existing) = inner.hotspots.get(&row_id) {
            hotspot.created_at = existing.created_at;
        }
        inner.replace(row_id, hotspot);
        Ok(row_id)
    }

    /// Moves a hotspot. The index entry is updated before the lock is
    /// released.
    ///
    /// # Errors
    ///
    /// * [`StoreError::InvalidCoordinates`] if the coordinates are out of
    ///   range
    /// * [`StoreError::NotFound`] if no hotspot has the id
    pub fn update_coordinates(&self, id: &str, latitude: f64, longitude: f64) -> Result<(), StoreError> {
        validate(id, latitude, longitude)?;

        let mut inner = self.write();
        let row_id = inner.row_id(id)?;
        let Some(existing) = inner.hotspots.get(&row_id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let mut hotspot = existing.clone();
        hotspot.latitude = latitude;
        hotspot.longitude = longitude;
        hotspot.updated_at = Utc::now();
        inner.replace(row_id, hotspot);
        Ok(())
    }

    /// Removes a hotspot and its index entry.
    ///
    /// # Errors
    ///
    /// * [`StoreError::NotFound`] if no hotspot has the id
    pub fn delete(&self, id: &str) -> Result<Hotspot, StoreError> {
        let mut inner = self.write();
        let row_id = inner.row_id(id)?;
        inner.row_ids.remove(id);
        inner.index.delete(row_id);
        inner
            .hotspots
            .remove(&row_id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Looks up a hotspot by external id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Hotspot> {
        let inner = self.read();
        let row_id = inner.row_ids.get(id)?;
        inner.hotspots.get(row_id).cloned()
    }

    /// All hotspots inside `region` (at any depth), ordered by external id.
    #[must_use]
    pub fn in_region(&self, region: &RegionCode) -> Vec<Hotspot> {
        let inner = self.read();
        inner
            .row_ids
            .values()
            .filter_map(|row_id| inner.hotspots.get(row_id))
            .filter(|h| h.is_in_region(region))
            .cloned()
            .collect()
    }

    /// Hotspots within the query radius, nearest first.
    #[must_use]
    pub fn nearby(&self, query: &NearbyQuery) -> Vec<NearbyHotspot> {
        let inner = self.read();
        nearby(&inner.index, query)
            .into_iter()
            .filter_map(|hit| {
                inner.hotspots.get(&hit.id).map(|hotspot| NearbyHotspot {
                    hotspot: hotspot.clone(),
                    distance_km: hit.distance_km,
                })
            })
            .collect()
    }

    /// Hotspots inside the viewport, in row order.
    #[must_use]
    pub fn within_bounds(&self, query: &BoundsQuery) -> Vec<Hotspot> {
        let inner = self.read();
        within_bounds(&inner.index, query)
            .into_iter()
            .filter_map(|row_id| inner.hotspots.get(&row_id).cloned())
            .collect()
    }

    /// Number of stored hotspots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().hotspots.len()
    }

    /// Returns `true` if the store holds no hotspots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().hotspots.is_empty()
    }
}
