//! Populates a [`HotspotStore`] from generated pack artifacts.

use std::path::Path;

use chrono::{DateTime, Utc};
use hotspot_map_hotspot_models::{Hotspot, RegionCode};
use hotspot_map_pack::artifact::{list_pack_regions, read_index, read_pack};
use hotspot_map_pack_models::{PackHotspot, PackIndex};

use crate::{HotspotStore, StoreError};

fn to_hotspot(pack: PackHotspot, updated_at: DateTime<Utc>) -> Result<Hotspot, StoreError> {
    Ok(Hotspot {
        country_code: RegionCode::parse(&pack.country)?,
        state_code: RegionCode::parse(&pack.state)?,
        county_code: pack.county.as_deref().map(RegionCode::parse).transpose()?,
        species_total: u32::try_from(pack.species).unwrap_or(u32::MAX),
        open_access: pack.open,
        notes: None,
        created_at: updated_at,
        updated_at,
        id: pack.id,
        name: pack.name,
        latitude: pack.lat,
        longitude: pack.lng,
    })
}

/// Regions with a pack file in `dir` that `index` does not list, sorted.
/// A missing directory has none.
///
/// # Errors
///
/// * If the directory exists but cannot be listed
pub fn unindexed_packs(dir: &Path, index: &PackIndex) -> Result<Vec<String>, StoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(list_pack_regions(dir)?
        .into_iter()
        .filter(|region| index.get(region).is_none())
        .collect())
}

/// Loads every pack listed in `dir`'s index into a new store.
///
/// A pack that is listed but cannot be read is logged and skipped so one
/// bad artifact does not take the whole store down. Pack files the index
/// does not list are reported and left unloaded. A missing index yields an
/// empty store.
///
/// # Errors
///
/// * If the index exists but cannot be read
/// * If a pack contains an invalid region code or out-of-range coordinates
pub fn load_packs(dir: &Path) -> Result<HotspotStore, StoreError> {
    let index = read_index(dir)?;
    for region in unindexed_packs(dir, &index)? {
        log::warn!("Pack {region} is not listed in the index, not loading it");
    }

    let mut hotspots = Vec::new();

    for entry in &index.packs {
        let pack = match read_pack(dir, &entry.region) {
            Ok(pack) => pack,
            Err(e) => {
                log::warn!("Skipping pack {}: {e}", entry.region);
                continue;
            }
        };

        log::debug!(
            "Loaded pack {} ({} hotspots, version {})",
            entry.region,
            pack.hotspots.len(),
            pack.v
        );

        for hotspot in pack.hotspots {
            hotspots.push(to_hotspot(hotspot, entry.updated_at)?);
        }
    }

    let store = HotspotStore::from_hotspots(hotspots)?;
    log::info!(
        "Loaded {} hotspots from {} packs in {}",
        store.len(),
        index.packs.len(),
        dir.display()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use hotspot_map_pack::artifact::{write_index, write_pack};
    use hotspot_map_pack_models::{PackData, PackMetadata};
    use hotspot_map_spatial::NearbyQuery;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hotspot_map_database_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn pack_hotspot(id: &str, lat: f64, lng: f64, state: &str) -> PackHotspot {
        PackHotspot {
            id: id.to_string(),
            name: id.to_string(),
            lat,
            lng,
            species: 12,
            country: "US".to_string(),
            country_name: "United States".to_string(),
            state: state.to_string(),
            state_name: state.to_string(),
            county: None,
            county_name: None,
            open: Some(true),
        }
    }

    fn metadata(region: &str) -> PackMetadata {
        PackMetadata {
            v: "2025-03".to_string(),
            id: 1,
            region: region.to_string(),
            name: region.to_string(),
            hotspots: 1,
            clusters: Vec::new(),
            size: 0,
            updated_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn loads_listed_packs_and_skips_missing() {
        let dir = temp_dir("load");
        let pack = PackData {
            v: "2025-03".to_string(),
            hotspots: vec![
                pack_hotspot("L1", 37.0, -122.0, "US-CA"),
                pack_hotspot("L2", 37.01, -122.0, "US-CA"),
            ],
            targets: Vec::new(),
        };
        write_pack(&dir, "US-CA", &pack).unwrap();

        let mut index = PackIndex::default();
        index.upsert(metadata("US-CA"));
        index.upsert(metadata("US-NV"));
        write_index(&dir, &index).unwrap();

        let store = load_packs(&dir).unwrap();
        assert_eq!(store.len(), 2);
        assert!(unindexed_packs(&dir, &index).unwrap().is_empty());
        let l1 = store.get("L1").unwrap();
        assert_eq!(l1.state_code.as_str(), "US-CA");
        assert_eq!(l1.species_total, 12);

        let query = NearbyQuery::new(37.0, -122.0, 5.0, None).unwrap();
        assert_eq!(store.nearby(&query).len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn pack_files_outside_the_index_are_not_loaded() {
        let dir = temp_dir("unindexed");
        let listed = PackData {
            v: "2025-03".to_string(),
            hotspots: vec![pack_hotspot("L1", 37.0, -122.0, "US-CA")],
            targets: Vec::new(),
        };
        let stray = PackData {
            v: "2025-03".to_string(),
            hotspots: vec![pack_hotspot("L9", 39.0, -117.0, "US-NV")],
            targets: Vec::new(),
        };
        write_pack(&dir, "US-CA", &listed).unwrap();
        write_pack(&dir, "US-NV", &stray).unwrap();

        let mut index = PackIndex::default();
        index.upsert(metadata("US-CA"));
        write_index(&dir, &index).unwrap();

        assert_eq!(unindexed_packs(&dir, &index).unwrap(), vec!["US-NV"]);
        let store = load_packs(&dir).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("L9").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_index_is_an_empty_store() {
        let dir = temp_dir("empty");
        assert!(load_packs(&dir).unwrap().is_empty());
    }
}
