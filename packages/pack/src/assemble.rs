//! Pack body assembly.

use std::collections::{BTreeMap, BTreeSet};

use hotspot_map_hotspot_models::{Hotspot, RegionCode};
use hotspot_map_observations::{LocationSeries, SeriesMap, SpeciesId};
use hotspot_map_pack_models::{PackData, PackHotspot, PackTarget, TargetSpecies};

/// Errors that make a single region's pack unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    /// Two internal species ids at one location resolved to the same code.
    #[error("location {location_id} has species code {code} more than once")]
    DuplicateSpeciesCode {
        /// Location whose target would be invalid.
        location_id: String,
        /// The repeated code.
        code: String,
    },
}

/// Lookup tables consulted while assembling.
#[derive(Debug, Clone, Copy)]
pub struct PackLookups<'a> {
    /// Internal species id -> species code.
    pub species_codes: &'a BTreeMap<SpeciesId, String>,
    /// Region code -> display name.
    pub region_names: &'a BTreeMap<String, String>,
}

impl PackLookups<'_> {
    fn region_name(&self, code: &RegionCode) -> String {
        self.region_names
            .get(code.as_str())
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

fn pack_hotspot(
    hotspot: &Hotspot,
    series: Option<&LocationSeries>,
    lookups: &PackLookups<'_>,
) -> PackHotspot {
    PackHotspot {
        id: hotspot.id.clone(),
        name: hotspot.name.clone(),
        lat: hotspot.latitude,
        lng: hotspot.longitude,
        species: series.map_or(0, LocationSeries::richness),
        country: hotspot.country_code.to_string(),
        country_name: lookups.region_name(&hotspot.country_code),
        state: hotspot.state_code.to_string(),
        state_name: lookups.region_name(&hotspot.state_code),
        county: hotspot.county_code.as_ref().map(ToString::to_string),
        county_name: hotspot
            .county_code
            .as_ref()
            .map(|code| lookups.region_name(code)),
        open: hotspot.open_access,
    }
}

/// Builds a target for one location. Species without a code are dropped
/// and counted into `dropped`.
fn pack_target(
    location_id: &str,
    series: &LocationSeries,
    lookups: &PackLookups<'_>,
    dropped: &mut usize,
) -> Result<PackTarget, AssembleError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut species = Vec::with_capacity(series.species().len());

    for entry in series.species() {
        let Some(code) = lookups.species_codes.get(&entry.species_id) else {
            log::debug!(
                "Location {location_id}: dropping unknown species id {}",
                entry.species_id
            );
            *dropped += 1;
            continue;
        };

        if !seen.insert(code.as_str()) {
            return Err(AssembleError::DuplicateSpeciesCode {
                location_id: location_id.to_string(),
                code: code.clone(),
            });
        }

        species.push(TargetSpecies {
            code: code.clone(),
            obs: entry.obs,
        });
    }

    Ok(PackTarget {
        id: location_id.to_string(),
        samples: *series.samples(),
        species,
    })
}

/// Assembles the pack body for `region`.
///
/// Hotspots keep their input order; hotspots whose region codes fall
/// outside `region` are skipped. Species richness comes from `series`, not
/// from the stored lifetime total. Output is deterministic for identical
/// input.
///
/// # Errors
///
/// Returns [`AssembleError::DuplicateSpeciesCode`] if two species ids at
/// one location map to the same code.
pub fn assemble(
    region: &RegionCode,
    version: &str,
    hotspots: &[Hotspot],
    series: &SeriesMap,
    lookups: &PackLookups<'_>,
) -> Result<PackData, AssembleError> {
    let mut pack_hotspots = Vec::with_capacity(hotspots.len());
    let mut targets = Vec::new();
    let mut dropped = 0usize;

    for hotspot in hotspots {
        if !hotspot.is_in_region(region) {
            log::debug!(
                "Skipping hotspot {} ({}) outside region {region}",
                hotspot.id,
                hotspot.region_code()
            );
            continue;
        }

        let location_series = series.get(&hotspot.id);
        pack_hotspots.push(pack_hotspot(hotspot, location_series, lookups));

        if let Some(location_series) = location_series {
            targets.push(pack_target(
                &hotspot.id,
                location_series,
                lookups,
                &mut dropped,
            )?);
        }
    }

    if dropped > 0 {
        log::warn!("{region}: dropped {dropped} species entries with no species code");
    }

    Ok(PackData {
        v: version.to_string(),
        hotspots: pack_hotspots,
        targets,
    })
}
