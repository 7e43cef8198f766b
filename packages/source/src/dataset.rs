//! Local observation dataset.
//!
//! The dataset is a directory of three CSV files with header rows:
//!
//! | File | Columns |
//! |------|---------|
//! | `observations.csv` | `location_id,month,species_id,obs,samples` |
//! | `species.csv` | `species_id,code` |
//! | `regions.csv` | `code,name` |
//!
//! `species.csv` and `regions.csv` are optional; without them every
//! species is unknown and region names fall back to their codes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use hotspot_map_observations::{ObservationRow, SpeciesId};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::SourceError;

/// Observation rows file name.
pub const OBSERVATIONS_FILE: &str = "observations.csv";

/// Species lookup file name.
pub const SPECIES_FILE: &str = "species.csv";

/// Region name lookup file name.
pub const REGIONS_FILE: &str = "regions.csv";

#[derive(Debug, Deserialize)]
struct SpeciesRow {
    species_id: SpeciesId,
    code: String,
}

#[derive(Debug, Deserialize)]
struct RegionRow {
    code: String,
    name: String,
}

/// Observation rows plus the lookups needed to assemble packs.
#[derive(Debug, Clone, Default)]
pub struct ObservationDataset {
    rows: Vec<ObservationRow>,
    species_codes: BTreeMap<SpeciesId, String>,
    region_names: BTreeMap<String, String>,
}

fn read_csv<T: DeserializeOwned>(reader: impl std::io::Read) -> Result<Vec<T>, SourceError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

fn read_optional_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    if !path.exists() {
        log::warn!("{} not found, continuing without it", path.display());
        return Ok(Vec::new());
    }
    read_csv(std::fs::File::open(path)?)
}

impl ObservationDataset {
    /// Creates a dataset from in-memory parts.
    #[must_use]
    pub const fn new(
        rows: Vec<ObservationRow>,
        species_codes: BTreeMap<SpeciesId, String>,
        region_names: BTreeMap<String, String>,
    ) -> Self {
        Self {
            rows,
            species_codes,
            region_names,
        }
    }

    /// Loads the dataset from `dir`.
    ///
    /// # Errors
    ///
    /// * If `observations.csv` is missing or unreadable
    /// * If any file has malformed rows
    pub fn load(dir: &Path) -> Result<Self, SourceError> {
        let rows: Vec<ObservationRow> =
            read_csv(std::fs::File::open(dir.join(OBSERVATIONS_FILE))?)?;
        let species: Vec<SpeciesRow> = read_optional_csv(&dir.join(SPECIES_FILE))?;
        let regions: Vec<RegionRow> = read_optional_csv(&dir.join(REGIONS_FILE))?;

        log::info!(
            "Loaded {} observation rows, {} species, {} region names from {}",
            rows.len(),
            species.len(),
            regions.len(),
            dir.display()
        );

        Ok(Self::new(
            rows,
            species.into_iter().map(|s| (s.species_id, s.code)).collect(),
            regions.into_iter().map(|r| (r.code, r.name)).collect(),
        ))
    }

    /// Rows for the given locations, in dataset order.
    #[must_use]
    pub fn rows_for(&self, location_ids: &BTreeSet<&str>) -> Vec<ObservationRow> {
        self.rows
            .iter()
            .filter(|row| location_ids.contains(row.location_id.as_str()))
            .cloned()
            .collect()
    }

    /// Internal species id -> species code.
    #[must_use]
    pub const fn species_codes(&self) -> &BTreeMap<SpeciesId, String> {
        &self.species_codes
    }

    /// Region code -> display name.
    #[must_use]
    pub const fn region_names(&self) -> &BTreeMap<String, String> {
        &self.region_names
    }

    /// Total number of observation rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the dataset has no observation rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
