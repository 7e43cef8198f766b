#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Offline pack artifact types.
//!
//! A pack is a per-region bundle consumed by an offline client:
//!
//! - `{region}.json.gz` holds a [`PackData`] body (hotspots with
//!   denormalized region names, plus monthly target series).
//! - `packs.json.gz` holds a [`PackIndex`] listing every pack with its
//!   cluster markers and compressed size.
//! - `pack_records.json` holds a [`PackRecord`] per region for the storage
//!   layer (bounds, center, un-rounded cluster counts).
//!
//! These are the serialized shapes; field names are part of the client
//! contract.

use std::fmt;

use chrono::{DateTime, Utc};
use hotspot_map_spatial::{ClusterCenter, LatLng};
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of monthly slots in every target series.
pub const PACK_MONTHS: usize = 12;

/// Decimal places kept for cluster coordinates in the index (~110 m).
pub const CLUSTER_COORD_DECIMALS: i32 = 3;

/// Rounds a coordinate to [`CLUSTER_COORD_DECIMALS`] places.
#[must_use]
pub fn round_coord(value: f64) -> f64 {
    let scale = 10f64.powi(CLUSTER_COORD_DECIMALS);
    (value * scale).round() / scale
}

/// A hotspot as shipped in a pack, with region names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackHotspot {
    /// External location id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Distinct species observed at the location.
    pub species: usize,
    /// Country code.
    pub country: String,
    /// Country name (falls back to the code).
    pub country_name: String,
    /// State code.
    pub state: String,
    /// State name (falls back to the code).
    pub state_name: String,
    /// County code, when the hotspot has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// County name (falls back to the code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county_name: Option<String>,
    /// Open-access flag; `null` when unknown.
    #[serde(default)]
    pub open: Option<bool>,
}

/// Monthly observation counts for one species in a target.
///
/// Serialized as a flat array: `[code, jan, feb, ..., dec]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpecies {
    /// Species code, e.g. `amerob`.
    pub code: String,
    /// Observations per month, January first.
    pub obs: [u32; PACK_MONTHS],
}

impl Serialize for TargetSpecies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(PACK_MONTHS + 1))?;
        seq.serialize_element(&self.code)?;
        for n in &self.obs {
            seq.serialize_element(n)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for TargetSpecies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TargetSpeciesVisitor;

        impl<'de> Visitor<'de> for TargetSpeciesVisitor {
            type Value = TargetSpecies;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array of a species code followed by {PACK_MONTHS} counts")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let code: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;

                let mut obs = [0u32; PACK_MONTHS];
                for (i, slot) in obs.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i + 1, &self))?;
                }

                if seq.next_element::<IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(PACK_MONTHS + 2, &self));
                }

                Ok(TargetSpecies { code, obs })
            }
        }

        deserializer.deserialize_seq(TargetSpeciesVisitor)
    }
}

/// Monthly series for one location in a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackTarget {
    /// External location id.
    pub id: String,
    /// Checklists per month; `null` where nobody sampled.
    pub samples: [Option<u32>; PACK_MONTHS],
    /// Per-species counts, unique by code.
    pub species: Vec<TargetSpecies>,
}

/// The body of a `{region}.json.gz` pack file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackData {
    /// Dataset version tag.
    pub v: String,
    /// Hotspots in the region.
    pub hotspots: Vec<PackHotspot>,
    /// Monthly series for hotspots that have observation data.
    pub targets: Vec<PackTarget>,
}

/// One entry of the `packs.json.gz` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    /// Dataset version tag; identical to the pack body's `v`.
    pub v: String,
    /// Pack id.
    pub id: u32,
    /// Region code.
    pub region: String,
    /// Display name.
    pub name: String,
    /// Number of hotspots in the pack.
    pub hotspots: usize,
    /// Cluster markers as `[lat, lng]`, rounded.
    pub clusters: Vec<[f64; 2]>,
    /// Compressed size of the pack file in bytes.
    pub size: u64,
    /// When the pack was generated.
    pub updated_at: DateTime<Utc>,
}

impl PackMetadata {
    /// Converts cluster centers to rounded `[lat, lng]` pairs.
    #[must_use]
    pub fn cluster_coords(clusters: &[ClusterCenter]) -> Vec<[f64; 2]> {
        clusters
            .iter()
            .map(|c| [round_coord(c.lat), round_coord(c.lng)])
            .collect()
    }
}

/// The `packs.json.gz` index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackIndex {
    /// All published packs.
    pub packs: Vec<PackMetadata>,
}

impl PackIndex {
    /// Adds an entry, replacing any existing entry for the same region.
    pub fn upsert(&mut self, entry: PackMetadata) {
        match self.packs.iter_mut().find(|p| p.region == entry.region) {
            Some(existing) => *existing = entry,
            None => self.packs.push(entry),
        }
    }

    /// Looks up the entry for a region.
    #[must_use]
    pub fn get(&self, region: &str) -> Option<&PackMetadata> {
        self.packs.iter().find(|p| p.region == region)
    }
}

/// A region bounding box in pack-record form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackBounds {
    /// Western longitude.
    pub min_x: f64,
    /// Southern latitude.
    pub min_y: f64,
    /// Eastern longitude.
    pub max_x: f64,
    /// Northern latitude.
    pub max_y: f64,
}

/// Storage-layer record of a generated pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackRecord {
    /// Pack id.
    pub id: u32,
    /// Region code.
    pub region: String,
    /// Display name.
    pub name: String,
    /// Number of hotspots.
    pub hotspots: usize,
    /// When the region's hotspots were last synced.
    pub last_synced_at: DateTime<Utc>,
    /// Region bounds.
    pub bounds: PackBounds,
    /// Region center.
    pub center: LatLng,
    /// `true` when `center` is an operator override.
    pub has_custom_center: bool,
    /// Cluster centers with un-rounded coordinates and counts.
    pub clusters: Vec<ClusterCenter>,
}

/// Contents of `pack_records.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackRecords {
    /// One record per region.
    pub records: Vec<PackRecord>,
}

impl PackRecords {
    /// Adds a record, replacing any existing record for the same region.
    pub fn upsert(&mut self, record: PackRecord) {
        match self.records.iter_mut().find(|r| r.region == record.region) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}
