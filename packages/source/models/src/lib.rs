#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wire types for the upstream ecological-observation API.
//!
//! Field names follow the upstream JSON (`locId`, `subnational1Code`, ...).
//! [`UpstreamHotspot::into_hotspot`] converts a listing entry into the
//! canonical [`Hotspot`].

use chrono::{DateTime, Utc};
use hotspot_map_hotspot_models::{Hotspot, InvalidRegionCode, RegionCode};
use serde::{Deserialize, Serialize};

/// One entry of a region's hotspot listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamHotspot {
    /// Stable location id, e.g. `L123456`.
    pub loc_id: String,
    /// Location name.
    pub loc_name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Country code.
    pub country_code: String,
    /// State-level region code.
    pub subnational1_code: String,
    /// County-level region code; absent for some countries.
    #[serde(default)]
    pub subnational2_code: Option<String>,
    /// Lifetime species total reported upstream.
    #[serde(default)]
    pub num_species_all_time: Option<u32>,
}

impl UpstreamHotspot {
    /// Converts to a canonical hotspot stamped with `now`.
    ///
    /// An empty county code is treated as absent.
    ///
    /// # Errors
    ///
    /// * If any region code is malformed
    pub fn into_hotspot(self, now: DateTime<Utc>) -> Result<Hotspot, InvalidRegionCode> {
        let county_code = match self.subnational2_code.as_deref() {
            None | Some("") => None,
            Some(code) => Some(RegionCode::parse(code)?),
        };

        Ok(Hotspot {
            country_code: RegionCode::parse(&self.country_code)?,
            state_code: RegionCode::parse(&self.subnational1_code)?,
            county_code,
            species_total: self.num_species_all_time.unwrap_or(0),
            open_access: None,
            notes: None,
            created_at: now,
            updated_at: now,
            id: self.loc_id,
            name: self.loc_name,
            latitude: self.lat,
            longitude: self.lng,
        })
    }
}

/// Bounding box as reported by the region-info endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionBounds {
    /// Western longitude.
    pub min_x: f64,
    /// Eastern longitude.
    pub max_x: f64,
    /// Southern latitude.
    pub min_y: f64,
    /// Northern latitude.
    pub max_y: f64,
}

/// A region centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionCentroid {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Response of the region-info endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Display name, e.g. `California, United States`.
    #[serde(rename = "result")]
    pub name: String,
    /// Region bounds, when known.
    #[serde(default)]
    pub bounds: Option<RegionBounds>,
    /// Region centroid, when known.
    #[serde(default)]
    pub centroid: Option<RegionCentroid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {"locId":"L1","locName":"Pond","countryCode":"US","subnational1Code":"US-CA",
         "subnational2Code":"US-CA-085","lat":37.1,"lng":-122.2,
         "latestObsDt":"2024-01-02 08:00","numSpeciesAllTime":212},
        {"locId":"L2","locName":"Ridge","countryCode":"US","subnational1Code":"US-CA",
         "lat":37.2,"lng":-122.3}
    ]"#;

    #[test]
    fn parses_listing_with_optional_fields() {
        let listing: Vec<UpstreamHotspot> = serde_json::from_str(LISTING).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].num_species_all_time, Some(212));
        assert_eq!(listing[1].subnational2_code, None);
    }

    #[test]
    fn converts_to_hotspot() {
        let listing: Vec<UpstreamHotspot> = serde_json::from_str(LISTING).unwrap();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let hotspot = listing[0].clone().into_hotspot(now).unwrap();
        assert_eq!(hotspot.id, "L1");
        assert_eq!(hotspot.region_code().as_str(), "US-CA-085");
        assert_eq!(hotspot.species_total, 212);
        assert_eq!(hotspot.open_access, None);

        let no_county = listing[1].clone().into_hotspot(now).unwrap();
        assert_eq!(no_county.region_code().as_str(), "US-CA");
        assert_eq!(no_county.species_total, 0);
    }

    #[test]
    fn empty_county_code_is_absent() {
        let mut entry: UpstreamHotspot = serde_json::from_str::<Vec<_>>(LISTING).unwrap().remove(0);
        entry.subnational2_code = Some(String::new());
        let now = DateTime::from_timestamp(0, 0).unwrap();
        assert!(entry.into_hotspot(now).unwrap().county_code.is_none());
    }

    #[test]
    fn parses_region_info() {
        let info: RegionInfo = serde_json::from_str(
            r#"{"result":"California, United States",
                "bounds":{"minX":-124.4,"maxX":-114.1,"minY":32.5,"maxY":42.0}}"#,
        )
        .unwrap();
        assert_eq!(info.name, "California, United States");
        assert_eq!(info.bounds.unwrap().min_x, -124.4);
        assert!(info.centroid.is_none());
    }
}
