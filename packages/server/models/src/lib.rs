#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the hotspot map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the storage types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use hotspot_map_hotspot_models::{Hotspot, RegionCode};
use serde::{Deserialize, Serialize};

/// A hotspot as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspot {
    /// External hotspot id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Country code.
    pub country_code: RegionCode,
    /// State code.
    pub state_code: RegionCode,
    /// County code, when known.
    pub county_code: Option<RegionCode>,
    /// Lifetime species total.
    pub species: u32,
    /// Public access flag (`null` = unknown).
    pub open: Option<bool>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Hotspot> for ApiHotspot {
    fn from(hotspot: Hotspot) -> Self {
        Self {
            id: hotspot.id,
            name: hotspot.name,
            lat: hotspot.latitude,
            lng: hotspot.longitude,
            country_code: hotspot.country_code,
            state_code: hotspot.state_code,
            county_code: hotspot.county_code,
            species: hotspot.species_total,
            open: hotspot.open_access,
            notes: hotspot.notes,
            updated_at: hotspot.updated_at,
        }
    }
}

/// One entry of the nearby endpoint: the hotspot fields plus `distance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiNearbyHotspot {
    /// The hotspot, flattened into the entry.
    #[serde(flatten)]
    pub hotspot: ApiHotspot,
    /// Great-circle distance from the query point in kilometers.
    pub distance: f64,
}

impl ApiNearbyHotspot {
    /// Pairs a hotspot with its distance.
    #[must_use]
    pub fn new(hotspot: Hotspot, distance_km: f64) -> Self {
        Self {
            hotspot: hotspot.into(),
            distance: distance_km,
        }
    }
}

/// Response of the within-bounds endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiWithinBounds {
    /// Hotspots inside the viewport.
    pub hotspots: Vec<ApiHotspot>,
    /// Number of entries in `hotspots`.
    pub count: usize,
}

impl From<Vec<Hotspot>> for ApiWithinBounds {
    fn from(hotspots: Vec<Hotspot>) -> Self {
        let hotspots: Vec<ApiHotspot> = hotspots.into_iter().map(Into::into).collect();
        Self {
            count: hotspots.len(),
            hotspots,
        }
    }
}

/// Query parameters for the nearby endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQueryParams {
    /// Search radius in kilometers.
    pub radius_km: f64,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Query parameters for the within-bounds endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BoundsQueryParams {
    /// Viewport as `west,south,east,north`.
    pub bounds: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of hotspots loaded.
    pub hotspots: usize,
}

/// Error body for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
}

impl ApiError {
    /// Wraps any displayable error.
    #[must_use]
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
