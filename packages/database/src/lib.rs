#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hotspot storage for the hotspot map.
//!
//! [`HotspotStore`] owns the hotspot table and the
//! [`SpatialIndex`](hotspot_map_spatial::SpatialIndex) over it. Every write
//! that touches coordinates updates the index under the same write lock,
//! so readers never observe a hotspot whose index entry is stale.

pub mod loader;
pub mod paths;
pub mod store;

pub use loader::{load_packs, unindexed_packs};
pub use store::{HotspotStore, NearbyHotspot};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No hotspot with the given external id exists.
    #[error("Hotspot not found: {0}")]
    NotFound(String),

    /// A hotspot with the given external id already exists.
    #[error("Hotspot already exists: {0}")]
    Duplicate(String),

    /// Coordinates outside the WGS84 range.
    #[error("Invalid coordinates for {id}: ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// External hotspot id.
        id: String,
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },

    /// A pack stored on disk could not be loaded.
    #[error("Pack load error: {0}")]
    Artifact(#[from] hotspot_map_pack::ArtifactError),

    /// A stored region code could not be parsed.
    #[error("Invalid region code: {0}")]
    RegionCode(#[from] hotspot_map_hotspot_models::InvalidRegionCode),
}
