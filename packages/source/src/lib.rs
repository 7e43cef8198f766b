#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Upstream data sources for pack generation.
//!
//! [`HotspotSource`] is the contract the batch loop depends on: a
//! region-scoped hotspot listing plus a region bounds/centroid lookup.
//! [`ebird::EbirdClient`] implements it over HTTP. The observation dataset
//! is a set of local CSV files loaded by [`dataset::ObservationDataset`].

pub mod dataset;
pub mod ebird;
pub mod progress;

use async_trait::async_trait;
use hotspot_map_hotspot_models::RegionCode;
use hotspot_map_source_models::{RegionInfo, UpstreamHotspot};

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A provider of region-scoped hotspot data.
///
/// Implementations make exactly one upstream call per method invocation
/// and never retry; pacing between calls is the caller's job.
#[async_trait]
pub trait HotspotSource: Send + Sync {
    /// Looks up a region's display name, bounds and centroid.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or response parsing fails.
    async fn region_info(&self, region: &RegionCode) -> Result<RegionInfo, SourceError>;

    /// Lists every hotspot in a region.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or response parsing fails.
    async fn hotspots(&self, region: &RegionCode) -> Result<Vec<UpstreamHotspot>, SourceError>;
}
