#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Per-region offline pack assembly.
//!
//! [`assemble`] turns a region's hotspots and aggregated observation
//! series into a [`PackData`](hotspot_map_pack_models::PackData) body.
//! [`region::assemble_region`] adds region geometry (bounds, center) and
//! cluster markers on top. [`artifact`] writes the results as
//! gzip-compressed JSON, atomically.

pub mod artifact;
pub mod assemble;
pub mod region;

pub use artifact::ArtifactError;
pub use assemble::{AssembleError, PackLookups, assemble};
pub use region::{AssembledPack, RegionGeometry, RegionPackInput, assemble_region};
