#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geospatial core for hotspot lookups.
//!
//! - [`geo_math`]: great-circle distance, the planar pre-filter helpers and
//!   antimeridian-safe bounding boxes.
//! - [`index`]: an R-tree over hotspot coordinates keyed by row id.
//! - [`proximity`]: two-phase (index filter, then distance refine)
//!   "nearby" and viewport queries.
//! - [`cluster`]: greedy farthest-point (k-center) reduction of a point
//!   set to map cluster markers.
//! - [`query`]: validated query parameters. Invalid input is rejected
//!   here, before any index work happens.

pub mod cluster;
pub mod geo_math;
pub mod index;
pub mod proximity;
pub mod query;

pub use cluster::{ClusterCenter, build_clusters, desired_clusters};
pub use geo_math::{BoundingBox, LatLng, haversine_km, make_bounds};
pub use index::{IndexEntry, RowId, SpatialIndex};
pub use proximity::{NearbyHit, nearby, within_bounds};
pub use query::{BoundsQuery, NearbyQuery, QueryError};
