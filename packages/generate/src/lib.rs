#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch generation of per-region offline packs.
//!
//! [`SyncOrchestrator::run`] walks the configured regions one at a time.
//! For each region it fetches region info and the hotspot listing from the
//! upstream (paced by [`clock::Pacer`]), upserts the hotspots into the
//! [`HotspotStore`], aggregates the region's observation rows, assembles
//! the pack and writes it. A failing region is logged and recorded in the
//! [`RunSummary`]; the batch moves on. Nothing is retried.
//!
//! The pack index is the previous index with every successful region's
//! entry replaced, so a failed region keeps its last good pack.

pub mod clock;
pub mod config;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotspot_map_database::{HotspotStore, StoreError};
use hotspot_map_hotspot_models::RegionCode;
use hotspot_map_observations::{AggregateError, build_series};
use hotspot_map_pack::artifact::{read_index, read_records, write_index, write_pack, write_records};
use hotspot_map_pack::{ArtifactError, AssembleError, PackLookups, RegionPackInput, assemble_region};
use hotspot_map_pack_models::{PackMetadata, PackRecord};
use hotspot_map_source::dataset::ObservationDataset;
use hotspot_map_source::progress::{SyncProgress, null_progress};
use hotspot_map_source::{HotspotSource, SourceError};
use hotspot_map_source_models::UpstreamHotspot;
use hotspot_map_spatial::{BoundingBox, LatLng};

use crate::clock::{CallKind, Clock, Pacer};
use crate::config::{GenerateConfig, PackConfig};

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Upstream request failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Hotspot store rejected a write.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Observation rows were malformed.
    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// Pack assembly failed.
    #[error("Assembly error: {0}")]
    Assemble(#[from] AssembleError),

    /// Reading or writing an artifact failed.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A region that could not be generated in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFailure {
    /// Region code.
    pub region: String,
    /// Error message.
    pub message: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Regions whose pack and index entry were written.
    pub succeeded: Vec<String>,
    /// Regions that failed, with their errors.
    pub failed: Vec<RegionFailure>,
}

impl RunSummary {
    /// Returns `true` if no region failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        )?;
        for failure in &self.failed {
            write!(f, "\n  {}: {}", failure.region, failure.message)?;
        }
        Ok(())
    }
}

struct RegionOutput {
    metadata: PackMetadata,
    record: PackRecord,
}

/// Runs the region batch.
pub struct SyncOrchestrator {
    config: GenerateConfig,
    output_dir: PathBuf,
    source: Arc<dyn HotspotSource>,
    clock: Arc<dyn Clock>,
    dataset: ObservationDataset,
    store: Arc<HotspotStore>,
    progress: Arc<dyn SyncProgress>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator writing into `output_dir`.
    #[must_use]
    pub fn new(
        config: GenerateConfig,
        output_dir: PathBuf,
        source: Arc<dyn HotspotSource>,
        clock: Arc<dyn Clock>,
        dataset: ObservationDataset,
        store: Arc<HotspotStore>,
    ) -> Self {
        Self {
            config,
            output_dir,
            source,
            clock,
            dataset,
            store,
            progress: null_progress(),
        }
    }

    /// Reports progress to `progress` instead of discarding it.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn SyncProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Directory packs are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generates every configured region in order.
    ///
    /// Per-region failures are collected into the summary. The index and
    /// pack records are merged with the previous run's and written once at
    /// the end.
    ///
    /// # Errors
    ///
    /// * If the output directory cannot be created
    /// * If the previous index or records exist but cannot be read
    /// * If the merged index or records cannot be written
    pub async fn run(&self) -> Result<RunSummary, GenerateError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut index = read_index(&self.output_dir)?;
        let mut records = read_records(&self.output_dir)?;
        let mut pacer = Pacer::new(Arc::clone(&self.clock), self.config.rate_limit);
        let mut summary = RunSummary::default();

        self.progress
            .start(u64::try_from(self.config.packs.len()).unwrap_or(u64::MAX));

        for pack in &self.config.packs {
            let region = pack.region.to_string();
            self.progress.region_started(&region);

            match self.generate_region(pack, &mut pacer).await {
                Ok(output) => {
                    index.upsert(output.metadata);
                    records.upsert(output.record);
                    summary.succeeded.push(region.clone());
                    self.progress.region_finished(&region, true);
                }
                Err(e) => {
                    log::error!("{region}: {e}");
                    summary.failed.push(RegionFailure {
                        region: region.clone(),
                        message: e.to_string(),
                    });
                    self.progress.region_finished(&region, false);
                }
            }
        }

        write_index(&self.output_dir, &index)?;
        write_records(&self.output_dir, &records)?;

        log::info!("Generation finished: {summary}");
        self.progress.finish(&format!(
            "{} of {} regions generated",
            summary.succeeded.len(),
            self.config.packs.len()
        ));

        Ok(summary)
    }

    /// Upserts a region's upstream hotspots into the store. Entries with
    /// bad region codes or coordinates are skipped.
    fn store_hotspots(&self, region: &RegionCode, upstream: Vec<UpstreamHotspot>) -> usize {
        let now = self.clock.now();
        let mut stored = 0;

        for entry in upstream {
            let loc_id = entry.loc_id.clone();
            let hotspot = match entry.into_hotspot(now) {
                Ok(hotspot) => hotspot,
                Err(e) => {
                    log::warn!("{region}: skipping {loc_id}: {e}");
                    continue;
                }
            };
            match self.store.upsert(hotspot) {
                Ok(_) => stored += 1,
                Err(e) => log::warn!("{region}: skipping {loc_id}: {e}"),
            }
        }

        stored
    }

    async fn generate_region(
        &self,
        pack: &PackConfig,
        pacer: &mut Pacer,
    ) -> Result<RegionOutput, GenerateError> {
        let region = &pack.region;

        pacer.pace(CallKind::RegionInfo).await;
        let info = self.source.region_info(region).await?;

        pacer.pace(CallKind::Hotspots).await;
        let upstream = self.source.hotspots(region).await?;
        let fetched = upstream.len();
        let stored = self.store_hotspots(region, upstream);
        let synced_at = self.clock.now();

        let hotspots = self.store.in_region(region);
        log::info!(
            "{region} ({}): {fetched} fetched, {stored} stored, {} in region",
            info.name,
            hotspots.len()
        );

        let location_ids: BTreeSet<&str> = hotspots.iter().map(|h| h.id.as_str()).collect();
        let series = build_series(&self.dataset.rows_for(&location_ids))?;

        let assembled = assemble_region(&RegionPackInput {
            region,
            version: &self.config.version,
            hotspots: &hotspots,
            series: &series,
            lookups: PackLookups {
                species_codes: self.dataset.species_codes(),
                region_names: self.dataset.region_names(),
            },
            upstream_bounds: info
                .bounds
                .map(|b| BoundingBox::new(b.min_x, b.min_y, b.max_x, b.max_y)),
            upstream_centroid: info.centroid.map(|c| LatLng::new(c.lat, c.lng)),
            custom_center: pack.center.map(LatLng::from),
        })?;

        let size = write_pack(&self.output_dir, region.as_str(), &assembled.data)?;

        Ok(RegionOutput {
            metadata: assembled.metadata(pack.id, region, &pack.name, size, self.clock.now()),
            record: assembled.record(pack.id, region, &pack.name, synced_at),
        })
    }
}
