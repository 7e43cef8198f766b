#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI for generating per-region offline hotspot packs.
//!
//! Reads the pack list from a TOML config, fetches each region from the
//! eBird API with mandatory pacing, and writes `{region}.json.gz`,
//! `packs.json.gz` and `pack_records.json` into the output directory.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hotspot_map_cli_utils::{RegionProgress, init_logger};
use hotspot_map_database::{HotspotStore, paths};
use hotspot_map_generate::SyncOrchestrator;
use hotspot_map_generate::clock::TokioClock;
use hotspot_map_generate::config::GenerateConfig;
use hotspot_map_source::dataset::ObservationDataset;
use hotspot_map_source::ebird::{API_KEY_ENV, EbirdClient};

#[derive(Parser)]
#[command(name = "hotspot_map_generate", about = "Offline pack generator")]
struct Cli {
    /// Path to the generator config.
    #[arg(long, default_value = "packs.toml")]
    config: PathBuf,

    /// Only generate these regions (comma-separated codes).
    #[arg(long, value_delimiter = ',')]
    regions: Vec<String>,

    /// Override the configured output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let mut config = GenerateConfig::load(&cli.config)?;
    config.retain_regions(&cli.regions);
    if config.packs.is_empty() {
        log::warn!("No packs to generate");
        return Ok(());
    }

    let api_key = std::env::var(API_KEY_ENV)
        .map_err(|_| format!("{API_KEY_ENV} must be set to call the eBird API"))?;
    let source = EbirdClient::new(api_key)?;

    let output_dir = cli
        .output_dir
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(paths::packs_dir);
    paths::ensure_dir(&output_dir)?;

    let dataset_dir = config
        .dataset_dir
        .clone()
        .unwrap_or_else(paths::dataset_dir);
    let dataset = ObservationDataset::load(&dataset_dir)?;

    log::info!(
        "Generating {} packs (version {}) into {}",
        config.packs.len(),
        config.version,
        output_dir.display()
    );

    let orchestrator = SyncOrchestrator::new(
        config,
        output_dir,
        Arc::new(source),
        Arc::new(TokioClock),
        dataset,
        Arc::new(HotspotStore::new()),
    )
    .with_progress(RegionProgress::regions_bar(&multi));

    let summary = orchestrator.run().await?;

    if summary.is_success() {
        log::info!("{summary}");
        Ok(())
    } else {
        log::error!("{summary}");
        Err(format!("{} regions failed", summary.failed.len()).into())
    }
}
