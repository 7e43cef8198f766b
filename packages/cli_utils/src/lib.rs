#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the hotspot map toolchain.
//!
//! [`RegionProgress`] renders [`SyncProgress`] events as an `indicatif`
//! bar, and [`init_logger`] routes `log` output through
//! `indicatif-log-bridge` so log lines do not tear the bar.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hotspot_map_source::progress::SyncProgress;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// An `indicatif` bar counting processed regions.
pub struct RegionProgress {
    bar: ProgressBar,
    bar_style: ProgressStyle,
    failed: AtomicU64,
}

impl RegionProgress {
    /// Creates a bar that spins until [`SyncProgress::start`] reports the
    /// region count.
    #[must_use]
    pub fn regions_bar(multi: &MultiProgress) -> Arc<dyn SyncProgress> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Preparing regions");

        let bar_style = ProgressStyle::with_template(
            "{msg:<12} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Arc::new(Self {
            bar,
            bar_style,
            failed: AtomicU64::new(0),
        })
    }
}

impl SyncProgress for RegionProgress {
    fn start(&self, regions: u64) {
        self.bar.set_length(regions);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
    }

    fn region_started(&self, region: &str) {
        self.bar.set_message(region.to_string());
    }

    fn region_finished(&self, _region: &str, succeeded: bool) {
        if !succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.bar.inc(1);
    }

    fn finish(&self, summary: &str) {
        let failed = self.failed.load(Ordering::Relaxed);
        if failed == 0 {
            self.bar.finish_with_message(summary.to_string());
        } else {
            self.bar
                .abandon_with_message(format!("{summary} ({failed} failed)"));
        }
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already set when called twice (e.g. in tests).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
