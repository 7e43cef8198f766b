//! Generator configuration loaded from TOML.
//!
//! ```toml
//! version = "2025-03"
//! output_dir = "data/packs"
//!
//! [rate_limit]
//! hotspot_delay_ms = 1000
//! region_delay_ms = 3000
//!
//! [[packs]]
//! id = 1
//! region = "US-CA"
//! name = "California"
//! center = { lat = 37.2, lng = -119.5 }
//! ```

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hotspot_map_hotspot_models::{RegionCode, coordinates_in_range};
use hotspot_map_spatial::LatLng;
use serde::Deserialize;

/// Default delay before a hotspot listing call.
pub const DEFAULT_HOTSPOT_DELAY_MS: u64 = 1000;

/// Default delay before a region-info call.
pub const DEFAULT_REGION_DELAY_MS: u64 = 3000;

/// Accepted range for `region_delay_ms`.
pub const REGION_DELAY_RANGE_MS: RangeInclusive<u64> = 3000..=10_000;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but violates a constraint.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Inter-call delays for the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    /// Minimum spacing before each hotspot listing call.
    pub hotspot_delay_ms: u64,
    /// Minimum spacing before each region-info call.
    pub region_delay_ms: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            hotspot_delay_ms: DEFAULT_HOTSPOT_DELAY_MS,
            region_delay_ms: DEFAULT_REGION_DELAY_MS,
        }
    }
}

impl RateLimit {
    /// Spacing before a hotspot listing call.
    #[must_use]
    pub const fn hotspot_delay(&self) -> Duration {
        Duration::from_millis(self.hotspot_delay_ms)
    }

    /// Spacing before a region-info call.
    #[must_use]
    pub const fn region_delay(&self) -> Duration {
        Duration::from_millis(self.region_delay_ms)
    }
}

/// Operator-supplied pack center.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CenterOverride {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl From<CenterOverride> for LatLng {
    fn from(center: CenterOverride) -> Self {
        Self::new(center.lat, center.lng)
    }
}

/// One pack to generate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackConfig {
    /// Stable pack id published in the index.
    pub id: u32,
    /// Region the pack covers.
    pub region: RegionCode,
    /// Display name.
    pub name: String,
    /// Optional center override.
    #[serde(default)]
    pub center: Option<CenterOverride>,
}

/// Top-level generator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateConfig {
    /// Dataset version tag embedded in every pack and index entry.
    pub version: String,
    /// Where packs are written. Defaults to `data/packs`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Where the observation CSVs live. Defaults to `data/observations`.
    #[serde(default)]
    pub dataset_dir: Option<PathBuf>,
    /// Upstream pacing.
    #[serde(default)]
    pub rate_limit: RateLimit,
    /// Packs to generate, in order.
    #[serde(default)]
    pub packs: Vec<PackConfig>,
}

impl GenerateConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if the TOML is malformed
    /// * [`ConfigError::Invalid`] if a constraint is violated
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if the file cannot be read
    /// * Any error from [`Self::from_toml_str`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid("version must not be empty".to_string()));
        }

        if !REGION_DELAY_RANGE_MS.contains(&self.rate_limit.region_delay_ms) {
            return Err(ConfigError::Invalid(format!(
                "region_delay_ms must be within {}..={}, got {}",
                REGION_DELAY_RANGE_MS.start(),
                REGION_DELAY_RANGE_MS.end(),
                self.rate_limit.region_delay_ms
            )));
        }

        let mut ids = BTreeSet::new();
        let mut regions = BTreeSet::new();
        for pack in &self.packs {
            if !ids.insert(pack.id) {
                return Err(ConfigError::Invalid(format!("duplicate pack id {}", pack.id)));
            }
            if !regions.insert(pack.region.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pack region {}",
                    pack.region
                )));
            }
            if let Some(center) = pack.center
                && !coordinates_in_range(center.lat, center.lng)
            {
                return Err(ConfigError::Invalid(format!(
                    "center of {} is out of range: ({}, {})",
                    pack.region, center.lat, center.lng
                )));
            }
        }

        Ok(())
    }

    /// Keeps only packs whose region is in `regions`. An empty filter
    /// keeps everything. Unknown regions in the filter are logged.
    pub fn retain_regions(&mut self, regions: &[String]) {
        if regions.is_empty() {
            return;
        }

        for region in regions {
            if !self.packs.iter().any(|p| p.region.as_str() == region) {
                log::warn!("--regions: {region} is not configured, ignoring");
            }
        }

        self.packs
            .retain(|p| regions.iter().any(|r| r == p.region.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
version = "2025-03"

[rate_limit]
hotspot_delay_ms = 1500

[[packs]]
id = 1
region = "US-CA"
name = "California"

[[packs]]
id = 2
region = "US-NV"
name = "Nevada"
center = { lat = 39.0, lng = -117.0 }
"#;

    #[test]
    fn parses_with_defaults() {
        let config = GenerateConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.version, "2025-03");
        assert_eq!(config.rate_limit.hotspot_delay_ms, 1500);
        assert_eq!(config.rate_limit.region_delay_ms, DEFAULT_REGION_DELAY_MS);
        assert_eq!(config.packs.len(), 2);
        assert_eq!(config.packs[0].region.as_str(), "US-CA");
        assert!(config.packs[0].center.is_none());
        assert_eq!(
            config.packs[1].center.map(LatLng::from),
            Some(LatLng::new(39.0, -117.0))
        );
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn rejects_region_delay_out_of_range() {
        let toml_str = "version = \"v\"\n[rate_limit]\nregion_delay_ms = 500\n";
        assert!(matches!(
            GenerateConfig::from_toml_str(toml_str),
            Err(ConfigError::Invalid(_))
        ));
        let toml_str = "version = \"v\"\n[rate_limit]\nregion_delay_ms = 10000\n";
        assert!(GenerateConfig::from_toml_str(toml_str).is_ok());
    }

    #[test]
    fn rejects_duplicates_and_bad_codes() {
        let dup = r#"
version = "v"
[[packs]]
id = 1
region = "US-CA"
name = "a"
[[packs]]
id = 1
region = "US-NV"
name = "b"
"#;
        assert!(matches!(
            GenerateConfig::from_toml_str(dup),
            Err(ConfigError::Invalid(_))
        ));

        let bad_code = "version = \"v\"\n[[packs]]\nid = 1\nregion = \"US--CA\"\nname = \"a\"\n";
        assert!(matches!(
            GenerateConfig::from_toml_str(bad_code),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn retains_requested_regions() {
        let mut config = GenerateConfig::from_toml_str(CONFIG).unwrap();
        config.retain_regions(&["US-NV".to_string(), "MX".to_string()]);
        assert_eq!(config.packs.len(), 1);
        assert_eq!(config.packs[0].id, 2);

        let mut all = GenerateConfig::from_toml_str(CONFIG).unwrap();
        all.retain_regions(&[]);
        assert_eq!(all.packs.len(), 2);
    }
}
