#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hotspot and region hierarchy types.
//!
//! A [`Hotspot`] is a named, geolocated birding site. Hotspots belong to a
//! region hierarchy (country, state, county) identified by dash-delimited
//! codes such as `US-CA-037`; [`RegionCode`] parses those codes and answers
//! ancestry questions without a database join.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Separator between region code segments.
const REGION_SEPARATOR: char = '-';

/// Returns `true` if the coordinate pair is finite and inside WGS84 range
/// (latitude in `[-90, 90]`, longitude in `[-180, 180]`).
#[must_use]
pub fn coordinates_in_range(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Depth of a region in the hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegionLevel {
    /// Top-level region, e.g. `US`.
    Country = 1,
    /// First subdivision, e.g. `US-CA`.
    State = 2,
    /// Second subdivision, e.g. `US-CA-037`.
    County = 3,
}

impl RegionLevel {
    /// Returns the number of code segments at this level.
    #[must_use]
    pub const fn depth(self) -> usize {
        self as usize
    }

    const fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(Self::Country),
            2 => Some(Self::State),
            3 => Some(Self::County),
            _ => None,
        }
    }
}

/// Error returned when a string is not a valid region code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid region code '{code}': {reason}")]
pub struct InvalidRegionCode {
    /// The rejected input.
    pub code: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// A hierarchical region code such as `US`, `US-CA` or `US-CA-037`.
///
/// Prefix segments denote ancestor regions, so `US-CA` contains
/// `US-CA-037` and is contained by `US`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Parses a region code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRegionCode`] if the code is empty, has an empty
    /// segment, or has more than three segments.
    pub fn parse(code: &str) -> Result<Self, InvalidRegionCode> {
        let code = code.trim();
        if code.is_empty() {
            return Err(InvalidRegionCode {
                code: code.to_string(),
                reason: "empty",
            });
        }

        let segments: Vec<&str> = code.split(REGION_SEPARATOR).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(InvalidRegionCode {
                code: code.to_string(),
                reason: "empty segment",
            });
        }
        if RegionLevel::from_depth(segments.len()).is_none() {
            return Err(InvalidRegionCode {
                code: code.to_string(),
                reason: "more than three segments",
            });
        }

        Ok(Self(code.to_string()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the level derived from the segment count.
    #[must_use]
    pub fn level(&self) -> RegionLevel {
        let depth = self.0.split(REGION_SEPARATOR).count();
        // Depth is validated in `parse`.
        RegionLevel::from_depth(depth).unwrap_or(RegionLevel::County)
    }

    /// Returns the code truncated to `level`, or `None` if this code is
    /// shallower than `level`.
    #[must_use]
    pub fn at_level(&self, level: RegionLevel) -> Option<Self> {
        if level > self.level() {
            return None;
        }
        let truncated: Vec<&str> = self
            .0
            .split(REGION_SEPARATOR)
            .take(level.depth())
            .collect();
        Some(Self(truncated.join("-")))
    }

    /// Returns the country code (first segment).
    #[must_use]
    pub fn country(&self) -> Self {
        self.at_level(RegionLevel::Country)
            .unwrap_or_else(|| self.clone())
    }

    /// Returns the state code, if this code is at state level or deeper.
    #[must_use]
    pub fn state(&self) -> Option<Self> {
        self.at_level(RegionLevel::State)
    }

    /// Returns the immediate parent region, or `None` for a country.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.level() {
            RegionLevel::Country => None,
            RegionLevel::State => self.at_level(RegionLevel::Country),
            RegionLevel::County => self.at_level(RegionLevel::State),
        }
    }

    /// Returns all strict ancestors, outermost first.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(code) = current {
            current = code.parent();
            out.push(code);
        }
        out.reverse();
        out
    }

    /// Returns `true` if `other` is this region or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other == self || other.ancestors().contains(self)
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionCode {
    type Err = InvalidRegionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RegionCode {
    type Error = InvalidRegionCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

/// A birding hotspot as held by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Stable external identifier (e.g. `L1234567`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Country code, e.g. `US`.
    pub country_code: RegionCode,
    /// State code, e.g. `US-CA`.
    pub state_code: RegionCode,
    /// County code, e.g. `US-CA-037`. Some hotspots have none.
    pub county_code: Option<RegionCode>,
    /// Lifetime species total reported upstream.
    pub species_total: u32,
    /// Whether the site is open to the public (`None` = unknown).
    pub open_access: Option<bool>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the hotspot was first stored.
    pub created_at: DateTime<Utc>,
    /// When the hotspot was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Hotspot {
    /// Returns the most specific region code this hotspot carries.
    #[must_use]
    pub fn region_code(&self) -> &RegionCode {
        self.county_code.as_ref().unwrap_or(&self.state_code)
    }

    /// Returns `true` if the hotspot lies inside `region` according to its
    /// region codes.
    #[must_use]
    pub fn is_in_region(&self, region: &RegionCode) -> bool {
        region.contains(self.region_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> RegionCode {
        RegionCode::parse(s).unwrap()
    }

    #[test]
    fn derives_level_from_segment_count() {
        assert_eq!(code("US").level(), RegionLevel::Country);
        assert_eq!(code("US-CA").level(), RegionLevel::State);
        assert_eq!(code("US-CA-037").level(), RegionLevel::County);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(RegionCode::parse("").is_err());
        assert!(RegionCode::parse("US--037").is_err());
        assert!(RegionCode::parse("US-CA-037-X").is_err());
        assert!(RegionCode::parse("-CA").is_err());
    }

    #[test]
    fn lists_ancestors_outermost_first() {
        let ancestors = code("US-CA-037").ancestors();
        assert_eq!(ancestors, vec![code("US"), code("US-CA")]);
        assert!(code("US").ancestors().is_empty());
    }

    #[test]
    fn containment_respects_segment_boundaries() {
        assert!(code("US").contains(&code("US-CA-037")));
        assert!(code("US-CA").contains(&code("US-CA")));
        assert!(!code("US-C").contains(&code("US-CA")));
        assert!(!code("US-CA-037").contains(&code("US-CA")));
    }

    #[test]
    fn truncates_to_requested_level() {
        let county = code("MX-ROO-001");
        assert_eq!(county.country(), code("MX"));
        assert_eq!(county.state(), Some(code("MX-ROO")));
        assert_eq!(code("MX").state(), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&code("US-CA")).unwrap();
        assert_eq!(json, "\"US-CA\"");
        let back: RegionCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code("US-CA"));
        assert!(serde_json::from_str::<RegionCode>("\"US--X\"").is_err());
    }

    #[test]
    fn coordinate_range_check() {
        assert!(coordinates_in_range(90.0, -180.0));
        assert!(!coordinates_in_range(90.1, 0.0));
        assert!(!coordinates_in_range(0.0, 180.5));
        assert!(!coordinates_in_range(f64::NAN, 0.0));
    }
}
