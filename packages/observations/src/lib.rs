#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Observation time-series aggregation.
//!
//! Raw observation data arrives as one row per (location, month, species)
//! carrying the number of observations of that species and the number of
//! checklists submitted at the location that month. [`build_series`]
//! reshapes those rows into a [`LocationSeries`] per location: a 12-slot
//! sample array shared by every species, plus a 12-slot observation array
//! per species.
//!
//! A month's sample count is a property of effort at the location, not of
//! the species, so the first value seen for a (location, month) slot is
//! kept and later rows never overwrite it. `None` means nobody sampled that
//! month, which is distinct from sampling and observing nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of monthly slots in every series.
pub const MONTHS: usize = 12;

/// Internal species identifier.
pub type SpeciesId = u32;

/// Per-location aggregation output, keyed by location id.
pub type SeriesMap = BTreeMap<String, LocationSeries>;

/// One raw observation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// External location (hotspot) id.
    pub location_id: String,
    /// Calendar month, 1-12.
    pub month: u8,
    /// Internal species id.
    pub species_id: SpeciesId,
    /// Observations of the species at the location in that month.
    pub obs: u32,
    /// Checklists submitted at the location in that month.
    pub samples: u32,
}

/// Errors raised while aggregating rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// A row's month is outside 1-12.
    #[error("row for location {location_id} has invalid month {month}")]
    InvalidMonth {
        /// Location of the offending row.
        location_id: String,
        /// The out-of-range month.
        month: u8,
    },
}

/// Monthly observation counts for one species at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesSeries {
    /// Internal species id.
    pub species_id: SpeciesId,
    /// Observations per month, January first. Zero where absent.
    pub obs: [u32; MONTHS],
}

impl SpeciesSeries {
    /// Returns `true` if the species was observed in any month.
    #[must_use]
    pub fn was_observed(&self) -> bool {
        self.obs.iter().any(|&n| n > 0)
    }
}

/// All series for one location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationSeries {
    samples: [Option<u32>; MONTHS],
    /// In first-seen order.
    species: Vec<SpeciesSeries>,
    #[serde(skip)]
    positions: BTreeMap<SpeciesId, usize>,
}

impl LocationSeries {
    /// Checklists submitted per month; `None` where nobody sampled.
    #[must_use]
    pub const fn samples(&self) -> &[Option<u32>; MONTHS] {
        &self.samples
    }

    /// Per-species series in the order species first appeared in the
    /// input rows.
    #[must_use]
    pub fn species(&self) -> &[SpeciesSeries] {
        &self.species
    }

    /// Monthly observations for one species.
    #[must_use]
    pub fn species_obs(&self, species_id: SpeciesId) -> Option<&[u32; MONTHS]> {
        self.positions
            .get(&species_id)
            .map(|&i| &self.species[i].obs)
    }

    /// Number of distinct species observed in any month.
    #[must_use]
    pub fn richness(&self) -> usize {
        self.species.iter().filter(|s| s.was_observed()).count()
    }

    fn record(&mut self, slot: usize, row: &ObservationRow) {
        match self.samples[slot] {
            None => self.samples[slot] = Some(row.samples),
            Some(existing) if existing != row.samples => {
                log::debug!(
                    "Location {} month {}: keeping sample count {existing}, ignoring {}",
                    row.location_id,
                    row.month,
                    row.samples
                );
            }
            Some(_) => {}
        }

        let position = *self.positions.entry(row.species_id).or_insert_with(|| {
            self.species.push(SpeciesSeries {
                species_id: row.species_id,
                obs: [0; MONTHS],
            });
            self.species.len() - 1
        });
        self.species[position].obs[slot] = row.obs;
    }
}

/// Builds per-location series from raw rows in a single pass.
///
/// Locations without rows never appear in the output.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidMonth`] if any row's month is outside
/// 1-12; no partial output is returned.
pub fn build_series(rows: &[ObservationRow]) -> Result<SeriesMap, AggregateError> {
    let mut series = SeriesMap::new();

    for row in rows {
        let slot = match row.month {
            1..=12 => usize::from(row.month) - 1,
            month => {
                return Err(AggregateError::InvalidMonth {
                    location_id: row.location_id.clone(),
                    month,
                });
            }
        };

        series
            .entry(row.location_id.clone())
            .or_default()
            .record(slot, row);
    }

    log::debug!(
        "Aggregated {} observation rows into {} location series",
        rows.len(),
        series.len()
    );

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(loc: &str, month: u8, species: SpeciesId, obs: u32, samples: u32) -> ObservationRow {
        ObservationRow {
            location_id: loc.to_string(),
            month,
            species_id: species,
            obs,
            samples,
        }
    }

    #[test]
    fn sample_count_is_shared_across_species() {
        let rows = vec![row("A", 1, 1, 5, 20), row("A", 1, 2, 1, 20)];
        let series = build_series(&rows).unwrap();
        let a = &series["A"];
        assert_eq!(a.samples()[0], Some(20));
        assert!(a.samples()[1..].iter().all(Option::is_none));
        assert_eq!(a.species_obs(1).unwrap()[0], 5);
        assert_eq!(a.species_obs(2).unwrap()[0], 1);
    }

    #[test]
    fn first_sample_value_wins() {
        let rows = vec![row("A", 3, 1, 5, 20), row("A", 3, 2, 1, 99)];
        let series = build_series(&rows).unwrap();
        assert_eq!(series["A"].samples()[2], Some(20));
    }

    #[test]
    fn sampled_month_without_observations_is_zero_not_none() {
        let rows = vec![row("A", 6, 7, 0, 4)];
        let series = build_series(&rows).unwrap();
        assert_eq!(series["A"].samples()[5], Some(4));
        assert_eq!(series["A"].species_obs(7).unwrap(), &[0; MONTHS]);
        assert_eq!(series["A"].richness(), 0);
    }

    #[test]
    fn species_keep_first_seen_order() {
        let rows = vec![
            row("A", 1, 30, 1, 5),
            row("A", 1, 10, 1, 5),
            row("A", 2, 20, 1, 6),
            row("A", 2, 30, 4, 6),
        ];
        let series = build_series(&rows).unwrap();
        let ids: Vec<SpeciesId> = series["A"].species().iter().map(|s| s.species_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(series["A"].species_obs(30).unwrap()[..2], [1, 4]);
        assert_eq!(series["A"].richness(), 3);
    }

    #[test]
    fn locations_without_rows_are_absent() {
        let series = build_series(&[row("A", 1, 1, 1, 1)]).unwrap();
        assert!(series.contains_key("A"));
        assert!(!series.contains_key("B"));
        assert!(build_series(&[]).unwrap().is_empty());
    }

    #[test]
    fn rejects_out_of_range_month() {
        let err = build_series(&[row("A", 1, 1, 1, 1), row("B", 13, 1, 1, 1)]).unwrap_err();
        assert_eq!(
            err,
            AggregateError::InvalidMonth {
                location_id: "B".to_string(),
                month: 13,
            }
        );
        assert!(build_series(&[row("A", 0, 1, 1, 1)]).is_err());
    }

    #[test]
    fn rebuilding_is_byte_identical() {
        let rows = vec![
            row("B", 12, 3, 2, 8),
            row("A", 1, 1, 5, 20),
            row("A", 4, 2, 1, 11),
            row("B", 1, 1, 9, 3),
        ];
        let first = serde_json::to_vec(&build_series(&rows).unwrap()).unwrap();
        let second = serde_json::to_vec(&build_series(&rows).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
