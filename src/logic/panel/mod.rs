//! Panel Module - Country-Year Hazard Table
//!
//! Holds the cleaned input supplied by the hazard metric loader.
//!
//! # Architecture
//! - `types.rs`: `Hazard`, `HazardMetrics`, `Observation`
//! - `storage.rs`: JSONL loading
//!
//! Invariant: at most one observation per (country, year), rows of a country
//! sorted by year.

pub mod types;
pub mod storage;

use std::collections::BTreeMap;

use crate::error::{ClimateIndexError, Result};

pub use types::{Hazard, HazardMetrics, Observation};

#[derive(Debug, Clone, Default)]
pub struct Panel {
    countries: BTreeMap<String, Vec<Observation>>,
}

impl Panel {
    /// Build a panel, rejecting duplicate (country, year) rows
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let mut countries: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
        for obs in observations {
            countries.entry(obs.country.clone()).or_default().push(obs);
        }

        for (country, rows) in countries.iter_mut() {
            rows.sort_by_key(|o| o.year);
            if let Some(pair) = rows.windows(2).find(|w| w[0].year == w[1].year) {
                return Err(ClimateIndexError::DuplicateObservation {
                    country: country.clone(),
                    year: pair[0].year,
                });
            }
        }

        Ok(Self { countries })
    }

    /// Drop aggregate entities (continents, income groups, ...)
    pub fn without_entities<S: AsRef<str>>(mut self, excluded: &[S]) -> Self {
        for name in excluded {
            if self.countries.remove(name.as_ref()).is_some() {
                log::debug!("Excluded aggregate entity '{}'", name.as_ref());
            }
        }
        self
    }

    /// Countries in code order, each with year-sorted rows
    pub fn countries(&self) -> impl Iterator<Item = (&str, &[Observation])> {
        self.countries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn country(&self, code: &str) -> Option<&[Observation]> {
        self.countries.get(code).map(|v| v.as_slice())
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.countries.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.countries.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    /// (first, last) observed year across all countries
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let years = self.observations().map(|o| o.year);
        let (min, max) = years.fold((i32::MAX, i32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
        if self.is_empty() {
            None
        } else {
            Some((min, max))
        }
    }
}
