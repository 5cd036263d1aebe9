//! Forecaster - Future-year predictions per country
//!
//! The anchor is the latest observed year before the target year. The
//! model maps year t features to year t+1, so a target `h` years past
//! `anchor + 1` needs an extrapolated input vector:
//! - `RepeatLast`: the anchor vector unchanged
//! - `Trend`: anchor + h × (per-year change from the previous observed year)

use serde::{Deserialize, Serialize};

use super::artifact::TrainedModel;
use crate::error::{ClimateIndexError, Result};
use crate::logic::config::{ExtrapolationPolicy, ForecastConfig, PredictionTarget};
use crate::logic::features::layout::*;
use crate::logic::features::{EngineeredPanel, EngineeredRow, FeatureVector};
use crate::logic::index::IndexTable;

// ============================================================================
// OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryForecast {
    pub country: String,
    pub target_year: i32,
    pub anchor_year: i32,
    /// Years between anchor + 1 and the target
    pub horizon: i32,
    pub predicted: f64,
    /// Composite index of the anchor year, when indexed
    pub anchor_composite: Option<f64>,
    pub extrapolation: ExtrapolationPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    pub target_year: i32,
    pub target: PredictionTarget,
    pub model_id: String,
    pub validation_r2: f64,
    pub forecasts: Vec<CountryForecast>,
    /// Countries left out of the table, with the reason
    pub skipped: Vec<(String, String)>,
}

impl ForecastTable {
    pub fn get(&self, country: &str) -> Option<&CountryForecast> {
        self.forecasts.iter().find(|f| f.country == country)
    }

    /// Forecasts ordered from highest to lowest prediction
    pub fn ranked(&self) -> Vec<&CountryForecast> {
        let mut ranked: Vec<&CountryForecast> = self.forecasts.iter().collect();
        ranked.sort_by(|a, b| b.predicted.total_cmp(&a.predicted).then_with(|| a.country.cmp(&b.country)));
        ranked
    }
}

// ============================================================================
// EXTRAPOLATION
// ============================================================================

/// Input vector for a target `horizon` years past `anchor + 1`
pub fn extrapolate(
    anchor: &EngineeredRow,
    previous: Option<&EngineeredRow>,
    horizon: i32,
    policy: ExtrapolationPolicy,
) -> FeatureVector {
    let base = anchor.features.clone();
    let previous = match (policy, previous) {
        (ExtrapolationPolicy::Trend, Some(p)) if horizon > 0 => p,
        _ => return base,
    };

    let gap = (anchor.year - previous.year).max(1) as f64;
    let mut values = base.values;
    for (i, value) in values.iter_mut().enumerate() {
        let step = (anchor.features.values[i] - previous.features.values[i]) / gap;
        *value += horizon as f64 * step;
    }
    clamp_natural_bounds(&mut values);
    FeatureVector::from_values(values)
}

fn clamp_natural_bounds(values: &mut [f64; FEATURE_COUNT]) {
    for i in [
        IDX_COUNTRY_MEAN_IMPACT,
        IDX_IMPACT_LAG1,
        IDX_IMPACT_STD,
        IDX_LOG_TOTAL_AFFECTED,
        IDX_LOG_TOTAL_DEATH,
        IDX_LOG_AFFECTED_AVG,
        IDX_LOG_DEATH_AVG,
        IDX_ECONOMIC_DAMAGE,
    ] {
        values[i] = values[i].max(0.0);
    }
    values[IDX_HAZARD_COUNT] = values[IDX_HAZARD_COUNT].clamp(0.0, 4.0);
}

// ============================================================================
// FORECASTER
// ============================================================================

pub struct Forecaster<'a> {
    model: &'a TrainedModel,
    engineered: &'a EngineeredPanel,
    index: &'a IndexTable,
    config: ForecastConfig,
}

impl<'a> Forecaster<'a> {
    pub fn new(
        model: &'a TrainedModel,
        engineered: &'a EngineeredPanel,
        index: &'a IndexTable,
        config: ForecastConfig,
    ) -> Self {
        Self {
            model,
            engineered,
            index,
            config,
        }
    }

    pub fn forecast_country(&self, country: &str, target_year: i32) -> Result<CountryForecast> {
        if !self.model.knows_country(country) {
            return Err(ClimateIndexError::UnknownCountry {
                country: country.to_string(),
            });
        }

        let no_anchor = || ClimateIndexError::NoAnchor {
            country: country.to_string(),
            target_year,
        };
        let rows = self.engineered.country(country).ok_or_else(no_anchor)?;
        let position = rows.partition_point(|r| r.year < target_year);
        if position == 0 {
            return Err(no_anchor());
        }
        let anchor = &rows[position - 1];
        let previous = position.checked_sub(2).map(|i| &rows[i]);
        let horizon = target_year - anchor.year - 1;

        let vector = extrapolate(anchor, previous, horizon, self.config.extrapolation);
        let predicted = self.model.predict(&vector)?;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{} {} input: {}", country, target_year, vector.to_log_entry());
        }

        log::debug!(
            "{} {}: anchor {} (h = {}) -> {:.4}",
            country,
            target_year,
            anchor.year,
            horizon,
            predicted
        );

        Ok(CountryForecast {
            country: country.to_string(),
            target_year,
            anchor_year: anchor.year,
            horizon,
            predicted,
            anchor_composite: self.index.composite(country, anchor.year),
            extrapolation: self.config.extrapolation,
        })
    }

    /// Forecast every training country with enough recent history
    pub fn forecast_all(&self, target_year: i32) -> ForecastTable {
        let mut forecasts = Vec::new();
        let mut skipped = Vec::new();

        for country in &self.model.countries {
            if let Some(reason) = self.ineligibility(country, target_year) {
                log::info!("Skipping {} for {}: {}", country, target_year, reason);
                skipped.push((country.clone(), reason));
                continue;
            }
            match self.forecast_country(country, target_year) {
                Ok(forecast) => forecasts.push(forecast),
                Err(e) => {
                    log::warn!("Forecast failed for {}: {}", country, e);
                    skipped.push((country.clone(), e.to_string()));
                }
            }
        }

        log::info!(
            "Forecast {} countries for {} ({} skipped)",
            forecasts.len(),
            target_year,
            skipped.len()
        );
        ForecastTable {
            target_year,
            target: self.model.target,
            model_id: self.model.id.clone(),
            validation_r2: self.model.validation_r2(),
            forecasts,
            skipped,
        }
    }

    fn ineligibility(&self, country: &str, target_year: i32) -> Option<String> {
        let rows = match self.engineered.country(country) {
            Some(rows) => rows,
            None => return Some("no engineered history".to_string()),
        };

        let cutoff = self.model.trained_through;
        let history = rows.iter().filter(|r| r.year <= cutoff).count();
        if history < self.config.min_history_years {
            return Some(format!(
                "{} observed years through {}, need {}",
                history, cutoff, self.config.min_history_years
            ));
        }

        let anchor = rows.iter().rev().find(|r| r.year < target_year)?;
        let staleness = (target_year - 1) - anchor.year;
        if staleness > self.config.max_anchor_staleness {
            return Some(format!(
                "latest year {} is {} years stale (max {})",
                anchor.year, staleness, self.config.max_anchor_staleness
            ));
        }
        None
    }
}
