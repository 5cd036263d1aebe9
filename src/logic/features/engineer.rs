//! Feature Engineer - Panel to per-anchor feature vectors
//!
//! Produces one `FeatureVector` for every observed (country, year).
//! Fallbacks for short histories:
//! - rolling means average whatever the calendar window holds
//! - baseline and long-run mean fall back to the current value in the
//!   first observed year
//! - lag falls back to the baseline when the previous year is missing
//! - slopes and std are 0.0 with fewer than two points
//! - a year with no recorded events scores the zero-event impact

use std::collections::BTreeMap;

use super::hazard::HazardScaler;
use super::history::{mean, ols_slope, previous_year, prior_mean, sample_std, trailing_window};
use super::layout::*;
use super::vector::FeatureVector;
use crate::logic::config::WindowConfig;
use crate::logic::panel::{Hazard, Observation, Panel};

// ============================================================================
// ENGINEERED PANEL
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredRow {
    pub year: i32,
    pub features: FeatureVector,
    /// Climate impact index shifted so the panel minimum is zero
    pub impact_rebased: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EngineeredPanel {
    countries: BTreeMap<String, Vec<EngineeredRow>>,
    scaler: HazardScaler,
    impact_floor: f64,
}

impl EngineeredPanel {
    pub fn countries(&self) -> impl Iterator<Item = (&str, &[EngineeredRow])> {
        self.countries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn country(&self, code: &str) -> Option<&[EngineeredRow]> {
        self.countries.get(code).map(|v| v.as_slice())
    }

    /// Every row with its country, countries in code order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &EngineeredRow)> {
        self.countries
            .iter()
            .flat_map(|(k, rows)| rows.iter().map(move |r| (k.as_str(), r)))
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

    pub fn last_year(&self) -> Option<i32> {
        self.rows().map(|(_, r)| r.year).max()
    }

    pub fn scaler(&self) -> &HazardScaler {
        &self.scaler
    }

    /// Panel minimum of the raw climate impact index
    pub fn impact_floor(&self) -> f64 {
        self.impact_floor
    }
}

// ============================================================================
// FEATURE ENGINEER
// ============================================================================

/// Current-year quantities derived straight from one observation
struct YearSummary {
    year: i32,
    hazard_impacts: [Option<f64>; 4],
    impact: f64,
    total_affected: f64,
    total_deaths: f64,
    hazard_count: usize,
    economic_damage: f64,
}

pub struct FeatureEngineer {
    windows: WindowConfig,
}

impl FeatureEngineer {
    pub fn new(windows: WindowConfig) -> Self {
        Self { windows }
    }

    pub fn engineer(&self, panel: &Panel) -> EngineeredPanel {
        let scaler = HazardScaler::fit(panel);

        let summaries: BTreeMap<&str, Vec<YearSummary>> = panel
            .countries()
            .map(|(code, rows)| (code, rows.iter().map(|o| summarize(&scaler, o)).collect()))
            .collect();

        let impact_floor = summaries
            .values()
            .flatten()
            .map(|s| s.impact)
            .reduce(f64::min)
            .unwrap_or(0.0);

        let countries: BTreeMap<String, Vec<EngineeredRow>> = summaries
            .iter()
            .map(|(code, years)| (code.to_string(), self.country_rows(years, impact_floor)))
            .collect();

        let engineered = EngineeredPanel {
            countries,
            scaler,
            impact_floor,
        };
        log::info!(
            "Engineered {} feature vectors for {} countries",
            engineered.len(),
            engineered.country_count()
        );
        engineered
    }

    fn country_rows(&self, years: &[YearSummary], impact_floor: f64) -> Vec<EngineeredRow> {
        let rolling = self.windows.rolling_years;
        let trend = self.windows.trend_years;

        let impact: Vec<(i32, f64)> = years.iter().map(|s| (s.year, s.impact)).collect();
        let rebased: Vec<(i32, f64)> = years.iter().map(|s| (s.year, s.impact - impact_floor)).collect();
        let affected: Vec<(i32, f64)> = years.iter().map(|s| (s.year, s.total_affected)).collect();
        let deaths: Vec<(i32, f64)> = years.iter().map(|s| (s.year, s.total_deaths)).collect();
        let log_affected: Vec<(i32, f64)> = affected.iter().map(|(y, v)| (*y, v.ln_1p())).collect();

        years
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut v = [0.0; FEATURE_COUNT];

                for (slot, value) in s.hazard_impacts.iter().enumerate() {
                    v[IDX_FLOOD_IMPACT + slot] = value.unwrap_or(0.0);
                }

                let baseline = prior_mean(&rebased, i);
                let short = trailing_window(&impact, i, rolling);
                let long = trailing_window(&impact, i, trend);

                v[IDX_CLIMATE_IMPACT_INDEX] = s.impact;
                v[IDX_COUNTRY_MEAN_IMPACT] = baseline;
                v[IDX_IMPACT_LAG1] = previous_year(&rebased, i).unwrap_or(baseline);
                v[IDX_IMPACT_3YR_AVG] = mean(short).unwrap_or(s.impact);
                v[IDX_IMPACT_TREND] = ols_slope(long);
                v[IDX_IMPACT_STD] = sample_std(long);
                v[IDX_RECENT_DEVIATION] = s.impact - prior_mean(&impact, i);

                v[IDX_LOG_TOTAL_AFFECTED] = s.total_affected.ln_1p();
                v[IDX_LOG_TOTAL_DEATH] = s.total_deaths.ln_1p();
                v[IDX_LOG_AFFECTED_AVG] = mean(trailing_window(&affected, i, rolling))
                    .unwrap_or(s.total_affected)
                    .ln_1p();
                v[IDX_LOG_DEATH_AVG] = mean(trailing_window(&deaths, i, rolling))
                    .unwrap_or(s.total_deaths)
                    .ln_1p();
                v[IDX_ABSOLUTE_TREND] = ols_slope(trailing_window(&log_affected, i, trend));

                v[IDX_HAZARD_COUNT] = s.hazard_count as f64;
                v[IDX_ECONOMIC_DAMAGE] = s.economic_damage;

                if short.len() < rolling as usize {
                    log::trace!("Partial {}-year window at {} ({} points)", rolling, s.year, short.len());
                }

                EngineeredRow {
                    year: s.year,
                    features: FeatureVector::from_values(v),
                    impact_rebased: rebased[i].1,
                }
            })
            .collect()
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

fn summarize(scaler: &HazardScaler, obs: &Observation) -> YearSummary {
    let mut hazard_impacts = [None; 4];
    for (slot, hazard) in Hazard::ALL.iter().enumerate() {
        hazard_impacts[slot] = scaler.impact(*hazard, obs.hazard(*hazard));
    }

    let observed: Vec<f64> = hazard_impacts.iter().flatten().copied().collect();
    let impact = if observed.is_empty() {
        scaler.zero_event_impact()
    } else {
        observed.iter().sum::<f64>() / observed.len() as f64
    };

    YearSummary {
        year: obs.year,
        hazard_impacts,
        impact,
        total_affected: obs.total_affected().max(0.0),
        total_deaths: obs.total_deaths().max(0.0),
        hazard_count: observed.len(),
        economic_damage: obs.economic_damage(),
    }
}
