//! Per-hazard standardization
//!
//! Impact of one hazard in one country-year is
//! `z(log1p(affected_per_100k)) + z(log1p(deaths_per_100k))`, with the
//! z-score fitted over every observed country-year of that hazard.

use serde::{Deserialize, Serialize};

use crate::logic::panel::{Hazard, HazardMetrics, Panel};

/// Mean and population std of one log-transformed metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub std: f64,
    pub samples: usize,
}

impl MetricStats {
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
            samples: values.len(),
        }
    }

    /// Zero spread maps every value to 0
    pub fn z(&self, value: f64) -> f64 {
        if self.std > 0.0 {
            (value - self.mean) / self.std
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardStats {
    pub affected: MetricStats,
    pub deaths: MetricStats,
}

/// Fitted z-score statistics for all four hazards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardScaler {
    stats: [HazardStats; 4],
}

/// Log-transformed per-capita pair; unknown partner counts as observed zero
fn log_pair(metrics: &HazardMetrics) -> (f64, f64) {
    let affected = metrics.affected_per_100k.unwrap_or(0.0).max(0.0);
    let deaths = metrics.deaths_per_100k.unwrap_or(0.0).max(0.0);
    (affected.ln_1p(), deaths.ln_1p())
}

impl HazardScaler {
    pub fn fit(panel: &Panel) -> Self {
        let mut stats = [HazardStats::default(); 4];
        for (slot, hazard) in Hazard::ALL.iter().enumerate() {
            let (affected, deaths): (Vec<f64>, Vec<f64>) = panel
                .observations()
                .map(|o| o.hazard(*hazard))
                .filter(|m| m.is_observed())
                .map(log_pair)
                .unzip();
            stats[slot] = HazardStats {
                affected: MetricStats::fit(&affected),
                deaths: MetricStats::fit(&deaths),
            };
            log::debug!(
                "Hazard {} fitted on {} observations",
                hazard.name(),
                affected.len()
            );
        }
        Self { stats }
    }

    pub fn stats(&self, hazard: Hazard) -> &HazardStats {
        &self.stats[hazard_slot(hazard)]
    }

    /// Standardized impact, `None` when the hazard is unknown
    pub fn impact(&self, hazard: Hazard, metrics: &HazardMetrics) -> Option<f64> {
        if !metrics.is_observed() {
            return None;
        }
        let (affected, deaths) = log_pair(metrics);
        let stats = self.stats(hazard);
        Some(stats.affected.z(affected) + stats.deaths.z(deaths))
    }

    /// Climate impact of a country-year with no recorded events: every
    /// hazard seen in the panel scored at zero affected and zero deaths
    pub fn zero_event_impact(&self) -> f64 {
        let fitted: Vec<f64> = self
            .stats
            .iter()
            .filter(|s| s.affected.samples > 0)
            .map(|s| s.affected.z(0.0) + s.deaths.z(0.0))
            .collect();
        if fitted.is_empty() {
            return 0.0;
        }
        fitted.iter().sum::<f64>() / fitted.len() as f64
    }
}

fn hazard_slot(hazard: Hazard) -> usize {
    match hazard {
        Hazard::Flood => 0,
        Hazard::Drought => 1,
        Hazard::Storm => 2,
        Hazard::ExtremeTemperature => 3,
    }
}
