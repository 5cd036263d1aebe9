use serde::{Deserialize, Serialize};

// ============================================================================
// HAZARDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Flood,
    Drought,
    Storm,
    ExtremeTemperature,
}

impl Hazard {
    /// All hazards, in feature-layout order
    pub const ALL: [Hazard; 4] = [
        Hazard::Flood,
        Hazard::Drought,
        Hazard::Storm,
        Hazard::ExtremeTemperature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Hazard::Flood => "flood",
            Hazard::Drought => "drought",
            Hazard::Storm => "storm",
            Hazard::ExtremeTemperature => "extreme_temperature",
        }
    }
}

// ============================================================================
// RAW METRICS
// ============================================================================

/// Raw metrics for one hazard in one country-year.
///
/// `None` means the loader has no value (unknown), `Some(0.0)` means an
/// observed zero. The two are never collapsed before feature engineering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_per_100k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deaths_per_100k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_affected: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_deaths: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economic_damage_pct_gdp: Option<f64>,
}

impl HazardMetrics {
    /// A hazard counts as observed when either per-capita metric is known
    pub fn is_observed(&self) -> bool {
        self.affected_per_100k.is_some() || self.deaths_per_100k.is_some()
    }
}

/// One (country, year) row of the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: String,
    pub year: i32,
    #[serde(default)]
    pub flood: HazardMetrics,
    #[serde(default)]
    pub drought: HazardMetrics,
    #[serde(default)]
    pub storm: HazardMetrics,
    #[serde(default)]
    pub extreme_temperature: HazardMetrics,
}

impl Observation {
    pub fn new(country: &str, year: i32) -> Self {
        Self {
            country: country.to_string(),
            year,
            flood: HazardMetrics::default(),
            drought: HazardMetrics::default(),
            storm: HazardMetrics::default(),
            extreme_temperature: HazardMetrics::default(),
        }
    }

    pub fn hazard(&self, hazard: Hazard) -> &HazardMetrics {
        match hazard {
            Hazard::Flood => &self.flood,
            Hazard::Drought => &self.drought,
            Hazard::Storm => &self.storm,
            Hazard::ExtremeTemperature => &self.extreme_temperature,
        }
    }

    pub fn hazard_mut(&mut self, hazard: Hazard) -> &mut HazardMetrics {
        match hazard {
            Hazard::Flood => &mut self.flood,
            Hazard::Drought => &mut self.drought,
            Hazard::Storm => &mut self.storm,
            Hazard::ExtremeTemperature => &mut self.extreme_temperature,
        }
    }

    /// Builder-style setter used by loaders and tests
    pub fn with_hazard(mut self, hazard: Hazard, metrics: HazardMetrics) -> Self {
        *self.hazard_mut(hazard) = metrics;
        self
    }

    /// Sum of people affected across hazards (unknown counts as zero)
    pub fn total_affected(&self) -> f64 {
        Hazard::ALL
            .iter()
            .filter_map(|h| self.hazard(*h).total_affected)
            .sum()
    }

    /// Sum of deaths across hazards (unknown counts as zero)
    pub fn total_deaths(&self) -> f64 {
        Hazard::ALL
            .iter()
            .filter_map(|h| self.hazard(*h).total_deaths)
            .sum()
    }

    /// Mean economic damage over hazards that report it, 0.0 if none do
    pub fn economic_damage(&self) -> f64 {
        let known: Vec<f64> = Hazard::ALL
            .iter()
            .filter_map(|h| self.hazard(*h).economic_damage_pct_gdp)
            .collect();
        if known.is_empty() {
            0.0
        } else {
            known.iter().sum::<f64>() / known.len() as f64
        }
    }

    pub fn observed_hazards(&self) -> usize {
        Hazard::ALL
            .iter()
            .filter(|h| self.hazard(**h).is_observed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_totals_treat_unknown_as_zero() {
        let obs = Observation::new("KEN", 2010)
            .with_hazard(Hazard::Flood, HazardMetrics {
                total_affected: Some(100.0),
                total_deaths: Some(3.0),
                economic_damage_pct_gdp: Some(0.4),
                ..Default::default()
            })
            .with_hazard(Hazard::Drought, HazardMetrics {
                total_affected: Some(50.0),
                economic_damage_pct_gdp: Some(0.2),
                ..Default::default()
            });

        assert_eq!(obs.total_affected(), 150.0);
        assert_eq!(obs.total_deaths(), 3.0);
        assert!((obs.economic_damage() - 0.3).abs() < 1e-12);
        // Totals alone do not make a hazard observed
        assert_eq!(obs.observed_hazards(), 0);
    }

    #[test]
    fn test_observed_zero_is_observed() {
        let metrics = HazardMetrics {
            deaths_per_100k: Some(0.0),
            ..Default::default()
        };
        assert!(metrics.is_observed());
        assert!(!HazardMetrics::default().is_observed());
    }

    #[test]
    fn test_observation_json_shape() {
        let line = r#"{"country":"BGD","year":2001,"flood":{"affected_per_100k":12.5}}"#;
        let obs: Observation = serde_json::from_str(line).unwrap();
        assert_eq!(obs.flood.affected_per_100k, Some(12.5));
        assert_eq!(obs.storm, HazardMetrics::default());
    }
}
