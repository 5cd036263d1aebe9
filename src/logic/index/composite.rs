//! Composite Index Builder
//!
//! Composite = Σ weight × sub-component, each sub-component the mean of its
//! min-max normalized constituents and bounded to [0, 1].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::normalize::{NormalizationReference, ReferenceStats};
use crate::error::Result;
use crate::logic::config::{IndexWeights, NormalizationConfig};
use crate::logic::features::layout::*;
use crate::logic::features::{EngineeredPanel, FeatureVector};

// ============================================================================
// CONSTITUENTS
// ============================================================================

/// One normalized input to a sub-component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constituent {
    Feature(usize),
    /// max(feature, 0): only worsening moves count
    PositivePart(usize),
}

impl Constituent {
    pub fn extract(&self, vector: &FeatureVector) -> f64 {
        match *self {
            Constituent::Feature(i) => vector.values[i],
            Constituent::PositivePart(i) => vector.values[i].max(0.0),
        }
    }

    pub fn feature(&self) -> usize {
        match *self {
            Constituent::Feature(i) | Constituent::PositivePart(i) => i,
        }
    }
}

/// Every constituent, grouped by sub-component
pub const CONSTITUENTS: &[Constituent] = &[
    // Human burden (0-3)
    Constituent::Feature(IDX_LOG_TOTAL_AFFECTED),
    Constituent::Feature(IDX_LOG_TOTAL_DEATH),
    Constituent::Feature(IDX_LOG_AFFECTED_AVG),
    Constituent::Feature(IDX_LOG_DEATH_AVG),
    // Persistence (4-6)
    Constituent::Feature(IDX_IMPACT_3YR_AVG),
    Constituent::Feature(IDX_IMPACT_LAG1),
    Constituent::PositivePart(IDX_IMPACT_TREND),
    // Climate intensity (7)
    Constituent::Feature(IDX_CLIMATE_IMPACT_INDEX),
    // Structural vulnerability (8)
    Constituent::Feature(IDX_COUNTRY_MEAN_IMPACT),
];

// ============================================================================
// SUB-COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubComponent {
    HumanBurden,
    Persistence,
    ClimateIntensity,
    StructuralVulnerability,
}

impl SubComponent {
    pub const ALL: [SubComponent; 4] = [
        SubComponent::HumanBurden,
        SubComponent::Persistence,
        SubComponent::ClimateIntensity,
        SubComponent::StructuralVulnerability,
    ];

    /// Positions in `CONSTITUENTS`
    pub fn positions(&self) -> std::ops::Range<usize> {
        match self {
            SubComponent::HumanBurden => 0..4,
            SubComponent::Persistence => 4..7,
            SubComponent::ClimateIntensity => 7..8,
            SubComponent::StructuralVulnerability => 8..9,
        }
    }

    pub fn weight(&self, weights: &IndexWeights) -> f64 {
        match self {
            SubComponent::HumanBurden => weights.human_burden,
            SubComponent::Persistence => weights.persistence,
            SubComponent::ClimateIntensity => weights.climate_intensity,
            SubComponent::StructuralVulnerability => weights.structural_vulnerability,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubComponent::HumanBurden => "human_burden",
            SubComponent::Persistence => "persistence",
            SubComponent::ClimateIntensity => "climate_intensity",
            SubComponent::StructuralVulnerability => "structural_vulnerability",
        }
    }
}

// ============================================================================
// SCORES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexScores {
    pub human_burden: f64,
    pub persistence: f64,
    pub climate_intensity: f64,
    pub structural_vulnerability: f64,
    pub composite: f64,
}

impl IndexScores {
    pub fn get(&self, component: SubComponent) -> f64 {
        match component {
            SubComponent::HumanBurden => self.human_burden,
            SubComponent::Persistence => self.persistence,
            SubComponent::ClimateIntensity => self.climate_intensity,
            SubComponent::StructuralVulnerability => self.structural_vulnerability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub country: String,
    pub year: i32,
    #[serde(flatten)]
    pub scores: IndexScores,
}

/// Index values for every engineered (country, year)
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTable {
    records: Vec<IndexRecord>,
    lookup: BTreeMap<(String, i32), usize>,
    reference: NormalizationReference,
}

impl IndexTable {
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn get(&self, country: &str, year: i32) -> Option<&IndexScores> {
        self.lookup
            .get(&(country.to_string(), year))
            .map(|&i| &self.records[i].scores)
    }

    pub fn composite(&self, country: &str, year: i32) -> Option<f64> {
        self.get(country, year).map(|s| s.composite)
    }

    pub fn reference(&self) -> &NormalizationReference {
        &self.reference
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompositeIndexBuilder {
    weights: IndexWeights,
    normalization: NormalizationConfig,
}

impl CompositeIndexBuilder {
    pub fn new(weights: IndexWeights, normalization: NormalizationConfig) -> Result<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            normalization,
        })
    }

    pub fn weights(&self) -> &IndexWeights {
        &self.weights
    }

    pub fn build(&self, engineered: &EngineeredPanel) -> IndexTable {
        let reference = NormalizationReference::fit(engineered, self.normalization.scope);
        self.log_degenerate(&reference);

        let mut records = Vec::with_capacity(engineered.len());
        let mut lookup = BTreeMap::new();
        for (country, row) in engineered.rows() {
            let scores = match reference.for_year(row.year) {
                Some(stats) => self.score(&row.features, stats),
                None => self.neutral_scores(),
            };
            lookup.insert((country.to_string(), row.year), records.len());
            records.push(IndexRecord {
                country: country.to_string(),
                year: row.year,
                scores,
            });
        }

        log::info!("Built composite index for {} country-years", records.len());
        IndexTable {
            records,
            lookup,
            reference,
        }
    }

    /// Score one vector against a comparison set
    pub fn score(&self, vector: &FeatureVector, reference: &ReferenceStats) -> IndexScores {
        let neutral = self.normalization.neutral_score;
        let component = |c: SubComponent| -> f64 {
            let positions = c.positions();
            // Constant across the set as a whole
            if positions.clone().all(|p| reference.is_degenerate(p)) {
                return neutral;
            }
            let n = positions.len() as f64;
            let sum: f64 = positions
                .map(|p| reference.normalize(p, &CONSTITUENTS[p], vector, neutral))
                .sum();
            (sum / n).clamp(0.0, 1.0)
        };

        let human_burden = component(SubComponent::HumanBurden);
        let persistence = component(SubComponent::Persistence);
        let climate_intensity = component(SubComponent::ClimateIntensity);
        let structural_vulnerability = component(SubComponent::StructuralVulnerability);
        self.combine(human_burden, persistence, climate_intensity, structural_vulnerability)
    }

    fn combine(&self, hb: f64, p: f64, ci: f64, sv: f64) -> IndexScores {
        let w = &self.weights;
        let composite = w.human_burden * hb
            + w.persistence * p
            + w.climate_intensity * ci
            + w.structural_vulnerability * sv;
        IndexScores {
            human_burden: hb,
            persistence: p,
            climate_intensity: ci,
            structural_vulnerability: sv,
            composite: composite.clamp(0.0, 1.0),
        }
    }

    fn neutral_scores(&self) -> IndexScores {
        let n = self.normalization.neutral_score;
        self.combine(n, n, n, n)
    }

    fn log_degenerate(&self, reference: &NormalizationReference) {
        let sets: Vec<(Option<i32>, &ReferenceStats)> = match reference {
            NormalizationReference::Panel(stats) => vec![(None, stats)],
            NormalizationReference::PerYear(by_year) => {
                by_year.iter().map(|(y, s)| (Some(*y), s)).collect()
            }
        };
        for (year, stats) in sets {
            for position in stats.degenerate_positions() {
                let feature = feature_name(CONSTITUENTS[position].feature()).unwrap_or("?");
                match year {
                    Some(y) => log::debug!("No spread in '{}' for {}", feature, y),
                    None => log::debug!("No spread in '{}' over the panel", feature),
                }
            }
        }
    }
}
