//! Pipeline Configuration
//!
//! Every tunable of the index formula and the model lives here, so the
//! formula can be audited and tested without running the pipeline.
//! Loaded from an optional TOML file, then environment overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ClimateIndexError, Result};

// ============================================================================
// INDEX WEIGHTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexWeights {
    pub human_burden: f64,
    pub persistence: f64,
    pub climate_intensity: f64,
    pub structural_vulnerability: f64,
}

impl Default for IndexWeights {
    fn default() -> Self {
        Self {
            human_burden: DEFAULT_WEIGHT_HUMAN_BURDEN,
            persistence: DEFAULT_WEIGHT_PERSISTENCE,
            climate_intensity: DEFAULT_WEIGHT_CLIMATE_INTENSITY,
            structural_vulnerability: DEFAULT_WEIGHT_STRUCTURAL_VULNERABILITY,
        }
    }
}

impl IndexWeights {
    pub fn sum(&self) -> f64 {
        self.human_burden + self.persistence + self.climate_intensity + self.structural_vulnerability
    }

    /// Weights must be non-negative and sum to 1
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.human_burden,
            self.persistence,
            self.climate_intensity,
            self.structural_vulnerability,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ClimateIndexError::InvalidConfig(format!(
                "index weights must be finite and non-negative: {:?}",
                all
            )));
        }
        if (self.sum() - 1.0).abs() > 1e-12 {
            return Err(ClimateIndexError::InvalidConfig(format!(
                "index weights must sum to 1.0, got {}",
                self.sum()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// FEATURE WINDOWS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Trailing window for rolling means (years, anchor included)
    pub rolling_years: u32,
    /// Trailing window for slope and std features (years, anchor included)
    pub trend_years: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            rolling_years: DEFAULT_ROLLING_YEARS,
            trend_years: DEFAULT_TREND_YEARS,
        }
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Comparison set used by min-max normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationScope {
    /// One reference over every country-year; scores comparable across years
    Panel,
    /// One reference per year; scores rank countries within a year
    PerYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub scope: NormalizationScope,
    /// Score used when the comparison set has no spread
    pub neutral_score: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            scope: NormalizationScope::Panel,
            neutral_score: DEFAULT_NEUTRAL_SCORE,
        }
    }
}

// ============================================================================
// MODEL TRAINING
// ============================================================================

/// What the regressor learns to predict for year t+1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTarget {
    NextComposite,
    NextImpact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Count(usize),
}

impl MaxFeatures {
    /// Number of candidate features per split, at least 1
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(c) => *c,
        };
        n.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub trees: usize,
    /// `None` grows trees until the leaf limits stop them
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: DEFAULT_TREES,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub target: PredictionTarget,
    /// Last fully observed year; defaults to the latest panel year
    pub last_complete_year: Option<i32>,
    pub folds: usize,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target: PredictionTarget::NextComposite,
            last_complete_year: None,
            folds: DEFAULT_FOLDS,
            forest: ForestConfig::default(),
        }
    }
}

// ============================================================================
// FORECAST
// ============================================================================

/// How the input vector for a year past the anchor is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Feed the most recent observed vector unchanged
    RepeatLast,
    /// Extend each feature by its last observed year-over-year change
    Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub extrapolation: ExtrapolationPolicy,
    pub min_history_years: usize,
    pub max_anchor_staleness: i32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            extrapolation: ExtrapolationPolicy::RepeatLast,
            min_history_years: DEFAULT_MIN_HISTORY_YEARS,
            max_anchor_staleness: DEFAULT_MAX_ANCHOR_STALENESS,
        }
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub weights: IndexWeights,
    pub windows: WindowConfig,
    pub normalization: NormalizationConfig,
    pub training: TrainingConfig,
    pub forecast: ForecastConfig,
    pub excluded_entities: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: IndexWeights::default(),
            windows: WindowConfig::default(),
            normalization: NormalizationConfig::default(),
            training: TrainingConfig::default(),
            forecast: ForecastConfig::default(),
            excluded_entities: DEFAULT_EXCLUDED_ENTITIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Load from TOML (if given), apply environment overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = fs::read_to_string(p)?;
                log::info!("Loaded pipeline config from {:?}", p);
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(seed) = get_seed_override() {
            self.training.forest.seed = seed;
        }
        if let Some(scope) = get_scope_override() {
            self.normalization.scope = match scope.as_str() {
                "panel" => NormalizationScope::Panel,
                "per_year" => NormalizationScope::PerYear,
                other => {
                    return Err(ClimateIndexError::InvalidConfig(format!(
                        "unknown normalization scope '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(policy) = get_extrapolation_override() {
            self.forecast.extrapolation = match policy.as_str() {
                "repeat_last" => ExtrapolationPolicy::RepeatLast,
                "trend" => ExtrapolationPolicy::Trend,
                other => {
                    return Err(ClimateIndexError::InvalidConfig(format!(
                        "unknown extrapolation policy '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if self.windows.rolling_years == 0 {
            return Err(ClimateIndexError::InvalidConfig("rolling_years must be >= 1".into()));
        }
        if self.windows.trend_years < 2 {
            return Err(ClimateIndexError::InvalidConfig("trend_years must be >= 2".into()));
        }

        let neutral = self.normalization.neutral_score;
        if !(0.0..=1.0).contains(&neutral) {
            return Err(ClimateIndexError::InvalidConfig(format!(
                "neutral_score must lie in [0, 1], got {}",
                neutral
            )));
        }

        if self.training.folds < 2 {
            return Err(ClimateIndexError::InvalidConfig("folds must be >= 2".into()));
        }
        let forest = &self.training.forest;
        if forest.trees == 0 || forest.min_samples_leaf == 0 || forest.min_samples_split < 2 {
            return Err(ClimateIndexError::InvalidConfig(format!(
                "invalid forest parameters: {:?}",
                forest
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
