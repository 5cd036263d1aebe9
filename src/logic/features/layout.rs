//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema used by the model artifact.**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Trained models embed the version, hash and ordered names; a vector built
//! under a different layout is rejected before it reaches the forest.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::{ClimateIndexError, Result};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Per-hazard current-year impact (0-3) ===
    "flood_impact",               // 0: z(log affected) + z(log deaths), per 100k
    "drought_impact",             // 1
    "storms_impact",              // 2
    "extreme_temp_impact",        // 3

    // === Composite raw impact (4-10) ===
    "climate_impact_index",       // 4: mean of observed hazard impacts
    "country_mean_impact",        // 5: baseline, mean rebased impact of prior years
    "impact_lag1",                // 6: rebased impact of the previous year
    "impact_3yr_avg",             // 7: trailing mean of climate_impact_index
    "impact_trend_5yr",           // 8: OLS slope of climate_impact_index
    "impact_std_5yr",             // 9: trailing sample std of climate_impact_index
    "country_recent_deviation",   // 10: index minus prior long-run mean

    // === Absolute human burden (11-15) ===
    "log_total_affected",         // 11: log1p(sum of affected over hazards)
    "log_total_death",            // 12: log1p(sum of deaths over hazards)
    "log_total_affected_3yr_avg", // 13: log1p(trailing mean of total affected)
    "log_total_death_3yr_avg",    // 14: log1p(trailing mean of total deaths)
    "absolute_impact_trend",      // 15: OLS slope of log_total_affected

    // === Coverage / economy (16-17) ===
    "hazard_count",               // 16: hazards with an observation
    "economic_damage_pct_gdp",    // 17: mean damage over observed hazards
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 18;

// Named indices used by the engineer and the index builder.
pub const IDX_FLOOD_IMPACT: usize = 0;
pub const IDX_CLIMATE_IMPACT_INDEX: usize = 4;
pub const IDX_COUNTRY_MEAN_IMPACT: usize = 5;
pub const IDX_IMPACT_LAG1: usize = 6;
pub const IDX_IMPACT_3YR_AVG: usize = 7;
pub const IDX_IMPACT_TREND: usize = 8;
pub const IDX_IMPACT_STD: usize = 9;
pub const IDX_RECENT_DEVIATION: usize = 10;
pub const IDX_LOG_TOTAL_AFFECTED: usize = 11;
pub const IDX_LOG_TOTAL_DEATH: usize = 12;
pub const IDX_LOG_AFFECTED_AVG: usize = 13;
pub const IDX_LOG_DEATH_AVG: usize = 14;
pub const IDX_ABSOLUTE_TREND: usize = 15;
pub const IDX_HAZARD_COUNT: usize = 16;
pub const IDX_ECONOMIC_DAMAGE: usize = 17;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information, embedded in every model artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Fails with a layout error when this info was produced under another layout
    pub fn validate_current(&self) -> Result<()> {
        validate_layout(self.version, self.hash)?;
        if self.feature_names.len() != FEATURE_COUNT
            || self.feature_names.iter().zip(FEATURE_LAYOUT).any(|(a, b)| a != b)
        {
            return Err(ClimateIndexError::SchemaMismatch {
                expected: LayoutInfo::current().feature_names,
                actual: self.feature_names.clone(),
            });
        }
        Ok(())
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<()> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(ClimateIndexError::LayoutMismatch {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Validate an ordered list of feature names against the layout
pub fn validate_names<S: AsRef<str>>(names: &[S]) -> Result<()> {
    let matches = names.len() == FEATURE_COUNT
        && names.iter().zip(FEATURE_LAYOUT).all(|(a, b)| a.as_ref() == *b);

    if matches {
        Ok(())
    } else {
        Err(ClimateIndexError::SchemaMismatch {
            expected: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            actual: names.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================
