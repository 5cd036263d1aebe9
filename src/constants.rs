//! Central Configuration Constants
//!
//! Single source of truth for pipeline defaults.
//! Anything tunable at runtime lives in `logic::config::PipelineConfig`;
//! these are the values it starts from.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name (also used as the data directory name)
pub const APP_NAME: &str = "climate-index";

/// Default model artifact file name
pub const DEFAULT_MODEL_FILE: &str = "model_v1.json";

// ============================================
// Composite index defaults
// ============================================

pub const DEFAULT_WEIGHT_HUMAN_BURDEN: f64 = 0.50;
pub const DEFAULT_WEIGHT_PERSISTENCE: f64 = 0.25;
pub const DEFAULT_WEIGHT_CLIMATE_INTENSITY: f64 = 0.15;
pub const DEFAULT_WEIGHT_STRUCTURAL_VULNERABILITY: f64 = 0.10;

/// Score assigned when a comparison set has no spread
pub const DEFAULT_NEUTRAL_SCORE: f64 = 0.5;

/// Trailing window for human-burden and impact averages (years)
pub const DEFAULT_ROLLING_YEARS: u32 = 3;

/// Trailing window for slope and volatility features (years)
pub const DEFAULT_TREND_YEARS: u32 = 5;

// ============================================
// Model defaults
// ============================================

pub const DEFAULT_TREES: usize = 200;
pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 5;
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_FOLDS: usize = 3;

/// Minimum observed years before a country shows up in the forecast table
pub const DEFAULT_MIN_HISTORY_YEARS: usize = 5;

/// Oldest anchor (in years before the target's previous year) still accepted
pub const DEFAULT_MAX_ANCHOR_STALENESS: i32 = 5;

/// Aggregates and defunct states that are not countries
pub const DEFAULT_EXCLUDED_ENTITIES: &[&str] = &[
    "Asia",
    "Africa",
    "Europe",
    "North America",
    "South America",
    "Oceania",
    "USSR",
    "Soviet Union",
    "Czechoslovakia",
    "Yugoslavia",
    "World",
    "Low-income countries",
    "Lower-middle-income countries",
    "Upper-middle-income countries",
    "High-income countries",
    "European Union",
    "EU",
];

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get model artifact path from environment or use the platform data dir
pub fn get_model_path() -> PathBuf {
    std::env::var("CLIMATE_INDEX_MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
                .join(DEFAULT_MODEL_FILE)
        })
}

/// Get forest seed from environment
pub fn get_seed_override() -> Option<u64> {
    std::env::var("CLIMATE_INDEX_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
}

/// Get normalization scope name from environment ("panel" / "per_year")
pub fn get_scope_override() -> Option<String> {
    std::env::var("CLIMATE_INDEX_SCOPE").ok()
}

/// Get extrapolation policy name from environment ("repeat_last" / "trend")
pub fn get_extrapolation_override() -> Option<String> {
    std::env::var("CLIMATE_INDEX_EXTRAPOLATION").ok()
}
