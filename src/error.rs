//! Error handling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClimateIndexError>;

#[derive(Debug, Error)]
pub enum ClimateIndexError {
    // Inference errors
    #[error("country '{country}' is not in the training set")]
    UnknownCountry { country: String },

    #[error("no observed year for '{country}' before target year {target_year}")]
    NoAnchor { country: String, target_year: i32 },

    // Schema errors
    #[error("feature schema mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error(
        "feature layout mismatch: expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})"
    )]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("unsupported model format v{found} (supported: v{supported})")]
    UnsupportedModelFormat { found: u32, supported: u32 },

    // Data errors
    #[error("duplicate observation for {country} in {year}")]
    DuplicateObservation { country: String, year: i32 },

    #[error("not enough training pairs: need {needed}, have {available}")]
    InsufficientTrainingData { needed: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Wrapped errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
