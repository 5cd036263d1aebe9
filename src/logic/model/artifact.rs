//! Trained model artifact and storage
//!
//! On disk the model is an envelope `{ format_version, checksum, payload }`.
//! `payload` is the model JSON kept as raw text, and `checksum` is the
//! SHA-256 of exactly that text, so any edit to the payload is detected.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};

use super::forest::RandomForest;
use super::validation::ValidationReport;
use crate::error::{ClimateIndexError, Result};
use crate::logic::config::PredictionTarget;
use crate::logic::features::{FeatureVector, LayoutInfo};

/// Current envelope format
pub const MODEL_FORMAT_VERSION: u32 = 1;

// ============================================================================
// TRAINED MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Immutable model handle; pass it explicitly to whatever needs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Feature schema the forest was trained on
    pub schema: LayoutInfo,
    pub target: PredictionTarget,
    /// Last complete year used for targets
    pub trained_through: i32,
    pub training_rows: usize,
    pub countries: BTreeSet<String>,
    pub validation: ValidationReport,
    pub feature_importances: Vec<FeatureImportance>,
    pub forest: RandomForest,
}

impl TrainedModel {
    pub fn knows_country(&self, country: &str) -> bool {
        self.countries.contains(country)
    }

    /// Predict the target for one vector; the vector's layout must match
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64> {
        vector.validate()?;
        self.schema.validate_current()?;
        Ok(self.forest.predict(vector.as_slice()))
    }

    /// Predict from externally supplied (names, values)
    pub fn predict_named<S: AsRef<str>>(&self, names: &[S], values: &[f64]) -> Result<f64> {
        let vector = FeatureVector::from_named(names, values)?;
        self.predict(&vector)
    }

    pub fn validation_r2(&self) -> f64 {
        self.validation.mean_r2
    }

    /// Importances sorted from most to least important
    pub fn ranked_importances(&self) -> Vec<&FeatureImportance> {
        let mut ranked: Vec<&FeatureImportance> = self.feature_importances.iter().collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranked
    }
}

// ============================================================================
// ARTIFACT ENVELOPE
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub checksum: String,
    pub payload: Box<RawValue>,
}

pub fn payload_checksum(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

impl ModelArtifact {
    pub fn seal(model: &TrainedModel) -> Result<Self> {
        let text = serde_json::to_string(model)?;
        let checksum = payload_checksum(&text);
        Ok(Self {
            format_version: MODEL_FORMAT_VERSION,
            checksum,
            payload: RawValue::from_string(text)?,
        })
    }

    /// Verify format, checksum and schema, then decode the model
    pub fn open(&self) -> Result<TrainedModel> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(ClimateIndexError::UnsupportedModelFormat {
                found: self.format_version,
                supported: MODEL_FORMAT_VERSION,
            });
        }

        let actual = payload_checksum(self.payload.get());
        if actual != self.checksum {
            return Err(ClimateIndexError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual,
            });
        }

        let model: TrainedModel = serde_json::from_str(self.payload.get())?;
        model.schema.validate_current()?;
        Ok(model)
    }
}

// ============================================================================
// STORAGE
// ============================================================================

pub fn save_model(model: &TrainedModel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let artifact = ModelArtifact::seal(model)?;
    let json = serde_json::to_vec_pretty(&artifact)?;
    fs::write(path, json)?;
    log::info!("Saved model {} to {:?}", model.id, path);
    Ok(())
}

pub fn load_model(path: &Path) -> Result<TrainedModel> {
    if !path.exists() {
        return Err(ClimateIndexError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("model file not found: {}", path.display()),
        )));
    }

    let data = fs::read(path)?;
    let artifact: ModelArtifact = serde_json::from_slice(&data)?;
    let model = artifact.open()?;
    log::info!(
        "Loaded model {} (target {:?}, trained through {}, R2 {:.4})",
        model.id,
        model.target,
        model.trained_through,
        model.validation_r2()
    );
    Ok(model)
}
