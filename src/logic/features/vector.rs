//! Feature Vector - Model input for one anchor (country, year)
//!
//! Versioned vector tied to the layout in `layout.rs`. Every vector carries
//! the layout version and hash so a trained model can reject vectors built
//! under another schema.

use serde::{Deserialize, Serialize};

use super::layout::{layout_hash, validate_layout, validate_names, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
use crate::error::{ClimateIndexError, Result};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Zeroed vector under the current layout
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Build from an externally supplied (names, values) pair.
    ///
    /// Names must match the layout exactly, in order.
    pub fn from_named<S: AsRef<str>>(names: &[S], values: &[f64]) -> Result<Self> {
        validate_names(names)?;
        if values.len() != FEATURE_COUNT {
            return Err(ClimateIndexError::SchemaMismatch {
                expected: vec![FEATURE_COUNT.to_string()],
                actual: vec![values.len().to_string()],
            });
        }
        let mut array = [0.0; FEATURE_COUNT];
        array.copy_from_slice(values);
        Ok(Self::from_values(array))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> Result<()> {
        validate_layout(self.version, self.layout_hash)
    }

    /// JSON form for debug logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vector_is_current() {
        let v = FeatureVector::new();
        assert_eq!(v.version, FEATURE_VERSION);
        assert!(v.validate().is_ok());
        assert_eq!(v.as_slice().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_from_named_validates_order_and_length() {
        let values = [1.0; FEATURE_COUNT];
        assert!(FeatureVector::from_named(FEATURE_LAYOUT, &values).is_ok());

        let mut names = FEATURE_LAYOUT.to_vec();
        names.swap(2, 3);
        assert!(matches!(
            FeatureVector::from_named(&names, &values),
            Err(ClimateIndexError::SchemaMismatch { .. })
        ));

        assert!(FeatureVector::from_named(FEATURE_LAYOUT, &values[..10]).is_err());
    }

    #[test]
    fn test_foreign_layout_rejected() {
        let mut v = FeatureVector::new();
        v.layout_hash = v.layout_hash.wrapping_add(7);
        assert!(matches!(v.validate(), Err(ClimateIndexError::LayoutMismatch { .. })));
    }

    #[test]
    fn test_log_entry_names_every_feature() {
        let mut v = FeatureVector::new();
        v.values[4] = 1.25;
        let entry = v.to_log_entry();
        let named = entry["named_values"].as_object().unwrap();
        assert_eq!(named.len(), FEATURE_COUNT);
        assert_eq!(named["climate_impact_index"], 1.25);
        assert!(named.get("unknown_feature").is_none());
    }
}
