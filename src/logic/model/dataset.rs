//! Training-set assembly
//!
//! Pairs the features of year `t` with the realized target of year `t + 1`.
//! Only consecutive observed years are paired, and `t + 1` must not be
//! later than the last complete year.

use ndarray::{Array1, Array2};

use crate::logic::config::PredictionTarget;
use crate::logic::features::{EngineeredPanel, FEATURE_COUNT};
use crate::logic::index::IndexTable;

#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// (country, feature year) of each row
    pub keys: Vec<(String, i32)>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

pub fn build_training_set(
    engineered: &EngineeredPanel,
    index: &IndexTable,
    target: PredictionTarget,
    last_complete_year: i32,
) -> TrainingSet {
    let mut values = Vec::new();
    let mut targets = Vec::new();
    let mut keys = Vec::new();

    for (country, rows) in engineered.countries() {
        for pair in rows.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if next.year != current.year + 1 || next.year > last_complete_year {
                continue;
            }
            let realized = match target {
                PredictionTarget::NextComposite => index.composite(country, next.year),
                PredictionTarget::NextImpact => Some(next.impact_rebased),
            };
            let Some(realized) = realized else {
                continue;
            };
            values.extend_from_slice(current.features.as_slice());
            targets.push(realized);
            keys.push((country.to_string(), current.year));
        }
    }

    let rows = targets.len();
    // Shape always matches: FEATURE_COUNT values were pushed per row
    let x = Array2::from_shape_vec((rows, FEATURE_COUNT), values)
        .unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)));

    log::debug!("Assembled {} training pairs through {}", rows, last_complete_year);
    TrainingSet {
        x,
        y: Array1::from(targets),
        keys,
    }
}
