//! Offline training step
//!
//! Assembles (t, t+1) pairs, cross-validates, then fits the final forest on
//! every pair.

use std::collections::BTreeSet;

use super::artifact::{FeatureImportance, TrainedModel};
use super::dataset::build_training_set;
use super::forest::RandomForest;
use super::validation::cross_validate;
use crate::error::{ClimateIndexError, Result};
use crate::logic::config::TrainingConfig;
use crate::logic::features::{EngineeredPanel, LayoutInfo, FEATURE_LAYOUT};
use crate::logic::index::IndexTable;

pub fn train(engineered: &EngineeredPanel, index: &IndexTable, config: &TrainingConfig) -> Result<TrainedModel> {
    let last_complete_year = match config.last_complete_year.or_else(|| engineered.last_year()) {
        Some(year) => year,
        None => {
            return Err(ClimateIndexError::InsufficientTrainingData {
                needed: config.folds,
                available: 0,
            })
        }
    };

    let set = build_training_set(engineered, index, config.target, last_complete_year);
    if set.len() < config.folds {
        return Err(ClimateIndexError::InsufficientTrainingData {
            needed: config.folds,
            available: set.len(),
        });
    }

    log::info!(
        "Training {:?} model on {} pairs through {} ({} trees)",
        config.target,
        set.len(),
        last_complete_year,
        config.forest.trees
    );

    let validation = cross_validate(&set.x, &set.y, config.folds, &config.forest)?;
    let forest = RandomForest::fit(&set.x, &set.y, &config.forest)?;

    let feature_importances = FEATURE_LAYOUT
        .iter()
        .zip(forest.feature_importances())
        .map(|(name, importance)| FeatureImportance {
            feature: name.to_string(),
            importance: *importance,
        })
        .collect();

    // Countries contributing at least one training pair
    let countries: BTreeSet<String> = set.keys.iter().map(|(code, _)| code.clone()).collect();

    Ok(TrainedModel {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: chrono::Utc::now(),
        schema: LayoutInfo::current(),
        target: config.target,
        trained_through: last_complete_year,
        training_rows: set.len(),
        countries,
        validation,
        feature_importances,
        forest,
    })
}
