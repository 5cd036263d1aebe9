//! Bagged random forest of regression trees
//!
//! Tree `i` draws its bootstrap sample and split features from an RNG
//! seeded with `seed + i`, and trees are collected in index order, so a fit
//! is reproducible whatever the rayon thread count.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use crate::error::{ClimateIndexError, Result};
use crate::logic::config::ForestConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    /// Normalized impurity decrease, averaged over trees
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ForestConfig) -> Result<Self> {
        let n = x.nrows();
        let n_features = x.ncols();
        if n == 0 || y.len() != n {
            return Err(ClimateIndexError::InsufficientTrainingData {
                needed: 1,
                available: n.min(y.len()),
            });
        }

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(n_features),
        };

        let fitted: Vec<(RegressionTree, Vec<f64>)> = (0..config.trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let samples: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let mut importances = vec![0.0; n_features];
                let tree = RegressionTree::fit(x.view(), y.view(), &samples, &params, &mut rng, &mut importances);

                let total: f64 = importances.iter().sum();
                if total > 0.0 {
                    importances.iter_mut().for_each(|v| *v /= total);
                }
                (tree, importances)
            })
            .collect();

        let mut feature_importances = vec![0.0; n_features];
        for (_, importances) in &fitted {
            for (acc, v) in feature_importances.iter_mut().zip(importances) {
                *acc += v;
            }
        }
        let tree_count = fitted.len().max(1) as f64;
        feature_importances.iter_mut().for_each(|v| *v /= tree_count);

        let trees = fitted.into_iter().map(|(tree, _)| tree).collect();
        log::debug!("Fitted {} trees on {} rows", config.trees, n);
        Ok(Self {
            trees,
            n_features,
            feature_importances,
        })
    }

    /// Mean of the tree predictions, summed in tree order
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict_rows(&self, x: &Array2<f64>) -> Vec<f64> {
        x.rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict(slice),
                None => self.predict(&row.to_vec()),
            })
            .collect()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}
