//! K-fold cross-validation
//!
//! Rows are shuffled once with the forest seed and cut into `k` contiguous
//! folds. Each fold is scored by a forest trained on the other folds.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use crate::error::{ClimateIndexError, Result};
use crate::logic::config::ForestConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub folds: usize,
    pub fold_r2: Vec<f64>,
    pub mean_r2: f64,
}

/// Coefficient of determination.
///
/// A target with no variance scores 1.0 on a perfect fit, 0.0 otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mean = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Fold boundaries over a seeded permutation of `0..n`
pub fn fold_indices(n: usize, folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    (0..folds)
        .map(|k| order[k * n / folds..(k + 1) * n / folds].to_vec())
        .collect()
}

pub fn cross_validate(
    x: &Array2<f64>,
    y: &Array1<f64>,
    folds: usize,
    config: &ForestConfig,
) -> Result<ValidationReport> {
    let n = y.len();
    if folds < 2 || n < folds {
        return Err(ClimateIndexError::InsufficientTrainingData {
            needed: folds.max(2),
            available: n,
        });
    }

    let mut fold_r2 = Vec::with_capacity(folds);
    for (k, test) in fold_indices(n, folds, config.seed).iter().enumerate() {
        let mut in_test = vec![false; n];
        test.iter().for_each(|&i| in_test[i] = true);
        let train: Vec<usize> = (0..n).filter(|&i| !in_test[i]).collect();

        let forest = RandomForest::fit(&x.select(Axis(0), &train), &y.select(Axis(0), &train), config)?;
        let predicted = forest.predict_rows(&x.select(Axis(0), test));
        let truth: Vec<f64> = test.iter().map(|&i| y[i]).collect();

        let score = r2_score(&truth, &predicted);
        log::debug!("Fold {}/{}: R2 = {:.4} ({} test rows)", k + 1, folds, score, test.len());
        fold_r2.push(score);
    }

    let mean_r2 = fold_r2.iter().sum::<f64>() / folds as f64;
    log::info!("Cross-validated R2 over {} folds: {:.4}", folds, mean_r2);
    Ok(ValidationReport {
        folds,
        fold_r2,
        mean_r2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r2_score() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 5.0]), 0.0);
    }

    #[test]
    fn test_folds_partition_rows() {
        let folds = fold_indices(10, 3, 42);
        assert_eq!(folds.len(), 3);
        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert!(folds.iter().all(|f| !f.is_empty()));
        assert_eq!(fold_indices(10, 3, 42), folds);
    }

    #[test]
    fn test_too_few_rows() {
        let x = Array2::<f64>::zeros((2, 4));
        let y = Array1::<f64>::zeros(2);
        match cross_validate(&x, &y, 3, &ForestConfig::default()) {
            Err(ClimateIndexError::InsufficientTrainingData { needed, available }) => {
                assert_eq!(needed, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientTrainingData, got {:?}", other),
        }
    }

    #[test]
    fn test_learnable_signal_scores_well() {
        let x = Array2::from_shape_fn((90, 2), |(i, j)| if j == 0 { (i % 30) as f64 } else { (i % 7) as f64 });
        let y = Array1::from_shape_fn(90, |i| (i % 30) as f64 * 0.1);
        let config = ForestConfig {
            trees: 30,
            ..Default::default()
        };
        let report = cross_validate(&x, &y, 3, &config).unwrap();
        assert_eq!(report.fold_r2.len(), 3);
        assert!(report.mean_r2 > 0.7, "mean R2 {}", report.mean_r2);
    }
}
