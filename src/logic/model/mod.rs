//! Model Module - Forecasting Engine
//!
//! Trains a seeded random forest on (features at t, target at t+1) pairs
//! and applies it to each country's latest (or extrapolated) vector.
//!
//! ## Architecture
//! - `dataset.rs` - Training pairs as an ndarray design matrix
//! - `tree.rs` - CART regression tree (arena nodes)
//! - `forest.rs` - Bagged forest, trees built in parallel
//! - `validation.rs` - K-fold R2
//! - `train.rs` - Offline training step
//! - `artifact.rs` - `TrainedModel`, checksummed storage
//! - `inference.rs` - `Forecaster` and extrapolation policies

pub mod dataset;
pub mod tree;
pub mod forest;
pub mod validation;
pub mod train;
pub mod artifact;
pub mod inference;

#[cfg(test)]
mod tests;

pub use artifact::{load_model, save_model, ModelArtifact, TrainedModel};
pub use forest::RandomForest;
pub use inference::{CountryForecast, ForecastTable, Forecaster};
pub use train::train;
pub use validation::ValidationReport;
