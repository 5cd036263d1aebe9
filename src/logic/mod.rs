//! Logic Module - Pipeline Engines
//!
//! ## Architecture
//! - `panel/` - Country-year observations (input side)
//! - `features/` - Feature layout, vectors and the feature engineer
//! - `index/` - Normalization and the composite index builder
//! - `model/` - Random forest, validation, artifact storage, forecasting
//! - `export` - Output writers
//! - `pipeline` - End-to-end orchestration

pub mod config;
pub mod panel;
pub mod features;
pub mod index;
pub mod model;
pub mod export;
pub mod pipeline;
