//! Features Module - Feature Engineering Engine
//!
//! Turns the raw country-year panel into the 18-feature vectors consumed by
//! the composite index and the forecasting model.
//!
//! ## Architecture
//! - `layout.rs` - Authoritative feature order, version and hash
//! - `vector.rs` - Versioned `FeatureVector`
//! - `hazard.rs` - Per-hazard log/z-score standardization
//! - `history.rs` - Trailing-window statistics
//! - `engineer.rs` - `FeatureEngineer` producing an `EngineeredPanel`

pub mod layout;
pub mod vector;
pub mod hazard;
pub mod history;
pub mod engineer;


pub use engineer::{EngineeredPanel, EngineeredRow, FeatureEngineer};
pub use layout::{LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use vector::FeatureVector;
