//! Climate Impact Index
//!
//! Feature engineering, composite scoring and next-year forecasting over a
//! country-year panel of disaster statistics.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ClimateIndexError, Result};
pub use logic::config::PipelineConfig;
