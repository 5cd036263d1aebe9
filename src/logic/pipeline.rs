//! Pipeline - Loader → Features → Index → Model → Forecast
//!
//! Each stage takes its inputs explicitly; the trained model is a value the
//! caller owns, never process-wide state.

use std::path::Path;

use crate::error::Result;
use crate::logic::config::PipelineConfig;
use crate::logic::features::{EngineeredPanel, FeatureEngineer};
use crate::logic::index::{CompositeIndexBuilder, IndexTable};
use crate::logic::model::{self, ForecastTable, Forecaster, TrainedModel};
use crate::logic::panel::{storage, Panel};

/// Everything produced by one end-to-end run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub engineered: EngineeredPanel,
    pub index: IndexTable,
    pub model: TrainedModel,
    pub forecasts: ForecastTable,
}

/// Filter aggregates, engineer features and build the composite index
pub fn build_index(panel: Panel, config: &PipelineConfig) -> Result<(EngineeredPanel, IndexTable)> {
    let panel = panel.without_entities(&config.excluded_entities);
    let engineered = FeatureEngineer::new(config.windows).engineer(&panel);
    let builder = CompositeIndexBuilder::new(config.weights, config.normalization)?;
    let index = builder.build(&engineered);
    Ok((engineered, index))
}

pub fn train_model(engineered: &EngineeredPanel, index: &IndexTable, config: &PipelineConfig) -> Result<TrainedModel> {
    model::train(engineered, index, &config.training)
}

pub fn forecast(
    model: &TrainedModel,
    engineered: &EngineeredPanel,
    index: &IndexTable,
    config: &PipelineConfig,
    target_year: i32,
) -> ForecastTable {
    Forecaster::new(model, engineered, index, config.forecast).forecast_all(target_year)
}

/// Load the panel at `panel_path` and run every stage
pub fn run(panel_path: &Path, config: &PipelineConfig, target_year: i32) -> Result<PipelineOutput> {
    let panel = storage::load_panel(panel_path)?;
    run_panel(panel, config, target_year)
}

pub fn run_panel(panel: Panel, config: &PipelineConfig, target_year: i32) -> Result<PipelineOutput> {
    let (engineered, index) = build_index(panel, config)?;
    let model = train_model(&engineered, &index, config)?;
    let forecasts = forecast(&model, &engineered, &index, config, target_year);
    Ok(PipelineOutput {
        engineered,
        index,
        model,
        forecasts,
    })
}
