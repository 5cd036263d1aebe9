//! Climate Impact Index - Command Line Entry Point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use climate_impact_index::constants::{get_model_path, APP_NAME, APP_VERSION};
use climate_impact_index::logic::config::PipelineConfig;
use climate_impact_index::logic::model::{self, Forecaster};
use climate_impact_index::logic::panel::storage;
use climate_impact_index::logic::{export, pipeline};

#[derive(Parser, Debug)]
#[command(name = "climate-index", version, about = "Climate Impact Index builder and forecaster")]
struct Cli {
    /// Pipeline config (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds the composite index table.
    Index {
        #[arg(long)]
        panel: PathBuf,
        #[arg(long, default_value = "climate_index.jsonl")]
        out: PathBuf,
    },
    /// Trains and saves the forecasting model.
    Train {
        #[arg(long)]
        panel: PathBuf,
        /// Artifact path; defaults to the platform data directory
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Forecasts with a saved model.
    Predict {
        #[arg(long)]
        panel: PathBuf,
        #[arg(long)]
        target_year: i32,
        #[arg(long)]
        model: Option<PathBuf>,
        /// Single country; all eligible countries when omitted
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Runs index, training and forecasting in one go.
    Run {
        #[arg(long)]
        panel: PathBuf,
        #[arg(long)]
        target_year: i32,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long, default_value = "climate_index.jsonl")]
        index_out: PathBuf,
        #[arg(long, default_value = "climate_forecast.json")]
        forecast_out: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let config = PipelineConfig::load(cli.config.as_deref()).context("loading pipeline config")?;

    match cli.command {
        Commands::Index { panel, out } => {
            let panel = storage::load_panel(&panel).context("loading panel")?;
            let (_, index) = pipeline::build_index(panel, &config)?;
            export::save_index(&index, &out)?;
        }
        Commands::Train { panel, model: model_path } => {
            let panel = storage::load_panel(&panel).context("loading panel")?;
            let (engineered, index) = pipeline::build_index(panel, &config)?;
            let trained = pipeline::train_model(&engineered, &index, &config)?;
            let path = model_path.unwrap_or_else(get_model_path);
            model::save_model(&trained, &path).with_context(|| format!("saving model to {}", path.display()))?;

            log::info!("Validation R2: {:.4} ({:?})", trained.validation_r2(), trained.validation.fold_r2);
            for entry in trained.ranked_importances().iter().take(5) {
                log::info!("  {:<28} {:.4}", entry.feature, entry.importance);
            }
        }
        Commands::Predict {
            panel,
            target_year,
            model: model_path,
            country,
            out,
        } => {
            let path = model_path.unwrap_or_else(get_model_path);
            let trained = model::load_model(&path).with_context(|| format!("loading model from {}", path.display()))?;
            let panel = storage::load_panel(&panel).context("loading panel")?;
            let (engineered, index) = pipeline::build_index(panel, &config)?;

            match country {
                Some(code) => {
                    let forecaster = Forecaster::new(&trained, &engineered, &index, config.forecast);
                    let forecast = forecaster.forecast_country(&code, target_year)?;
                    println!("{}", serde_json::to_string_pretty(&forecast)?);
                }
                None => {
                    let table = pipeline::forecast(&trained, &engineered, &index, &config, target_year);
                    match out {
                        Some(out) => export::save_forecasts(&table, &out)?,
                        None => println!("{}", serde_json::to_string_pretty(&table)?),
                    }
                }
            }
        }
        Commands::Run {
            panel,
            target_year,
            model: model_path,
            index_out,
            forecast_out,
        } => {
            let output = pipeline::run(&panel, &config, target_year)?;
            export::save_index(&output.index, &index_out)?;
            let path = model_path.unwrap_or_else(get_model_path);
            model::save_model(&output.model, &path)?;
            export::save_forecasts(&output.forecasts, &forecast_out)?;
            log::info!(
                "Done: {} index rows, {} forecasts, R2 {:.4}",
                output.index.len(),
                output.forecasts.forecasts.len(),
                output.model.validation_r2()
            );
        }
    }

    Ok(())
}
