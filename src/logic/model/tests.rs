//! Integration tests for training, storage and forecasting

use std::fs;

use super::dataset::build_training_set;
use super::inference::extrapolate;
use super::*;
use crate::error::ClimateIndexError;
use crate::logic::config::{
    ExtrapolationPolicy, ForecastConfig, ForestConfig, IndexWeights, NormalizationConfig, PredictionTarget,
    TrainingConfig,
};
use crate::logic::features::layout::*;
use crate::logic::features::{EngineeredPanel, FeatureEngineer, FeatureVector};
use crate::logic::index::{CompositeIndexBuilder, IndexTable};
use crate::logic::panel::{Hazard, HazardMetrics, Observation, Panel};

const COUNTRIES: [&str; 6] = ["ARG", "BGD", "CHN", "DEU", "ETH", "FJI"];

fn observation(country: &str, c: usize, year: i32) -> Observation {
    let t = (year - 2000) as f64;
    let c = c as f64;
    Observation::new(country, year)
        .with_hazard(
            Hazard::Flood,
            HazardMetrics {
                affected_per_100k: Some(10.0 * (c + 1.0) + t * c),
                deaths_per_100k: Some((t * 0.7 + c).sin().abs()),
                total_affected: Some(1000.0 * (c + 1.0) + 50.0 * t),
                total_deaths: Some(c * 3.0 + t),
                economic_damage_pct_gdp: Some(0.1 * c),
            },
        )
        .with_hazard(
            Hazard::Storm,
            HazardMetrics {
                affected_per_100k: Some(((c + 2.0) * t) % 7.0),
                ..Default::default()
            },
        )
}

fn synthetic_panel() -> Panel {
    let mut observations = Vec::new();
    for (c, country) in COUNTRIES.iter().enumerate() {
        for year in 2000..2010 {
            observations.push(observation(country, c, year));
        }
    }
    // Short history: only three years
    for year in 2007..2010 {
        observations.push(observation("GUY", 7, year));
    }
    Panel::new(observations).unwrap()
}

fn pipeline() -> (EngineeredPanel, IndexTable) {
    let engineered = FeatureEngineer::default().engineer(&synthetic_panel());
    let builder = CompositeIndexBuilder::new(IndexWeights::default(), NormalizationConfig::default()).unwrap();
    let index = builder.build(&engineered);
    (engineered, index)
}

fn training_config() -> TrainingConfig {
    TrainingConfig {
        forest: ForestConfig {
            trees: 20,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn trained() -> (EngineeredPanel, IndexTable, TrainedModel) {
    let (engineered, index) = pipeline();
    let model = train(&engineered, &index, &training_config()).unwrap();
    (engineered, index, model)
}

#[test]
fn test_training_pairs_respect_cutoff_and_gaps() {
    let panel = Panel::new(vec![
        observation("AAA", 0, 2000),
        observation("AAA", 0, 2001),
        observation("AAA", 0, 2003),
        observation("AAA", 0, 2004),
        observation("AAA", 0, 2005),
    ])
    .unwrap();
    let engineered = FeatureEngineer::default().engineer(&panel);
    let index = CompositeIndexBuilder::new(IndexWeights::default(), NormalizationConfig::default())
        .unwrap()
        .build(&engineered);

    let set = build_training_set(&engineered, &index, PredictionTarget::NextComposite, 2004);
    let years: Vec<i32> = set.keys.iter().map(|(_, y)| *y).collect();
    // 2001 -> 2003 is a gap, 2004 -> 2005 is past the cutoff
    assert_eq!(years, vec![2000, 2003]);
    assert_eq!(set.x.dim(), (2, FEATURE_COUNT));
    assert_eq!(set.y[0], index.composite("AAA", 2001).unwrap());

    let impact = build_training_set(&engineered, &index, PredictionTarget::NextImpact, 2005);
    assert_eq!(impact.len(), 3);
    assert_eq!(impact.y[2], engineered.country("AAA").unwrap()[4].impact_rebased);
}

#[test]
fn test_model_metadata() {
    let (_, _, model) = trained();
    assert_eq!(model.trained_through, 2009);
    assert_eq!(model.target, PredictionTarget::NextComposite);
    assert_eq!(model.training_rows, 6 * 9 + 2);
    assert!(model.knows_country("GUY"));
    assert_eq!(model.schema, crate::logic::features::LayoutInfo::current());
    assert_eq!(model.validation.fold_r2.len(), 3);
    assert_eq!(model.feature_importances.len(), FEATURE_COUNT);
    assert_eq!(model.ranked_importances().len(), FEATURE_COUNT);
}

#[test]
fn test_training_is_deterministic() {
    let (engineered, index, first) = trained();
    let second = train(&engineered, &index, &training_config()).unwrap();
    assert_eq!(first.forest, second.forest);
    assert_eq!(first.validation, second.validation);
    assert_ne!(first.id, second.id);

    let vector = &engineered.country("CHN").unwrap()[9].features;
    assert_eq!(first.predict(vector).unwrap(), first.predict(vector).unwrap());
    assert_eq!(first.predict(vector).unwrap(), second.predict(vector).unwrap());
}

#[test]
fn test_insufficient_training_data() {
    let panel = Panel::new(vec![observation("AAA", 0, 2000), observation("AAA", 0, 2001)]).unwrap();
    let engineered = FeatureEngineer::default().engineer(&panel);
    let index = CompositeIndexBuilder::new(IndexWeights::default(), NormalizationConfig::default())
        .unwrap()
        .build(&engineered);
    match train(&engineered, &index, &training_config()) {
        Err(ClimateIndexError::InsufficientTrainingData { needed, available }) => {
            assert_eq!(needed, 3);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientTrainingData, got {:?}", other.map(|m| m.id)),
    }
}

#[test]
fn test_schema_validation_at_inference() {
    let (_, _, model) = trained();
    let values = [0.5; FEATURE_COUNT];
    assert!(model.predict_named(FEATURE_LAYOUT, &values).is_ok());

    let mut names = FEATURE_LAYOUT.to_vec();
    names.swap(11, 12);
    assert!(matches!(
        model.predict_named(&names, &values),
        Err(ClimateIndexError::SchemaMismatch { .. })
    ));
    assert!(matches!(
        model.predict_named(&FEATURE_LAYOUT[..17], &values[..17]),
        Err(ClimateIndexError::SchemaMismatch { .. })
    ));

    let mut stale = FeatureVector::from_values(values);
    stale.version = FEATURE_VERSION + 1;
    assert!(matches!(model.predict(&stale), Err(ClimateIndexError::LayoutMismatch { .. })));
}

#[test]
fn test_unknown_country_fails_loudly() {
    let (engineered, index, model) = trained();
    let forecaster = Forecaster::new(&model, &engineered, &index, ForecastConfig::default());
    match forecaster.forecast_country("ATL", 2011) {
        Err(ClimateIndexError::UnknownCountry { country }) => assert_eq!(country, "ATL"),
        other => panic!("expected UnknownCountry, got {:?}", other),
    }
}

#[test]
fn test_no_anchor_before_history() {
    let (engineered, index, model) = trained();
    let forecaster = Forecaster::new(&model, &engineered, &index, ForecastConfig::default());
    assert!(matches!(
        forecaster.forecast_country("ARG", 2000),
        Err(ClimateIndexError::NoAnchor { target_year: 2000, .. })
    ));
}

#[test]
fn test_forecast_uses_latest_anchor() {
    let (engineered, index, model) = trained();
    let forecaster = Forecaster::new(&model, &engineered, &index, ForecastConfig::default());

    let forecast = forecaster.forecast_country("BGD", 2012).unwrap();
    assert_eq!(forecast.anchor_year, 2009);
    assert_eq!(forecast.horizon, 2);
    assert_eq!(forecast.anchor_composite, index.composite("BGD", 2009));

    let anchor = &engineered.country("BGD").unwrap()[9].features;
    assert_eq!(forecast.predicted, model.predict(anchor).unwrap());

    // In-range targets anchor on the year before
    assert_eq!(forecaster.forecast_country("BGD", 2005).unwrap().anchor_year, 2004);
}

#[test]
fn test_trend_with_zero_horizon_equals_repeat_last() {
    let (engineered, index, model) = trained();
    let repeat = Forecaster::new(&model, &engineered, &index, ForecastConfig::default());
    let trend_config = ForecastConfig {
        extrapolation: ExtrapolationPolicy::Trend,
        ..Default::default()
    };
    let trend = Forecaster::new(&model, &engineered, &index, trend_config);

    let a = repeat.forecast_country("DEU", 2010).unwrap();
    let b = trend.forecast_country("DEU", 2010).unwrap();
    assert_eq!(a.horizon, 0);
    assert_eq!(a.predicted, b.predicted);
}

#[test]
fn test_trend_extrapolation_clamps_bounds() {
    let (engineered, _) = pipeline();
    let rows = engineered.country("ETH").unwrap();
    let mut previous = rows[8].clone();
    previous.features.values[IDX_HAZARD_COUNT] = 0.0;
    previous.features.values[IDX_LOG_TOTAL_DEATH] = 50.0;

    let v = extrapolate(&rows[9], Some(&previous), 10, ExtrapolationPolicy::Trend);
    assert!(v.values[IDX_HAZARD_COUNT] <= 4.0);
    assert!(v.values[IDX_LOG_TOTAL_DEATH] >= 0.0);
    assert!(v.validate().is_ok());

    let slope = rows[9].features.values[IDX_LOG_TOTAL_AFFECTED] - rows[8].features.values[IDX_LOG_TOTAL_AFFECTED];
    let expected = (rows[9].features.values[IDX_LOG_TOTAL_AFFECTED] + 10.0 * slope).max(0.0);
    assert!((v.values[IDX_LOG_TOTAL_AFFECTED] - expected).abs() < 1e-12);

    let repeat = extrapolate(&rows[9], Some(&previous), 10, ExtrapolationPolicy::RepeatLast);
    assert_eq!(repeat, rows[9].features);
}

#[test]
fn test_forecast_all_skips_short_history() {
    let (engineered, index, model) = trained();
    let forecaster = Forecaster::new(&model, &engineered, &index, ForecastConfig::default());
    let table = forecaster.forecast_all(2011);

    assert_eq!(table.forecasts.len(), COUNTRIES.len());
    assert!(table.get("GUY").is_none());
    assert_eq!(table.skipped.len(), 1);
    assert_eq!(table.skipped[0].0, "GUY");
    assert_eq!(table.model_id, model.id);
    assert_eq!(table.validation_r2, model.validation_r2());
    assert_eq!(table.ranked().len(), COUNTRIES.len());

    // Single-country forecasts only need training membership
    assert!(forecaster.forecast_country("GUY", 2011).is_ok());
}

#[test]
fn test_forecast_all_skips_stale_anchor() {
    let (engineered, index, model) = trained();
    let config = ForecastConfig {
        max_anchor_staleness: 1,
        ..Default::default()
    };
    let table = Forecaster::new(&model, &engineered, &index, config).forecast_all(2015);
    assert!(table.forecasts.is_empty());
    assert_eq!(table.skipped.len(), COUNTRIES.len() + 1);
}

// ============================================================================
// STORAGE
// ============================================================================

#[test]
fn test_artifact_round_trip_preserves_predictions() {
    let (engineered, _, model) = trained();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model_v1.json");

    save_model(&model, &path).unwrap();
    let loaded = load_model(&path).unwrap();
    assert_eq!(loaded, model);

    for (_, row) in engineered.rows() {
        let a = model.predict(&row.features).unwrap();
        let b = loaded.predict(&row.features).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_tampered_artifact_rejected() {
    let (_, _, model) = trained();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_v1.json");
    save_model(&model, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let original = format!("\"trained_through\":{}", model.trained_through);
    assert!(text.contains(&original));
    let tampered = text.replace(&original, "\"trained_through\":1999");
    fs::write(&path, tampered).unwrap();

    assert!(matches!(load_model(&path), Err(ClimateIndexError::ChecksumMismatch { .. })));
}

#[test]
fn test_foreign_layout_artifact_rejected() {
    let (_, _, mut model) = trained();
    model.schema.hash ^= 0xDEAD;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_v1.json");
    save_model(&model, &path).unwrap();

    assert!(matches!(load_model(&path), Err(ClimateIndexError::LayoutMismatch { .. })));
}

#[test]
fn test_unsupported_format_and_missing_file() {
    let (_, _, model) = trained();
    let mut artifact = ModelArtifact::seal(&model).unwrap();
    artifact.format_version = 99;
    assert!(matches!(
        artifact.open(),
        Err(ClimateIndexError::UnsupportedModelFormat { found: 99, .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_model(&dir.path().join("absent.json")),
        Err(ClimateIndexError::Io(_))
    ));
}
