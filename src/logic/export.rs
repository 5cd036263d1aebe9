//! Output writers for the presentation layer
//!
//! Index table as JSONL (one `IndexRecord` per line), forecast table as a
//! single pretty JSON document.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::logic::index::IndexTable;
use crate::logic::model::ForecastTable;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_index_jsonl<W: Write>(table: &IndexTable, mut writer: W) -> Result<usize> {
    for record in table.records() {
        let line = serde_json::to_string(record)?;
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(table.len())
}

/// Write the index table to `path`, returning the number of records
pub fn save_index(table: &IndexTable, path: &Path) -> Result<usize> {
    ensure_parent(path)?;
    let count = write_index_jsonl(table, BufWriter::new(File::create(path)?))?;
    log::info!("Exported {} index records to {:?}", count, path);
    Ok(count)
}

pub fn save_forecasts(table: &ForecastTable, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_vec_pretty(table)?;
    fs::write(path, json)?;
    log::info!(
        "Exported {} forecasts for {} to {:?}",
        table.forecasts.len(),
        table.target_year,
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::{IndexWeights, NormalizationConfig, PredictionTarget};
    use crate::logic::features::FeatureEngineer;
    use crate::logic::index::{CompositeIndexBuilder, IndexRecord};
    use crate::logic::panel::{Hazard, HazardMetrics, Observation, Panel};

    fn table() -> IndexTable {
        let observations = (0..3)
            .map(|i| {
                Observation::new("MOZ", 2000 + i).with_hazard(
                    Hazard::Flood,
                    HazardMetrics {
                        affected_per_100k: Some(i as f64 * 4.0),
                        ..Default::default()
                    },
                )
            })
            .collect();
        let engineered = FeatureEngineer::default().engineer(&Panel::new(observations).unwrap());
        CompositeIndexBuilder::new(IndexWeights::default(), NormalizationConfig::default())
            .unwrap()
            .build(&engineered)
    }

    #[test]
    fn test_index_jsonl_lines_parse_back() {
        let table = table();
        let mut buffer = Vec::new();
        assert_eq!(write_index_jsonl(&table, &mut buffer).unwrap(), 3);

        let text = String::from_utf8(buffer).unwrap();
        let records: Vec<IndexRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(records, table.records());
        assert!(text.lines().next().unwrap().contains("\"composite\""));
    }

    #[test]
    fn test_save_files() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("out").join("index.jsonl");
        assert_eq!(save_index(&table(), &index_path).unwrap(), 3);
        assert!(index_path.exists());

        let forecasts = ForecastTable {
            target_year: 2030,
            target: PredictionTarget::NextComposite,
            model_id: "test".into(),
            validation_r2: 0.5,
            forecasts: Vec::new(),
            skipped: vec![("XYZ".into(), "too short".into())],
        };
        let forecast_path = dir.path().join("forecast.json");
        save_forecasts(&forecasts, &forecast_path).unwrap();
        let back: ForecastTable = serde_json::from_slice(&fs::read(&forecast_path).unwrap()).unwrap();
        assert_eq!(back, forecasts);
    }
}
