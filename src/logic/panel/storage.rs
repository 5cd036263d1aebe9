use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::Observation;
use super::Panel;
use crate::error::Result;

/// Load a panel from a JSONL file (one `Observation` per line)
pub fn load_panel(path: &Path) -> Result<Panel> {
    let file = File::open(path)?;
    let panel = read_panel(BufReader::new(file))?;
    log::info!(
        "Loaded panel from {:?}: {} rows, {} countries",
        path,
        panel.len(),
        panel.country_count()
    );
    Ok(panel)
}

/// Parse JSONL observations from any reader; blank lines are skipped
pub fn read_panel<R: BufRead>(reader: R) -> Result<Panel> {
    let mut observations = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let obs: Observation = serde_json::from_str(&line)?;
        observations.push(obs);
    }
    Panel::new(observations)
}
