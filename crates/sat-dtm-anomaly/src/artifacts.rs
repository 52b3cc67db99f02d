//! ---
//! dtm_section: "03-anomaly-detection"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Durable storage for fitted model artifacts."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::forest::IsolationForest;
use crate::scaler::StandardScaler;
use crate::Result;

/// File name for the serialized scaler.
pub const SCALER_FILE: &str = "scaler.json";
/// File name for the serialized forest.
pub const FOREST_FILE: &str = "isolation_forest.json";

/// The fitted (scaler, forest) pair written as a byproduct of training.
///
/// Serialize-then-deserialize must reproduce identical classification
/// behavior; both members carry their full fitted state, including the
/// calibrated decision threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
}

impl ModelArtifacts {
    /// Write both artifacts under `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let scaler_path = dir.join(SCALER_FILE);
        let writer = BufWriter::new(File::create(&scaler_path)?);
        serde_json::to_writer_pretty(writer, &self.scaler)?;

        let forest_path = dir.join(FOREST_FILE);
        let writer = BufWriter::new(File::create(&forest_path)?);
        serde_json::to_writer_pretty(writer, &self.forest)?;

        info!(dir = %dir.display(), "persisted trained model artifacts");
        Ok(())
    }

    /// Load a previously saved pair from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(dir.join(SCALER_FILE))?);
        let scaler: StandardScaler = serde_json::from_reader(reader)?;
        let reader = BufReader::new(File::open(dir.join(FOREST_FILE))?);
        let forest: IsolationForest = serde_json::from_reader(reader)?;
        Ok(Self { scaler, forest })
    }
}
