//! ---
//! dtm_section: "03-anomaly-detection"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Unsupervised anomaly scoring over standardized telemetry."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Unsupervised anomaly scoring for SAT-DTM telemetry.
//!
//! A standardizing scaler and an isolation forest are fitted once on a
//! bootstrap sample of synthetic telemetry; afterwards classification is a
//! pure function of the frozen model state.

/// Result alias used throughout the anomaly crate.
pub type Result<T> = std::result::Result<T, AnomalyError>;

/// Error type for the scoring pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AnomalyError {
    /// A point handed to `classify` is missing a required catalog feature.
    #[error("feature mismatch: point is missing required parameter `{parameter}`")]
    FeatureMismatch { parameter: String },
    /// The bootstrap sample cannot support model fitting.
    #[error("degenerate training sample: {0}")]
    DegenerateSample(&'static str),
    /// A row's width does not match the fitted feature space.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Wrapper for IO errors while persisting or loading model artifacts.
    #[error("model artifact io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization issues in model artifacts.
    #[error("model artifact serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub mod artifacts;
pub mod detector;
pub mod forest;
pub mod scaler;

pub use artifacts::{ModelArtifacts, FOREST_FILE, SCALER_FILE};
pub use detector::{AnomalyDetector, TrainingOptions};
pub use forest::IsolationForest;
pub use scaler::StandardScaler;
