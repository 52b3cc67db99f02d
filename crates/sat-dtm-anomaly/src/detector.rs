//! ---
//! dtm_section: "03-anomaly-detection"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Bootstrap training and pure telemetry classification."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::path::PathBuf;

use sat_dtm_telemetry::{feature_names, TelemetryGenerator, TelemetryPoint};
use tracing::info;

use crate::artifacts::ModelArtifacts;
use crate::forest::IsolationForest;
use crate::scaler::StandardScaler;
use crate::{AnomalyError, Result};

/// Knobs for the one-shot training pass.
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    /// Number of synthetic points drawn for the bootstrap sample.
    pub bootstrap_samples: usize,
    /// Assumed anomalous share of the bootstrap sample, in `(0, 0.5]`.
    pub contamination: f64,
    /// Trees in the isolation forest.
    pub trees: usize,
    /// Seed for tree construction, fixed for reproducibility.
    pub model_seed: u64,
    /// Seed for the bootstrap generator.
    pub bootstrap_seed: u64,
    /// Fault-injection probability of the bootstrap generator.
    pub bootstrap_fault_probability: f64,
    /// Where to persist the fitted artifacts; `None` skips persistence.
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            bootstrap_samples: 100,
            contamination: 0.05,
            trees: 100,
            model_seed: 42,
            bootstrap_seed: 0x5A7D7,
            bootstrap_fault_probability: sat_dtm_telemetry::DEFAULT_FAULT_PROBABILITY,
            artifacts_dir: None,
        }
    }
}

/// Unsupervised nominal/anomalous classifier over catalog features.
///
/// Training is one-shot and blocking; afterwards the detector is frozen and
/// `classify` is a pure function of `(point, fitted state)`.
#[derive(Debug)]
pub struct AnomalyDetector {
    features: Vec<&'static str>,
    artifacts: ModelArtifacts,
}

impl AnomalyDetector {
    /// Train on a bootstrap sample drawn from a fresh seeded generator.
    pub fn train(options: &TrainingOptions) -> Result<Self> {
        let mut generator = TelemetryGenerator::new(options.bootstrap_seed)
            .with_fault_probability(options.bootstrap_fault_probability);
        Self::train_with_generator(&mut generator, options)
    }

    /// Train against a caller-supplied bootstrap generator.
    pub fn train_with_generator(
        generator: &mut TelemetryGenerator,
        options: &TrainingOptions,
    ) -> Result<Self> {
        if options.bootstrap_samples < 2 {
            return Err(AnomalyError::DegenerateSample(
                "bootstrap needs at least two points",
            ));
        }
        let features: Vec<&'static str> = feature_names().collect();
        let rows: Vec<Vec<f64>> = (0..options.bootstrap_samples)
            .map(|_| {
                let point = generator.generate_next();
                project(&features, &point)
            })
            .collect::<Result<_>>()?;

        let scaler = StandardScaler::fit(&rows)?;
        let scaled: Vec<Vec<f64>> = rows
            .iter()
            .map(|row| scaler.transform(row))
            .collect::<Result<_>>()?;
        let mut forest = IsolationForest::fit(&scaled, options.trees, options.model_seed)?;
        let threshold = forest.calibrate_threshold(&scaled, options.contamination)?;

        info!(
            samples = options.bootstrap_samples,
            trees = options.trees,
            contamination = options.contamination,
            threshold,
            "anomaly model trained"
        );

        let artifacts = ModelArtifacts { scaler, forest };
        if let Some(dir) = &options.artifacts_dir {
            artifacts.save(dir)?;
        }
        Ok(Self::from_artifacts(artifacts))
    }

    /// Wrap already-fitted artifacts (e.g. reloaded from disk).
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        Self {
            features: feature_names().collect(),
            artifacts,
        }
    }

    /// Reload a detector from artifacts previously written by training.
    pub fn load(dir: &std::path::Path) -> Result<Self> {
        Ok(Self::from_artifacts(ModelArtifacts::load(dir)?))
    }

    /// Classify one point: `true` means anomalous.
    ///
    /// Fails with [`AnomalyError::FeatureMismatch`] when the point lacks a
    /// required catalog parameter; it never defaults to a label.
    pub fn classify(&self, point: &TelemetryPoint) -> Result<bool> {
        Ok(self.score(point)? >= self.artifacts.forest.threshold())
    }

    /// Raw anomaly score for one point.
    pub fn score(&self, point: &TelemetryPoint) -> Result<f64> {
        let row = project(&self.features, point)?;
        let scaled = self.artifacts.scaler.transform(&row)?;
        Ok(self.artifacts.forest.score(&scaled))
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

fn project(features: &[&'static str], point: &TelemetryPoint) -> Result<Vec<f64>> {
    features
        .iter()
        .map(|name| {
            point.get(name).ok_or_else(|| AnomalyError::FeatureMismatch {
                parameter: (*name).to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sat_dtm_telemetry::{FaultKind, PARAMETERS};

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn nominal_options() -> TrainingOptions {
        TrainingOptions {
            bootstrap_samples: 100,
            trees: 100,
            bootstrap_fault_probability: 0.0,
            ..TrainingOptions::default()
        }
    }

    #[test]
    fn training_covers_every_catalog_feature() {
        let detector = AnomalyDetector::train(&nominal_options()).unwrap();
        assert_eq!(detector.feature_count(), PARAMETERS.len());
    }

    #[test]
    fn classify_is_pure() {
        let detector = AnomalyDetector::train(&nominal_options()).unwrap();
        let point = TelemetryPoint::nominal(epoch());
        let first = detector.classify(&point).unwrap();
        let second = detector.classify(&point).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_feature_is_rejected_not_defaulted() {
        let detector = AnomalyDetector::train(&nominal_options()).unwrap();
        let incomplete = TelemetryPoint::from_pairs(epoch(), vec![("battery_voltage", 28.0)]);
        match detector.classify(&incomplete) {
            Err(AnomalyError::FeatureMismatch { parameter }) => {
                assert_ne!(parameter, "battery_voltage");
            }
            other => panic!("expected feature mismatch, got {other:?}"),
        }
    }

    #[test]
    fn all_means_point_is_nominal() {
        let detector = AnomalyDetector::train(&nominal_options()).unwrap();
        let point = TelemetryPoint::nominal(epoch());
        assert!(!detector.classify(&point).unwrap());
    }

    #[test]
    fn power_fault_scores_above_nominal() {
        let detector = AnomalyDetector::train(&nominal_options()).unwrap();
        let nominal = TelemetryPoint::nominal(epoch());
        let mut faulted = nominal.clone();
        FaultKind::Power.apply(&mut faulted);
        assert!(detector.score(&faulted).unwrap() > detector.score(&nominal).unwrap());
    }

    #[test]
    fn degenerate_bootstrap_is_fatal() {
        let options = TrainingOptions {
            bootstrap_samples: 1,
            ..TrainingOptions::default()
        };
        assert!(AnomalyDetector::train(&options).is_err());
    }
}
