//! ---
//! dtm_section: "03-anomaly-detection"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Isolation forest with contamination-calibrated threshold."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Isolation-forest outlier model.
//!
//! Anomalies are easier to isolate with random axis-parallel splits and
//! therefore end up with shorter average path lengths across the trees.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{AnomalyError, Result};

const EULER_MASCHERONI: f64 = 0.577_215_664_9;

/// Largest per-tree subsample drawn from the training matrix.
const MAX_SUBSAMPLE: usize = 256;

/// Ensemble of isolation trees with a decision threshold calibrated from a
/// contamination fraction. Fitted once; scoring never mutates the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample: usize,
    threshold: f64,
    avg_path_length: f64,
}

impl IsolationForest {
    /// Build `num_trees` trees over bootstrap subsamples of `data`.
    pub fn fit(data: &[Vec<f64>], num_trees: usize, seed: u64) -> Result<Self> {
        let first = data
            .first()
            .ok_or(AnomalyError::DegenerateSample("empty training matrix"))?;
        let n_features = first.len();
        if n_features == 0 {
            return Err(AnomalyError::DegenerateSample("zero-width training rows"));
        }
        if num_trees == 0 {
            return Err(AnomalyError::DegenerateSample("forest needs at least one tree"));
        }

        let subsample = data.len().min(MAX_SUBSAMPLE);
        let max_depth = (subsample as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(num_trees);
        for _ in 0..num_trees {
            let sample: Vec<&[f64]> = (0..subsample)
                .map(|_| data[rng.gen_range(0..data.len())].as_slice())
                .collect();
            trees.push(IsolationTree::build(&sample, n_features, max_depth, &mut rng));
        }

        Ok(Self {
            trees,
            subsample,
            threshold: 0.5,
            avg_path_length: average_path_length(subsample),
        })
    }

    /// Anomaly score in `(0, 1)`: `2^(-E[h(x)] / c(subsample))`.
    pub fn score(&self, sample: &[f64]) -> f64 {
        if self.trees.is_empty() || self.avg_path_length == 0.0 {
            return 0.5;
        }
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(sample))
            .sum();
        let mean_path = total / self.trees.len() as f64;
        2.0_f64.powf(-mean_path / self.avg_path_length)
    }

    /// Set the decision threshold so that `contamination` of the training
    /// matrix scores as anomalous, and return it.
    pub fn calibrate_threshold(&mut self, data: &[Vec<f64>], contamination: f64) -> Result<f64> {
        if data.is_empty() {
            return Err(AnomalyError::DegenerateSample("empty calibration matrix"));
        }
        if !(0.0..=0.5).contains(&contamination) || contamination == 0.0 {
            return Err(AnomalyError::DegenerateSample(
                "contamination must lie in (0, 0.5]",
            ));
        }
        let mut scores: Vec<f64> = data.iter().map(|row| self.score(row)).collect();
        scores.sort_by(f64::total_cmp);
        let cut = ((scores.len() as f64) * (1.0 - contamination)).floor() as usize;
        self.threshold = scores[cut.min(scores.len() - 1)];
        Ok(self.threshold)
    }

    /// Binary decision against the calibrated threshold.
    pub fn predict(&self, sample: &[f64]) -> bool {
        self.score(sample) >= self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Expected path length of an unsuccessful BST search over `n` items.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationTree {
    root: Option<Box<IsolationNode>>,
}

impl IsolationTree {
    fn build<R: Rng>(samples: &[&[f64]], n_features: usize, max_depth: usize, rng: &mut R) -> Self {
        let root = Self::build_node(samples, n_features, 0, max_depth, rng);
        Self { root }
    }

    fn build_node<R: Rng>(
        samples: &[&[f64]],
        n_features: usize,
        depth: usize,
        max_depth: usize,
        rng: &mut R,
    ) -> Option<Box<IsolationNode>> {
        if samples.is_empty() {
            return None;
        }
        if depth >= max_depth || samples.len() <= 1 {
            return Some(Box::new(IsolationNode::Leaf { size: samples.len() }));
        }

        let feature_idx = rng.gen_range(0..n_features);
        let mut min_val = f64::MAX;
        let mut max_val = f64::MIN;
        for sample in samples {
            let val = sample[feature_idx];
            min_val = min_val.min(val);
            max_val = max_val.max(val);
        }
        // all values identical along the chosen axis
        if max_val - min_val <= f64::EPSILON {
            return Some(Box::new(IsolationNode::Leaf { size: samples.len() }));
        }

        let split_value = rng.gen_range(min_val..max_val);
        let (left_samples, right_samples): (Vec<&[f64]>, Vec<&[f64]>) = samples
            .iter()
            .copied()
            .partition(|sample| sample[feature_idx] < split_value);

        let left = Self::build_node(&left_samples, n_features, depth + 1, max_depth, rng);
        let right = Self::build_node(&right_samples, n_features, depth + 1, max_depth, rng);
        Some(Box::new(IsolationNode::Internal {
            feature_idx,
            split_value,
            left,
            right,
        }))
    }

    fn path_length(&self, sample: &[f64]) -> f64 {
        match &self.root {
            None => 0.0,
            Some(node) => Self::node_path_length(node, sample, 0),
        }
    }

    fn node_path_length(node: &IsolationNode, sample: &[f64], depth: usize) -> f64 {
        match node {
            IsolationNode::Leaf { size } => depth as f64 + average_path_length(*size),
            IsolationNode::Internal {
                feature_idx,
                split_value,
                left,
                right,
            } => {
                let value = sample.get(*feature_idx).copied().unwrap_or(0.0);
                let next = if value < *split_value { left } else { right };
                match next {
                    Some(child) => Self::node_path_length(child, sample, depth + 1),
                    None => depth as f64 + 1.0,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsolationNode {
    Internal {
        feature_idx: usize,
        split_value: f64,
        left: Option<Box<IsolationNode>>,
        right: Option<Box<IsolationNode>>,
    },
    Leaf {
        size: usize,
    },
}
