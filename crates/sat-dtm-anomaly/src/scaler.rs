//! ---
//! dtm_section: "03-anomaly-detection"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Per-feature standardizing scaler."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::{AnomalyError, Result};

/// Per-feature z-score standardization fitted on the bootstrap sample.
///
/// Features with zero spread map to 0 instead of dividing by zero, which
/// keeps constant indicator channels inert rather than explosive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl StandardScaler {
    /// Fit means and standard deviations over a row-major sample matrix.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or(AnomalyError::DegenerateSample("empty bootstrap sample"))?;
        let width = first.len();
        if width == 0 {
            return Err(AnomalyError::DegenerateSample("zero-width feature rows"));
        }
        for row in rows {
            if row.len() != width {
                return Err(AnomalyError::DimensionMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
        }

        let count = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= count;
        }

        let mut stddevs = vec![0.0; width];
        for row in rows {
            for ((variance, value), mean) in stddevs.iter_mut().zip(row).zip(&means) {
                let delta = value - mean;
                *variance += delta * delta;
            }
        }
        for variance in &mut stddevs {
            *variance = (*variance / count).sqrt();
        }

        Ok(Self { means, stddevs })
    }

    /// Standardize one row using the fitted statistics (no refitting).
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.means.len() {
            return Err(AnomalyError::DimensionMismatch {
                expected: self.means.len(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.stddevs))
            .map(|(value, (mean, stddev))| {
                if *stddev > 0.0 {
                    (value - mean) / stddev
                } else {
                    0.0
                }
            })
            .collect())
    }

    /// Width of the fitted feature space.
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_rejects_empty_sample() {
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(AnomalyError::DegenerateSample(_))
        ));
    }

    #[test]
    fn fit_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            StandardScaler::fit(&rows),
            Err(AnomalyError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn mean_maps_to_zero() {
        let rows = vec![vec![0.0], vec![2.0], vec![4.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&[2.0]).unwrap();
        assert!(scaled[0].abs() < 1e-12);
    }

    #[test]
    fn constant_feature_scales_to_zero() {
        let rows = vec![vec![5.0, 1.0], vec![5.0, 3.0], vec![5.0, 5.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&[5.0, 9.0]).unwrap();
        assert_eq!(scaled[0], 0.0);
        assert!(scaled[1] > 0.0);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(AnomalyError::DimensionMismatch { .. })
        ));
    }
}
