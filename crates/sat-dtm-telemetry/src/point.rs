//! ---
//! dtm_section: "02-telemetry-simulation"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Timestamped multivariate telemetry readings."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::PARAMETERS;

/// Simulated sampling cadence: one point per simulated minute.
pub const TIMESTAMP_STEP_SECONDS: i64 = 60;

/// One timestamped multivariate sensor reading.
///
/// Values are keyed by catalog parameter name and iterate in catalog order,
/// which is also the feature order the scoring pipeline relies on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryPoint {
    pub timestamp: DateTime<Utc>,
    values: IndexMap<&'static str, f64>,
}

impl TelemetryPoint {
    /// Create an empty point; values are filled in catalog order.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: IndexMap::with_capacity(PARAMETERS.len()),
        }
    }

    /// Build a point from `(name, value)` pairs, resolving each name against
    /// the catalog so the map keeps canonical ordering and static keys.
    /// Unknown names are skipped.
    pub fn from_pairs<'a, I>(timestamp: DateTime<Utc>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut point = Self::new(timestamp);
        let mut supplied: Vec<(&str, f64)> = pairs.into_iter().collect();
        for param in PARAMETERS {
            if let Some(pos) = supplied.iter().position(|(name, _)| *name == param.name) {
                let (_, value) = supplied.swap_remove(pos);
                point.values.insert(param.name, value);
            }
        }
        point
    }

    /// Point with every continuous parameter at its configured mean and
    /// every indicator at 0. Used by calibration checks and tests.
    pub fn nominal(timestamp: DateTime<Utc>) -> Self {
        let mut point = Self::new(timestamp);
        for param in PARAMETERS {
            point.values.insert(param.name, param.spec.nominal());
        }
        point
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &'static str, value: f64) {
        self.values.insert(name, value);
    }

    /// Iterate `(name, value)` in catalog insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().map(|(name, value)| (*name, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
