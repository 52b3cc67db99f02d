//! ---
//! dtm_section: "02-telemetry-simulation"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Seeded synthetic telemetry generation with fault injection."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_distr::Normal;

use crate::catalog::{ParameterSpec, PARAMETERS};
use crate::point::{TelemetryPoint, TIMESTAMP_STEP_SECONDS};

/// Default probability that a generated point carries an injected fault.
pub const DEFAULT_FAULT_PROBABILITY: f64 = 0.5;

/// Correlated fault scenario injected into a freshly sampled point.
///
/// Each scenario perturbs exactly the channels of one subsystem and flips
/// the matching indicator so the excursion is structurally visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    Power,
    Thermal,
    Aocs,
    Payload,
}

impl FaultKind {
    pub const ALL: [FaultKind; 4] = [
        FaultKind::Power,
        FaultKind::Thermal,
        FaultKind::Aocs,
        FaultKind::Payload,
    ];

    /// Apply this scenario to a point in place.
    pub fn apply(&self, point: &mut TelemetryPoint) {
        match self {
            FaultKind::Power => {
                if let Some(voltage) = point.get("battery_voltage") {
                    point.set("battery_voltage", voltage * 0.6);
                }
                point.set("power_anomalies", 1.0);
            }
            FaultKind::Thermal => {
                if let Some(temp) = point.get("internal_temp") {
                    point.set("internal_temp", temp + 20.0);
                }
                point.set("thermal_anomalies", 1.0);
            }
            FaultKind::Aocs => {
                if let Some(rate) = point.get("gyroscope") {
                    point.set("gyroscope", rate * 10.0);
                }
                point.set("aocs_faults", 1.0);
            }
            FaultKind::Payload => {
                point.set("payload_failures", 1.0);
                point.set("data_quality", 0.0);
            }
        }
    }
}

enum Channel {
    Continuous {
        name: &'static str,
        min: f64,
        max: f64,
        normal: Normal<f64>,
    },
    Indicator {
        name: &'static str,
        p_low: f64,
    },
}

/// Produces one telemetry point per call on a fixed simulated cadence.
///
/// Every call succeeds; the only state that advances is the internal RNG
/// and the simulated clock, which moves exactly one step forward per point
/// and never rewinds.
pub struct TelemetryGenerator {
    rng: StdRng,
    last_timestamp: DateTime<Utc>,
    fault_probability: f64,
    channels: Vec<Channel>,
}

impl TelemetryGenerator {
    /// Seeded generator whose first point is stamped roughly "now".
    pub fn new(seed: u64) -> Self {
        Self::with_epoch(seed, Utc::now())
    }

    /// Seeded generator whose first point will be stamped `epoch`.
    pub fn with_epoch(seed: u64, epoch: DateTime<Utc>) -> Self {
        let channels = PARAMETERS
            .iter()
            .map(|param| match param.spec {
                ParameterSpec::Continuous { min, max, mean, stddev } => Channel::Continuous {
                    name: param.name,
                    min,
                    max,
                    normal: Normal::new(mean, stddev).expect("catalog stddev must be positive"),
                },
                ParameterSpec::Indicator { p_low } => Channel::Indicator {
                    name: param.name,
                    p_low,
                },
            })
            .collect();
        Self {
            rng: StdRng::seed_from_u64(seed),
            last_timestamp: epoch - Duration::seconds(TIMESTAMP_STEP_SECONDS),
            fault_probability: DEFAULT_FAULT_PROBABILITY,
            channels,
        }
    }

    /// Override the fault-injection probability (clamped to `[0, 1]`).
    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        self.fault_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Advance the simulated clock and produce the next reading.
    pub fn generate_next(&mut self) -> TelemetryPoint {
        self.last_timestamp += Duration::seconds(TIMESTAMP_STEP_SECONDS);
        let mut point = TelemetryPoint::new(self.last_timestamp);

        for channel in &self.channels {
            match channel {
                Channel::Continuous { name, min, max, normal } => {
                    let sample = normal.sample(&mut self.rng).clamp(*min, *max);
                    point.set(name, sample);
                }
                Channel::Indicator { name, p_low } => {
                    let value = if self.rng.gen_bool(*p_low) { 0.0 } else { 1.0 };
                    point.set(name, value);
                }
            }
        }

        if self.fault_probability > 0.0 && self.rng.gen_bool(self.fault_probability) {
            let kind = FaultKind::ALL[self.rng.gen_range(0..FaultKind::ALL.len())];
            kind.apply(&mut point);
        }

        point
    }
}

impl std::fmt::Debug for TelemetryGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGenerator")
            .field("last_timestamp", &self.last_timestamp)
            .field("fault_probability", &self.fault_probability)
            .field("channels", &self.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{parameter, ParameterSpec};

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn baseline_values_respect_declared_ranges() {
        let mut generator = TelemetryGenerator::with_epoch(7, epoch()).with_fault_probability(0.0);
        for _ in 0..200 {
            let point = generator.generate_next();
            for (name, value) in point.iter() {
                let spec = parameter(name).unwrap().spec;
                let (min, max) = spec.range();
                assert!(
                    (min..=max).contains(&value),
                    "{name}={value} outside [{min}, {max}]"
                );
                if matches!(spec, ParameterSpec::Indicator { .. }) {
                    assert!(value == 0.0 || value == 1.0, "{name} not binary: {value}");
                }
            }
        }
    }

    #[test]
    fn timestamps_advance_by_exactly_one_step() {
        let mut generator = TelemetryGenerator::with_epoch(7, epoch());
        let mut previous = None;
        for tick in 0..10 {
            let point = generator.generate_next();
            if tick == 0 {
                assert_eq!(point.timestamp, epoch());
            }
            if let Some(prev) = previous {
                let delta: Duration = point.timestamp - prev;
                assert_eq!(delta.num_seconds(), TIMESTAMP_STEP_SECONDS);
            }
            previous = Some(point.timestamp);
        }
    }

    #[test]
    fn fixed_seed_reproduces_the_sequence() {
        let mut left = TelemetryGenerator::with_epoch(42, epoch());
        let mut right = TelemetryGenerator::with_epoch(42, epoch());
        for _ in 0..50 {
            assert_eq!(left.generate_next(), right.generate_next());
        }
    }

    #[test]
    fn fault_scenarios_touch_only_their_documented_channels() {
        let baseline = TelemetryPoint::nominal(epoch());
        let expectations: [(FaultKind, &[&str]); 4] = [
            (FaultKind::Power, &["battery_voltage", "power_anomalies"]),
            (FaultKind::Thermal, &["internal_temp", "thermal_anomalies"]),
            (FaultKind::Aocs, &["gyroscope", "aocs_faults"]),
            (FaultKind::Payload, &["payload_failures", "data_quality"]),
        ];
        for (kind, touched) in expectations {
            let mut faulted = baseline.clone();
            kind.apply(&mut faulted);
            for (name, value) in baseline.iter() {
                let after = faulted.get(name).unwrap();
                if touched.contains(&name) {
                    assert_ne!(after, value, "{kind:?} should change {name}");
                } else {
                    assert_eq!(after, value, "{kind:?} must not change {name}");
                }
            }
        }
    }

    #[test]
    fn power_fault_scales_battery_voltage() {
        let mut point = TelemetryPoint::nominal(epoch());
        FaultKind::Power.apply(&mut point);
        assert_eq!(point.get("battery_voltage"), Some(28.0 * 0.6));
        assert_eq!(point.get("power_anomalies"), Some(1.0));
    }

    #[test]
    fn payload_fault_zeroes_data_quality() {
        let mut point = TelemetryPoint::nominal(epoch());
        FaultKind::Payload.apply(&mut point);
        assert_eq!(point.get("payload_failures"), Some(1.0));
        assert_eq!(point.get("data_quality"), Some(0.0));
    }
}
