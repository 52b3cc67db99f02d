//! ---
//! dtm_section: "02-telemetry-simulation"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Static parameter catalog for the simulated spacecraft."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use serde::Serialize;

/// Spacecraft subsystem a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    Power,
    Thermal,
    Navigation,
    Communications,
    Payload,
    Diagnostics,
}

/// Generation rule for a single parameter.
///
/// Continuous channels draw a Gaussian sample clipped to `[min, max]`;
/// indicator channels are 0 with probability `p_low`, else 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParameterSpec {
    Continuous {
        min: f64,
        max: f64,
        mean: f64,
        stddev: f64,
    },
    Indicator {
        p_low: f64,
    },
}

impl ParameterSpec {
    /// Declared value range. Indicators are always bounded by `[0, 1]`.
    pub fn range(&self) -> (f64, f64) {
        match *self {
            ParameterSpec::Continuous { min, max, .. } => (min, max),
            ParameterSpec::Indicator { .. } => (0.0, 1.0),
        }
    }

    /// Nominal central value used for display and test fixtures.
    pub fn nominal(&self) -> f64 {
        match *self {
            ParameterSpec::Continuous { mean, .. } => mean,
            ParameterSpec::Indicator { .. } => 0.0,
        }
    }
}

/// One catalog entry: generation rule plus display metadata.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Parameter {
    pub name: &'static str,
    pub subsystem: Subsystem,
    pub unit: &'static str,
    pub spec: ParameterSpec,
}

const fn continuous(
    name: &'static str,
    subsystem: Subsystem,
    unit: &'static str,
    min: f64,
    max: f64,
    mean: f64,
    stddev: f64,
) -> Parameter {
    Parameter {
        name,
        subsystem,
        unit,
        spec: ParameterSpec::Continuous {
            min,
            max,
            mean,
            stddev,
        },
    }
}

const fn indicator(
    name: &'static str,
    subsystem: Subsystem,
    p_low: f64,
) -> Parameter {
    Parameter {
        name,
        subsystem,
        unit: "",
        spec: ParameterSpec::Indicator { p_low },
    }
}

/// Full modeled-parameter catalog, in the canonical feature order used by
/// generation, scoring, and persistence alike.
pub const PARAMETERS: &[Parameter] = &[
    // Power systems
    continuous("battery_voltage", Subsystem::Power, "V", 25.0, 31.5, 28.0, 1.0),
    continuous("battery_current", Subsystem::Power, "A", 3.5, 6.5, 5.0, 0.5),
    continuous("state_of_charge", Subsystem::Power, "%", 65.0, 98.0, 80.0, 2.0),
    continuous("solar_panel_voltage", Subsystem::Power, "V", 92.0, 108.0, 100.0, 3.0),
    continuous("solar_panel_current", Subsystem::Power, "A", 6.5, 9.5, 8.0, 0.4),
    continuous("solar_panel_efficiency", Subsystem::Power, "%", 18.0, 26.0, 22.0, 1.5),
    continuous("power_consumption", Subsystem::Power, "W", 130.0, 170.0, 150.0, 5.0),
    // Thermal systems
    continuous("internal_temp", Subsystem::Thermal, "°C", 18.0, 33.0, 25.0, 2.0),
    continuous("battery_temp", Subsystem::Thermal, "°C", 26.0, 34.0, 30.0, 1.5),
    continuous("solar_panel_temp", Subsystem::Thermal, "°C", 32.0, 45.0, 40.0, 3.0),
    continuous("radiator_temp", Subsystem::Thermal, "°C", 16.0, 24.0, 20.0, 1.5),
    continuous("radiator_efficiency", Subsystem::Thermal, "%", 80.0, 92.0, 85.0, 2.0),
    continuous("thermal_gradient", Subsystem::Thermal, "°C", 4.0, 6.0, 5.0, 0.5),
    // Navigation and attitude control
    continuous("position", Subsystem::Navigation, "km", 350.0, 480.0, 400.0, 30.0),
    continuous("velocity", Subsystem::Navigation, "km/s", 7.5, 7.7, 7.6, 0.05),
    continuous("gyroscope", Subsystem::Navigation, "rad/s", 0.01, 0.08, 0.05, 0.005),
    continuous("magnetometer_rpm", Subsystem::Navigation, "RPM", 4850.0, 5150.0, 5000.0, 75.0),
    continuous("reaction_wheel_rpm", Subsystem::Navigation, "RPM", 2950.0, 3050.0, 3000.0, 25.0),
    // Communications
    indicator("thruster_status", Subsystem::Communications, 0.98),
    continuous("signal_strength", Subsystem::Communications, "dBm", -75.0, -62.0, -70.0, 3.0),
    continuous("data_rate", Subsystem::Communications, "Mbps", 95.0, 105.0, 100.0, 2.5),
    continuous("packet_loss", Subsystem::Communications, "%", 0.0, 3.0, 0.5, 0.2),
    // Payload and sensors
    continuous("payload_power", Subsystem::Payload, "W", 47.0, 53.0, 50.0, 1.5),
    continuous("sensor_data_rate", Subsystem::Payload, "Mbps", 9.5, 10.5, 10.0, 0.3),
    continuous("camera_temp", Subsystem::Payload, "°C", 12.0, 18.0, 15.0, 1.5),
    continuous("data_quality", Subsystem::Payload, "%", 97.0, 100.0, 98.5, 0.5),
    // Diagnostics: error handling, latency, fault channels
    indicator("error_flags", Subsystem::Diagnostics, 0.98),
    continuous("latency", Subsystem::Diagnostics, "ms", 150.0, 250.0, 200.0, 25.0),
    continuous("bit_error_rate", Subsystem::Diagnostics, "", 1e-7, 1e-5, 5e-6, 1e-6),
    indicator("sensor_discrepancies", Subsystem::Diagnostics, 0.99),
    indicator("thruster_malfunctions", Subsystem::Diagnostics, 0.995),
    continuous("thruster_efficiency", Subsystem::Diagnostics, "%", 92.0, 98.0, 95.0, 1.5),
    continuous("orientation", Subsystem::Diagnostics, "°", -8.0, 8.0, 0.0, 2.0),
    continuous("throughput", Subsystem::Diagnostics, "%", 93.0, 98.0, 95.0, 1.5),
    indicator("power_anomalies", Subsystem::Diagnostics, 0.97),
    indicator("thermal_anomalies", Subsystem::Diagnostics, 0.97),
    indicator("aocs_faults", Subsystem::Diagnostics, 0.98),
    indicator("payload_failures", Subsystem::Diagnostics, 0.98),
];

/// Look up a catalog entry by parameter name.
pub fn parameter(name: &str) -> Option<&'static Parameter> {
    PARAMETERS.iter().find(|param| param.name == name)
}

/// Canonical feature names in catalog order.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    PARAMETERS.iter().map(|param| param.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique() {
        for (idx, param) in PARAMETERS.iter().enumerate() {
            assert!(
                PARAMETERS[idx + 1..].iter().all(|other| other.name != param.name),
                "duplicate catalog entry {}",
                param.name
            );
        }
    }

    #[test]
    fn continuous_bounds_are_ordered() {
        for param in PARAMETERS {
            if let ParameterSpec::Continuous { min, max, mean, stddev } = param.spec {
                assert!(min < max, "{} bounds inverted", param.name);
                assert!(min <= mean && mean <= max, "{} mean outside bounds", param.name);
                assert!(stddev > 0.0, "{} stddev must be positive", param.name);
            }
        }
    }

    #[test]
    fn indicator_probabilities_are_valid() {
        for param in PARAMETERS {
            if let ParameterSpec::Indicator { p_low } = param.spec {
                assert!((0.0..=1.0).contains(&p_low), "{} p_low out of range", param.name);
                assert_eq!(param.spec.range(), (0.0, 1.0));
            }
        }
    }

    #[test]
    fn lookup_resolves_known_names() {
        let battery = parameter("battery_voltage").expect("battery_voltage in catalog");
        assert_eq!(battery.unit, "V");
        assert_eq!(battery.subsystem, Subsystem::Power);
        assert!(parameter("warp_core_temp").is_none());
    }
}
