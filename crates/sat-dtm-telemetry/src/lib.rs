//! ---
//! dtm_section: "02-telemetry-simulation"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Telemetry catalog, points, and synthetic generation."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Synthetic spacecraft telemetry for the SAT-DTM monitor.
//!
//! The catalog is the single source of truth for parameter names, ranges,
//! units, and ordering; generation, scoring, persistence, and the dashboard
//! all derive from it.

pub mod catalog;
pub mod generator;
pub mod point;

pub use catalog::{feature_names, parameter, Parameter, ParameterSpec, Subsystem, PARAMETERS};
pub use generator::{FaultKind, TelemetryGenerator, DEFAULT_FAULT_PROBABILITY};
pub use point::{TelemetryPoint, TIMESTAMP_STEP_SECONDS};
