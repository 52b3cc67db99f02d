//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Monitor state and orchestration loop exports."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Orchestration core for the SAT-DTM monitor: the session state struct
//! and the strictly sequenced loop step that feeds persistence, alerting,
//! and the dashboard.

pub mod monitor;
pub mod state;

pub use monitor::{Monitor, StepOutcome};
pub use state::{LabeledPoint, MonitorState};
