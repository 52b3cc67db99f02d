//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Shared primitives and utilities for the monitor runtime."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Core shared primitives for the SAT-DTM workspace: configuration
//! loading, logging bootstrap, and time helpers consumed across crates.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    AlertConfig, AppConfig, LoadedAppConfig, LoggingConfig, MetricsConfig, ModelConfig,
    MonitorConfig, SimulationConfig, StoreConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use time::{epoch_min, format_utc};
