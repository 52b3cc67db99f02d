//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Configuration loading and validation for the monitor."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_system_id() -> String {
    "SAT-2025-DT-001".to_owned()
}

fn default_twin_version() -> String {
    "4.0".to_owned()
}

fn default_render_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_generation_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_history_depth() -> usize {
    10
}

fn default_database() -> PathBuf {
    PathBuf::from("target/sat-dtm/telemetry.db")
}

fn default_table() -> String {
    "telemetry".to_owned()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_owned()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_bootstrap_samples() -> usize {
    100
}

fn default_contamination() -> f64 {
    0.05
}

fn default_trees() -> usize {
    100
}

fn default_model_seed() -> u64 {
    42
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("target/sat-dtm/model")
}

fn default_simulation_seed() -> u64 {
    0x5A7_D7
}

fn default_fault_probability() -> f64 {
    0.5
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_listen() -> SocketAddr {
    "0.0.0.0:9898"
        .parse()
        .expect("valid default metrics address")
}

/// Primary configuration object for the SAT-DTM monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_system_id")]
    pub system_id: String,
    #[serde(default = "default_twin_version")]
    pub twin_version: String,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Cadence settings for the monitor loop.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// How often the dashboard redraws.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_render_interval")]
    pub render_interval: Duration,
    /// Minimum wall-clock gap between minted telemetry points. Independent
    /// of the render cadence by design.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_generation_interval")]
    pub generation_interval: Duration,
    /// Trailing points retained for charting.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            render_interval: default_render_interval(),
            generation_interval: default_generation_interval(),
            history_depth: default_history_depth(),
        }
    }
}

/// Location of the relational telemetry store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            table: default_table(),
        }
    }
}

/// Outbound mail settings for anomaly notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    /// Usually left empty in the file and supplied via
    /// `SAT_DTM_ALERT_PASSWORD`.
    #[serde(default)]
    pub password: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            sender: String::new(),
            receiver: String::new(),
            password: String::new(),
        }
    }
}

/// Training settings for the anomaly model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: usize,
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_trees")]
    pub trees: usize,
    #[serde(default = "default_model_seed")]
    pub seed: u64,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            bootstrap_samples: default_bootstrap_samples(),
            contamination: default_contamination(),
            trees: default_trees(),
            seed: default_model_seed(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

/// Seeding for the synthetic telemetry stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_simulation_seed")]
    pub seed: u64,
    #[serde(default = "default_fault_probability")]
    pub fault_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_simulation_seed(),
            fault_probability: default_fault_probability(),
        }
    }
}

/// Structured-logging sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: LogFormat::default(),
            file_prefix: None,
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            listen: default_metrics_listen(),
        }
    }
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "SAT_DTM_CONFIG";
    pub const ENV_ALERT_PASSWORD: &'static str = "SAT_DTM_ALERT_PASSWORD";

    /// Load configuration from disk, respecting the `SAT_DTM_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig { config, source: path });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig { config, source: path });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let mut config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Pull secrets from the environment so they never live in the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var(Self::ENV_ALERT_PASSWORD) {
            if !password.is_empty() {
                self.alert.password = password;
            }
        }
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.system_id.trim().is_empty() {
            return Err(anyhow!("system_id cannot be empty"));
        }
        if self.monitor.render_interval.is_zero() {
            return Err(anyhow!("monitor.render_interval must be positive"));
        }
        if self.monitor.generation_interval.is_zero() {
            return Err(anyhow!("monitor.generation_interval must be positive"));
        }
        if self.monitor.history_depth == 0 {
            return Err(anyhow!("monitor.history_depth must be positive"));
        }
        if self.store.table.trim().is_empty() {
            return Err(anyhow!("store.table cannot be empty"));
        }
        if self.model.bootstrap_samples < 2 {
            return Err(anyhow!("model.bootstrap_samples must be at least 2"));
        }
        if !(0.0..=0.5).contains(&self.model.contamination) || self.model.contamination == 0.0 {
            return Err(anyhow!("model.contamination must lie in (0, 0.5]"));
        }
        if self.model.trees == 0 {
            return Err(anyhow!("model.trees must be positive"));
        }
        if !(0.0..=1.0).contains(&self.simulation.fault_probability) {
            return Err(anyhow!("simulation.fault_probability must lie in [0, 1]"));
        }
        if self.alert.enabled {
            if self.alert.sender.trim().is_empty() || self.alert.receiver.trim().is_empty() {
                return Err(anyhow!(
                    "alert.sender and alert.receiver are required when alerting is enabled"
                ));
            }
            if self.alert.smtp_host.trim().is_empty() {
                return Err(anyhow!("alert.smtp_host cannot be empty"));
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            system_id: default_system_id(),
            twin_version: default_twin_version(),
            monitor: MonitorConfig::default(),
            store: StoreConfig::default(),
            alert: AlertConfig::default(),
            model: ModelConfig::default(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
