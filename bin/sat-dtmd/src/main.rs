//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "binary"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Binary entrypoint for the SAT-DTM monitor daemon."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use sat_dtm_alert::AlertMailer;
use sat_dtm_anomaly::{AnomalyDetector, TrainingOptions};
use sat_dtm_common::config::AppConfig;
use sat_dtm_common::init_tracing;
use sat_dtm_core::{Monitor, MonitorState};
use sat_dtm_dashboard::{log_status, DashboardContext, TerminalUi};
use sat_dtm_metrics::{new_registry, spawn_http_server, MetricsServer, MonitorMetrics};
use sat_dtm_persistence::TelemetryStore;
use sat_dtm_telemetry::TelemetryGenerator;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "SAT-DTM telemetry monitor daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Log status lines instead of drawing the dashboard")]
    headless: bool,

    #[arg(long, help = "Override the telemetry stream seed")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/example.dev.toml"));
    candidates.push(PathBuf::from("configs/example.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    if let Some(seed) = cli.seed {
        config.simulation.seed = seed;
    }
    init_tracing("sat-dtmd", &config.logging)?;
    info!(config_path = %loaded.source.display(), system = %config.system_id, "configuration loaded");

    let metrics_server;
    let monitor_metrics;
    if config.metrics.enabled {
        let registry = new_registry();
        monitor_metrics = Some(MonitorMetrics::new(&registry)?);
        metrics_server = Some(spawn_http_server(registry, config.metrics.listen)?);
    } else {
        monitor_metrics = None;
        metrics_server = None;
    }

    let training = TrainingOptions {
        bootstrap_samples: config.model.bootstrap_samples,
        contamination: config.model.contamination,
        trees: config.model.trees,
        model_seed: config.model.seed,
        bootstrap_seed: config.simulation.seed,
        bootstrap_fault_probability: config.simulation.fault_probability,
        artifacts_dir: Some(config.model.artifacts_dir.clone()),
    };
    let train_started = Instant::now();
    let detector = AnomalyDetector::train(&training)
        .context("anomaly model training failed; cannot start the monitor")?;
    info!(
        elapsed_ms = train_started.elapsed().as_millis() as u64,
        features = detector.feature_count(),
        "anomaly model ready"
    );

    let store = TelemetryStore::open(&config.store.database, &config.store.table)
        .with_context(|| {
            format!(
                "unable to open telemetry store {}",
                config.store.database.display()
            )
        })?;

    // the live stream must not replay the bootstrap sample
    let live_seed = config.simulation.seed.wrapping_add(1);
    let generator = TelemetryGenerator::new(live_seed)
        .with_fault_probability(config.simulation.fault_probability);

    let mut monitor = Monitor::new(
        generator,
        detector,
        store,
        config.monitor.generation_interval,
    );
    if let Some(metrics) = &monitor_metrics {
        monitor = monitor.with_metrics(metrics.clone());
    }
    if config.alert.enabled {
        let mailer = AlertMailer::new(&config.system_id, &config.alert)
            .context("failed to configure the alert mailer")?;
        monitor = monitor.with_mailer(mailer);
    } else {
        info!("alerting disabled; anomalies will only be logged");
    }

    let mut state = MonitorState::new(config.monitor.history_depth);
    monitor.bootstrap_history(&mut state);

    run_loop(&config, &mut monitor, &mut state, cli.headless).await?;

    if let Some(server) = metrics_server {
        shutdown_metrics(server).await;
    }
    info!("monitor stopped");
    Ok(())
}

/// Render-cadence loop. The generation gate inside [`Monitor::step`] runs
/// on its own interval, so redraw frequency and data cadence stay
/// independent.
async fn run_loop(
    config: &AppConfig,
    monitor: &mut Monitor,
    state: &mut MonitorState,
    headless: bool,
) -> Result<()> {
    let mut ui = if headless {
        None
    } else {
        Some(TerminalUi::new().context("failed to initialise the terminal dashboard")?)
    };
    let context = DashboardContext {
        system_id: &config.system_id,
        twin_version: &config.twin_version,
    };

    let mut ticker = tokio::time::interval(config.monitor.render_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.step(state, Utc::now());
                match ui.as_mut() {
                    Some(ui) => {
                        ui.draw(state, context)?;
                        if ui.poll_quit(Duration::ZERO)? {
                            info!("operator requested shutdown");
                            break;
                        }
                    }
                    None => log_status(state, context),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}

async fn shutdown_metrics(server: MetricsServer) {
    if let Err(err) = server.shutdown().await {
        warn!(error = %err, "metrics server shutdown reported an error");
    }
}
