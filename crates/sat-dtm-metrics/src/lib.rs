//! ---
//! dtm_section: "04-persistence-alerting"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Metrics collection and export utilities."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{response::IntoResponse, Router};
use prometheus::{
    Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Shared registry type used across the monitor.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Spawn an HTTP server that exposes the registry at `/metrics`.
pub fn spawn_http_server(registry: SharedRegistry, addr: SocketAddr) -> Result<MetricsServer> {
    let app = Router::new().route(
        "/metrics",
        get({
            let registry = registry.clone();
            move || metrics_handler(registry.clone())
        }),
    );

    let std_listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind metrics listener {}", addr))?;
    std_listener
        .set_nonblocking(true)
        .with_context(|| "failed to configure metrics listener as non-blocking")?;
    let listener = TcpListener::from_std(std_listener)
        .with_context(|| "failed to convert std listener into tokio listener")?;

    info!(address = %addr, "metrics server starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let service = app.into_make_service();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        axum::serve(listener, service)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .context("metrics server encountered an error")?;
        Ok(())
    });

    Ok(MetricsServer {
        addr,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

async fn metrics_handler(registry: SharedRegistry) -> impl IntoResponse {
    let families = registry.gather();
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("metrics encoding error"),
            )
                .into_response()
        }
    }
}

/// Handle to the running HTTP exporter.
#[derive(Debug)]
pub struct MetricsServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MetricsServer {
    /// Return the bound address for convenience.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(anyhow::Error::new(join_err)),
        }
    }
}

/// Counters and timings recorded by the monitor loop.
#[derive(Clone)]
pub struct MonitorMetrics {
    points_generated: IntCounter,
    anomalies_detected: IntCounter,
    store_failures: IntCounter,
    alert_failures: IntCounter,
    classify_seconds: Histogram,
}

impl MonitorMetrics {
    pub fn new(registry: &SharedRegistry) -> Result<Self> {
        let points_generated = IntCounter::with_opts(Opts::new(
            "sat_dtm_points_generated_total",
            "Telemetry points generated by the monitor loop",
        ))?;
        registry.register(Box::new(points_generated.clone()))?;

        let anomalies_detected = IntCounter::with_opts(Opts::new(
            "sat_dtm_anomalies_detected_total",
            "Points the anomaly model labeled anomalous",
        ))?;
        registry.register(Box::new(anomalies_detected.clone()))?;

        let store_failures = IntCounter::with_opts(Opts::new(
            "sat_dtm_store_failures_total",
            "Telemetry writes dropped due to store errors",
        ))?;
        registry.register(Box::new(store_failures.clone()))?;

        let alert_failures = IntCounter::with_opts(Opts::new(
            "sat_dtm_alert_failures_total",
            "Anomaly notifications that failed to send",
        ))?;
        registry.register(Box::new(alert_failures.clone()))?;

        let buckets = prometheus::exponential_buckets(0.0001, 2.0, 14)
            .context("failed to construct histogram buckets")?;
        let classify_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "sat_dtm_classify_seconds",
                "Time spent classifying one telemetry point",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(classify_seconds.clone()))?;

        Ok(Self {
            points_generated,
            anomalies_detected,
            store_failures,
            alert_failures,
            classify_seconds,
        })
    }

    pub fn inc_point(&self) {
        self.points_generated.inc();
    }

    pub fn inc_anomaly(&self) {
        self.anomalies_detected.inc();
    }

    pub fn inc_store_failure(&self) {
        self.store_failures.inc();
    }

    pub fn inc_alert_failure(&self) {
        self.alert_failures.inc();
    }

    pub fn observe_classify(&self, seconds: f64) {
        self.classify_seconds.observe(seconds);
    }
}

impl std::fmt::Debug for MonitorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorMetrics").finish()
    }
}

pub use prometheus;
