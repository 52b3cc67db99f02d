//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Generate-classify-persist-alert step of the monitor loop."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sat_dtm_alert::AlertMailer;
use sat_dtm_anomaly::AnomalyDetector;
use sat_dtm_metrics::MonitorMetrics;
use sat_dtm_persistence::TelemetryStore;
use sat_dtm_telemetry::TelemetryGenerator;
use tracing::{debug, error, info, warn};

use crate::state::MonitorState;

/// What one loop step did, for logging and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepOutcome {
    /// A new point was minted this step.
    pub generated: bool,
    /// Label computed for the new point, if classification ran.
    pub anomaly: Option<bool>,
    /// The labeled point reached durable storage.
    pub stored: bool,
    /// An anomaly notification was handed to the mail transport.
    pub alerted: bool,
}

/// Owns the telemetry pipeline and executes one strictly sequenced step:
/// generate → classify → persist → update state → alert.
///
/// Persistence and alerting failures are reported and contained here; they
/// never escape a step. Alerting is gated only on the computed label, not
/// on whether the write succeeded.
#[derive(Debug)]
pub struct Monitor {
    generator: TelemetryGenerator,
    detector: AnomalyDetector,
    store: TelemetryStore,
    mailer: Option<AlertMailer>,
    metrics: Option<MonitorMetrics>,
    generation_interval: Duration,
}

impl Monitor {
    pub fn new(
        generator: TelemetryGenerator,
        detector: AnomalyDetector,
        store: TelemetryStore,
        generation_interval: Duration,
    ) -> Self {
        Self {
            generator,
            detector,
            store,
            mailer: None,
            metrics: None,
            generation_interval,
        }
    }

    pub fn with_mailer(mut self, mailer: AlertMailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Preload the dashboard history window from durable storage.
    /// Best-effort: a cold or unreadable store leaves the window empty.
    pub fn bootstrap_history(&self, state: &mut MonitorState) {
        match self.store.recent_points(state.history_depth()) {
            Ok(rows) => {
                let loaded = rows.len();
                state.seed_history(rows);
                if loaded > 0 {
                    info!(loaded, "seeded history window from store");
                }
            }
            Err(err) => {
                warn!(error = %err, "unable to seed history from store");
            }
        }
    }

    /// Run one tick. Mints a new point only when the generation gate has
    /// elapsed; otherwise this is a cheap no-op and the caller just
    /// re-renders.
    pub fn step(&mut self, state: &mut MonitorState, now: DateTime<Utc>) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if !state.due_for_generation(now, self.generation_interval) {
            return outcome;
        }

        let point = self.generator.generate_next();
        outcome.generated = true;
        if let Some(metrics) = &self.metrics {
            metrics.inc_point();
        }

        let started = Instant::now();
        let anomaly = match self.detector.classify(&point) {
            Ok(anomaly) => anomaly,
            Err(err) => {
                error!(error = %err, timestamp = %point.timestamp, "classification failed; reading discarded");
                return outcome;
            }
        };
        outcome.anomaly = Some(anomaly);
        if let Some(metrics) = &self.metrics {
            metrics.observe_classify(started.elapsed().as_secs_f64());
            if anomaly {
                metrics.inc_anomaly();
            }
        }

        match self.store.insert_point(&point, anomaly) {
            Ok(()) => outcome.stored = true,
            Err(err) => {
                // lost write: reported, not retried; the loop stays up
                error!(error = %err, timestamp = %point.timestamp, "telemetry write failed; point dropped from durable history");
                if let Some(metrics) = &self.metrics {
                    metrics.inc_store_failure();
                }
            }
        }

        state.record(point.clone(), anomaly, now);

        if anomaly {
            warn!(timestamp = %point.timestamp, "anomalous reading detected");
            if let Some(mailer) = &self.mailer {
                match mailer.send(&point) {
                    Ok(()) => outcome.alerted = true,
                    Err(err) => {
                        warn!(error = %err, "anomaly alert failed; continuing");
                        if let Some(metrics) = &self.metrics {
                            metrics.inc_alert_failure();
                        }
                    }
                }
            }
        } else {
            debug!(timestamp = %point.timestamp, "nominal reading");
        }

        outcome
    }
}
