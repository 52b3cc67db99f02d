//! ---
//! dtm_section: "15-testing-qa"
//! dtm_subsection: "integration-tests"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Monitor loop scenarios across persistence and state."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sat_dtm_anomaly::{AnomalyDetector, TrainingOptions};
use sat_dtm_core::{Monitor, MonitorState};
use sat_dtm_persistence::TelemetryStore;
use sat_dtm_telemetry::TelemetryGenerator;

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-08-02T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn detector() -> AnomalyDetector {
    AnomalyDetector::train(&TrainingOptions {
        bootstrap_samples: 64,
        trees: 50,
        bootstrap_seed: 5,
        bootstrap_fault_probability: 0.0,
        ..TrainingOptions::default()
    })
    .unwrap()
}

fn monitor(store: TelemetryStore, fault_probability: f64) -> Monitor {
    let generator =
        TelemetryGenerator::with_epoch(21, epoch()).with_fault_probability(fault_probability);
    Monitor::new(generator, detector(), store, Duration::from_secs(2))
}

#[test]
fn points_flow_from_generator_to_durable_history() {
    let store = TelemetryStore::open_in_memory("telemetry").unwrap();
    let mut monitor = monitor(store, 0.0);
    let mut state = MonitorState::new(10);

    for tick in 0..3 {
        let now = epoch() + ChronoDuration::seconds(tick * 2);
        let outcome = monitor.step(&mut state, now);
        assert!(outcome.generated);
        assert!(outcome.stored);
    }
    assert_eq!(state.history_len(), 3);
    assert!(state.last_point().is_some());
}

#[test]
fn render_cadence_and_generation_gate_are_independent() {
    let store = TelemetryStore::open_in_memory("telemetry").unwrap();
    let mut monitor = monitor(store, 0.0);
    let mut state = MonitorState::new(10);

    // five render ticks one second apart only mint three points
    let mut generated = 0;
    for tick in 0..5 {
        let now = epoch() + ChronoDuration::seconds(tick);
        if monitor.step(&mut state, now).generated {
            generated += 1;
        }
    }
    assert_eq!(generated, 3);
    assert_eq!(state.history_len(), 3);
}

#[test]
fn store_failure_reports_but_loop_and_labeling_continue() {
    let mut store = TelemetryStore::open_in_memory("telemetry").unwrap();
    store
        .with_cursor(|tx| {
            tx.execute("DROP TABLE telemetry", [])?;
            Ok(())
        })
        .unwrap();

    let mut monitor = monitor(store, 0.0);
    let mut state = MonitorState::new(10);

    for tick in 0..3 {
        let now = epoch() + ChronoDuration::seconds(tick * 2);
        let outcome = monitor.step(&mut state, now);
        assert!(outcome.generated);
        assert!(!outcome.stored);
        // labeling is independent of write success
        assert!(outcome.anomaly.is_some());
    }
    assert_eq!(state.history_len(), 3);
    assert!(state.last_point().is_some());
}

#[test]
fn history_window_stays_bounded_over_long_runs() {
    let store = TelemetryStore::open_in_memory("telemetry").unwrap();
    let mut monitor = monitor(store, 0.5);
    let mut state = MonitorState::new(10);

    for tick in 0..25 {
        let now = epoch() + ChronoDuration::seconds(tick * 2);
        monitor.step(&mut state, now);
    }
    assert_eq!(state.history_len(), 10);
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemetry.db");

    {
        let store = TelemetryStore::open(&path, "telemetry").unwrap();
        let mut monitor = monitor(store, 0.0);
        let mut state = MonitorState::new(10);
        for tick in 0..4 {
            let now = epoch() + ChronoDuration::seconds(tick * 2);
            monitor.step(&mut state, now);
        }
    }

    let reopened = TelemetryStore::open(&path, "telemetry").unwrap();
    let rows = reopened.recent_points(10).unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].0.timestamp > rows[3].0.timestamp);

    let mut state = MonitorState::new(10);
    state.seed_history(rows);
    assert_eq!(state.history_len(), 4);
}
