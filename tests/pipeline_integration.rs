//! ---
//! dtm_section: "15-testing-qa"
//! dtm_subsection: "integration-tests"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "End-to-end scoring pipeline scenarios."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use sat_dtm_anomaly::{AnomalyDetector, TrainingOptions};
use sat_dtm_telemetry::{TelemetryGenerator, TelemetryPoint};

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-08-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Detector fitted on a clean baseline so fault excursions are genuine
/// outliers relative to the training distribution.
fn clean_detector() -> AnomalyDetector {
    AnomalyDetector::train(&TrainingOptions {
        bootstrap_samples: 100,
        trees: 100,
        bootstrap_seed: 1001,
        bootstrap_fault_probability: 0.0,
        ..TrainingOptions::default()
    })
    .unwrap()
}

/// First point of a seeded all-fault stream matching `predicate`.
///
/// Matching on the indicator alone is not enough: indicators can flip on
/// their own at baseline, so callers also require the correlated sensor
/// excursion that distinguishes a real injected fault.
fn first_point_matching(
    seed: u64,
    predicate: impl Fn(&TelemetryPoint) -> bool,
) -> TelemetryPoint {
    let mut generator = TelemetryGenerator::with_epoch(seed, epoch()).with_fault_probability(1.0);
    for _ in 0..256 {
        let point = generator.generate_next();
        if predicate(&point) {
            return point;
        }
    }
    panic!("seeded stream produced no matching fault in 256 points");
}

fn power_faulted(point: &TelemetryPoint) -> bool {
    point.get("power_anomalies") == Some(1.0) && point.get("battery_voltage").unwrap() < 25.0
}

fn thermal_faulted(point: &TelemetryPoint) -> bool {
    point.get("thermal_anomalies") == Some(1.0) && point.get("internal_temp").unwrap() > 33.0
}

fn aocs_faulted(point: &TelemetryPoint) -> bool {
    point.get("aocs_faults") == Some(1.0) && point.get("gyroscope").unwrap() > 0.08
}

#[test]
fn injected_power_fault_classifies_anomalous() {
    let detector = clean_detector();
    let point = first_point_matching(2025, power_faulted);

    // the fault drives battery voltage below its declared minimum
    let voltage = point.get("battery_voltage").unwrap();
    assert!(voltage < 25.0, "faulted voltage {voltage} still nominal");

    assert!(detector.classify(&point).unwrap());
}

#[test]
fn all_means_point_classifies_nominal() {
    let detector = clean_detector();
    let point = TelemetryPoint::nominal(epoch());
    assert!(!detector.classify(&point).unwrap());
}

#[test]
fn faulted_points_outscore_nominal_under_production_training() {
    // production-style bootstrap keeps fault injection on
    let detector = AnomalyDetector::train(&TrainingOptions {
        bootstrap_samples: 100,
        trees: 100,
        bootstrap_seed: 1001,
        ..TrainingOptions::default()
    })
    .unwrap();

    let nominal_score = detector.score(&TelemetryPoint::nominal(epoch())).unwrap();
    let cases: [(&str, fn(&TelemetryPoint) -> bool); 3] = [
        ("power", power_faulted),
        ("thermal", thermal_faulted),
        ("aocs", aocs_faulted),
    ];
    for (label, predicate) in cases {
        let faulted = first_point_matching(2025, predicate);
        let score = detector.score(&faulted).unwrap();
        assert!(
            score > nominal_score,
            "{label} fault score {score} not above nominal {nominal_score}"
        );
    }
}

#[test]
fn artifact_round_trip_preserves_classification() {
    let dir = tempfile::tempdir().unwrap();
    let detector = AnomalyDetector::train(&TrainingOptions {
        bootstrap_samples: 100,
        trees: 100,
        bootstrap_seed: 1001,
        bootstrap_fault_probability: 0.0,
        artifacts_dir: Some(dir.path().to_path_buf()),
        ..TrainingOptions::default()
    })
    .unwrap();

    let restored = AnomalyDetector::load(dir.path()).unwrap();

    let nominal = TelemetryPoint::nominal(epoch());
    let faulted = first_point_matching(2025, power_faulted);
    for point in [&nominal, &faulted] {
        assert_eq!(
            detector.classify(point).unwrap(),
            restored.classify(point).unwrap()
        );
        assert_eq!(detector.score(point).unwrap(), restored.score(point).unwrap());
    }
}

#[test]
fn classification_is_reproducible_across_identical_training_runs() {
    let options = TrainingOptions {
        bootstrap_samples: 100,
        trees: 100,
        bootstrap_seed: 77,
        bootstrap_fault_probability: 0.0,
        ..TrainingOptions::default()
    };
    let left = AnomalyDetector::train(&options).unwrap();
    let right = AnomalyDetector::train(&options).unwrap();

    let probe = first_point_matching(9, thermal_faulted);
    assert_eq!(left.score(&probe).unwrap(), right.score(&probe).unwrap());
    assert_eq!(
        left.classify(&probe).unwrap(),
        right.classify(&probe).unwrap()
    );
}
