//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Session state carried between monitor loop steps."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sat_dtm_common::epoch_min;
use sat_dtm_telemetry::TelemetryPoint;

/// A telemetry point together with its computed anomaly label.
#[derive(Debug, Clone)]
pub struct LabeledPoint {
    pub point: TelemetryPoint,
    pub anomaly: bool,
}

/// All mutable session state of the monitor, owned by the loop.
///
/// Initial values: empty history, epoch-minimum last update, no cached
/// point, `anomaly = false`. Only the loop mutates this; rendering reads.
#[derive(Debug)]
pub struct MonitorState {
    history: VecDeque<LabeledPoint>,
    history_depth: usize,
    last_update: DateTime<Utc>,
    last_point: Option<TelemetryPoint>,
    last_anomaly: bool,
}

impl MonitorState {
    pub fn new(history_depth: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(history_depth.max(1)),
            history_depth: history_depth.max(1),
            last_update: epoch_min(),
            last_point: None,
            last_anomaly: false,
        }
    }

    /// Whether enough wall-clock time has passed to mint a new point.
    /// This gate is independent of how often the render loop wakes up.
    pub fn due_for_generation(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let elapsed = now.signed_duration_since(self.last_update);
        let interval =
            chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::max_value());
        elapsed >= interval
    }

    /// Record a freshly labeled point and advance the update clock.
    pub fn record(&mut self, point: TelemetryPoint, anomaly: bool, now: DateTime<Utc>) {
        self.history.push_front(LabeledPoint {
            point: point.clone(),
            anomaly,
        });
        self.history.truncate(self.history_depth);
        self.last_update = now;
        self.last_point = Some(point);
        self.last_anomaly = anomaly;
    }

    /// Preload history from durable storage, newest first. Existing entries
    /// are kept in front; the window stays bounded.
    pub fn seed_history<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (TelemetryPoint, bool)>,
    {
        for (point, anomaly) in rows {
            if self.history.len() >= self.history_depth {
                break;
            }
            self.history.push_back(LabeledPoint { point, anomaly });
        }
    }

    /// Trailing window, newest first.
    pub fn history(&self) -> impl Iterator<Item = &LabeledPoint> {
        self.history.iter()
    }

    /// One parameter's trailing values in chronological order, for charts.
    pub fn series(&self, parameter: &str) -> Vec<f64> {
        self.history
            .iter()
            .rev()
            .filter_map(|entry| entry.point.get(parameter))
            .collect()
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn last_point(&self) -> Option<&TelemetryPoint> {
        self.last_point.as_ref()
    }

    pub fn last_anomaly(&self) -> bool {
        self.last_anomaly
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_depth(&self) -> usize {
        self.history_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn fresh_state_is_immediately_due() {
        let state = MonitorState::new(10);
        assert!(state.due_for_generation(epoch(), Duration::from_secs(2)));
        assert!(state.last_point().is_none());
        assert!(!state.last_anomaly());
    }

    #[test]
    fn generation_gate_respects_interval() {
        let mut state = MonitorState::new(10);
        let now = epoch();
        state.record(TelemetryPoint::nominal(now), false, now);

        let interval = Duration::from_secs(2);
        assert!(!state.due_for_generation(now + ChronoDuration::seconds(1), interval));
        assert!(state.due_for_generation(now + ChronoDuration::seconds(2), interval));
    }

    #[test]
    fn history_window_stays_bounded() {
        let mut state = MonitorState::new(3);
        for i in 0..6 {
            let ts = epoch() + ChronoDuration::minutes(i);
            state.record(TelemetryPoint::nominal(ts), i % 2 == 0, ts);
        }
        assert_eq!(state.history_len(), 3);
        // newest first
        let newest = state.history().next().unwrap();
        assert_eq!(newest.point.timestamp, epoch() + ChronoDuration::minutes(5));
    }

    #[test]
    fn seeded_history_keeps_live_entries_in_front() {
        let mut state = MonitorState::new(10);
        let live = epoch() + ChronoDuration::minutes(30);
        state.record(TelemetryPoint::nominal(live), true, live);
        state.seed_history((0..4).map(|i| {
            let ts = epoch() + ChronoDuration::minutes(3 - i);
            (TelemetryPoint::nominal(ts), false)
        }));
        assert_eq!(state.history_len(), 5);
        assert_eq!(state.history().next().unwrap().point.timestamp, live);
    }

    #[test]
    fn series_is_chronological() {
        let mut state = MonitorState::new(10);
        for i in 0..3 {
            let ts = epoch() + ChronoDuration::minutes(i);
            let mut point = TelemetryPoint::nominal(ts);
            point.set("battery_voltage", 27.0 + i as f64);
            state.record(point, false, ts);
        }
        assert_eq!(state.series("battery_voltage"), vec![27.0, 28.0, 29.0]);
    }
}
