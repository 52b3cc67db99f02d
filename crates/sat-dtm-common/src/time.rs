//! ---
//! dtm_section: "01-runtime-orchestration"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Shared time formatting helpers."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};

/// Human-facing UTC timestamp used by alerts and the dashboard banner.
pub fn format_utc(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Earliest representable instant; the "never updated" sentinel.
pub fn epoch_min() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_without_subseconds() {
        let ts = DateTime::parse_from_rfc3339("2025-02-03T04:05:06.789Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_utc(ts), "2025-02-03 04:05:06 UTC");
    }

    #[test]
    fn epoch_min_precedes_everything() {
        assert!(epoch_min() < Utc::now());
    }
}
