//! ---
//! dtm_section: "04-persistence-alerting"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "SMTP anomaly notifications."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Outbound anomaly notifications over authenticated SMTP.
//!
//! Sends are synchronous and best-effort: the caller is expected to log a
//! failure and move on, never to stall or abort telemetry ingestion on a
//! broken mail path.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use sat_dtm_common::{format_utc, AlertConfig};
use sat_dtm_telemetry::TelemetryPoint;
use tracing::info;

/// Result alias used throughout the alert crate.
pub type Result<T> = std::result::Result<T, AlertError>;

/// Error type for the alerting path.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// Sender or receiver is not a valid mailbox address.
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    /// The message itself could not be assembled.
    #[error("failed to build alert message: {0}")]
    Message(#[from] lettre::error::Error),
    /// The SMTP session failed (connect, auth, or send).
    #[error("smtp transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    /// The point lacks one of the key parameters quoted in the body.
    #[error("point is missing parameter `{parameter}` required for the alert body")]
    MissingParameter { parameter: String },
}

/// Formatted SMTP alerting for anomalous telemetry points.
pub struct AlertMailer {
    system_id: String,
    sender: String,
    receiver: String,
    transport: SmtpTransport,
}

impl AlertMailer {
    /// Build a mailer from configuration; the SMTP session is established
    /// lazily on first send.
    pub fn new(system_id: &str, config: &AlertConfig) -> Result<Self> {
        let transport = SmtpTransport::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            system_id: system_id.to_owned(),
            sender: config.sender.clone(),
            receiver: config.receiver.clone(),
            transport,
        })
    }

    /// Send the anomaly notification for one point, blocking until the
    /// SMTP session completes.
    pub fn send(&self, point: &TelemetryPoint) -> Result<()> {
        let message = Message::builder()
            .from(self.sender.parse::<Mailbox>()?)
            .to(self.receiver.parse::<Mailbox>()?)
            .subject(render_subject(&self.system_id, point))
            .body(render_body(&self.system_id, point)?)?;
        self.transport.send(&message)?;
        info!(system = %self.system_id, timestamp = %point.timestamp, "anomaly alert sent");
        Ok(())
    }
}

impl std::fmt::Debug for AlertMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertMailer")
            .field("system_id", &self.system_id)
            .field("receiver", &self.receiver)
            .finish()
    }
}

/// Subject line: system identifier plus the reading's timestamp.
pub fn render_subject(system_id: &str, point: &TelemetryPoint) -> String {
    format!(
        "🚨 {system_id} Anomaly Alert - {}",
        format_utc(point.timestamp)
    )
}

/// Notification body quoting the key parameters of the reading.
pub fn render_body(system_id: &str, point: &TelemetryPoint) -> Result<String> {
    let fetch = |parameter: &str| {
        point
            .get(parameter)
            .ok_or_else(|| AlertError::MissingParameter {
                parameter: parameter.to_owned(),
            })
    };
    let battery_voltage = fetch("battery_voltage")?;
    let internal_temp = fetch("internal_temp")?;
    let gyroscope = fetch("gyroscope")?;
    let data_quality = fetch("data_quality")?;

    Ok(format!(
        "CRITICAL ANOMALY DETECTED!\n\
         System: {system_id}\n\
         Timestamp: {}\n\
         Key Parameters:\n\
         - Battery Voltage: {battery_voltage:.2} V\n\
         - Internal Temperature: {internal_temp:.1}°C\n\
         - Gyroscope: {gyroscope:.4} rad/s\n\
         - Data Quality: {data_quality:.1}%",
        format_utc(point.timestamp)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sat_dtm_telemetry::FaultKind;

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-04-05T06:07:08Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn subject_carries_system_and_timestamp() {
        let point = TelemetryPoint::nominal(epoch());
        let subject = render_subject("SAT-2025-DT-001", &point);
        assert!(subject.contains("SAT-2025-DT-001"));
        assert!(subject.contains("2025-04-05 06:07:08 UTC"));
    }

    #[test]
    fn body_quotes_key_parameters() {
        let mut point = TelemetryPoint::nominal(epoch());
        FaultKind::Power.apply(&mut point);
        let body = render_body("SAT-9", &point).unwrap();
        assert!(body.contains("System: SAT-9"));
        assert!(body.contains("- Battery Voltage: 16.80 V"));
        assert!(body.contains("- Internal Temperature: 25.0°C"));
        assert!(body.contains("- Gyroscope: 0.0500 rad/s"));
        assert!(body.contains("- Data Quality: 98.5%"));
    }

    #[test]
    fn body_requires_key_parameters() {
        let point = TelemetryPoint::from_pairs(epoch(), vec![("battery_voltage", 28.0)]);
        assert!(matches!(
            render_body("SAT-9", &point),
            Err(AlertError::MissingParameter { .. })
        ));
    }
}
