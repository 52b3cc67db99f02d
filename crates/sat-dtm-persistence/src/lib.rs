//! ---
//! dtm_section: "04-persistence-alerting"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Relational persistence for labeled telemetry points."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! SQLite-backed persistence for labeled telemetry.

/// Result alias used throughout the persistence crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for the telemetry store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Wrapper for SQLite driver errors.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Wrapper for IO errors while creating the database directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Reported when a stored timestamp fails to parse back.
    #[error("stored timestamp is not valid RFC 3339: {0}")]
    Timestamp(#[from] chrono::ParseError),
    /// Reported when a point to be written lacks a catalog parameter.
    #[error("point is missing catalog parameter `{parameter}`")]
    IncompletePoint {
        /// Name of the absent parameter.
        parameter: String,
    },
    /// Reported when the configured table name is not a safe identifier.
    #[error("invalid table name `{name}`")]
    InvalidTable {
        /// The rejected name.
        name: String,
    },
}

pub mod store;

pub use store::TelemetryStore;
