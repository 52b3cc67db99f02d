//! ---
//! dtm_section: "04-persistence-alerting"
//! dtm_subsection: "module"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Telemetry table schema and scoped-cursor access."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params_from_iter, types::Value, Connection, Transaction};
use sat_dtm_telemetry::{feature_names, TelemetryPoint, PARAMETERS};
use tracing::debug;

use crate::{Result, StoreError};

/// Telemetry store over a single SQLite database.
///
/// The schema is derived from the parameter catalog: a timestamp column,
/// one `REAL` column per parameter in catalog order, and an integer
/// anomaly label.
pub struct TelemetryStore {
    conn: Connection,
    table: String,
}

impl TelemetryStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        validate_table(table)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, table)
    }

    /// In-memory store, for tests and dry runs.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        validate_table(table)?;
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        let store = Self {
            conn,
            table: table.to_owned(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let columns: Vec<String> = feature_names()
            .map(|name| format!("{name} REAL NOT NULL"))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (timestamp TEXT NOT NULL, {}, anomaly INTEGER NOT NULL)",
            self.table,
            columns.join(", ")
        );
        self.conn.execute_batch(&sql)?;
        debug!(table = %self.table, "telemetry schema ensured");
        Ok(())
    }

    /// Scoped cursor access: open a transaction, run `f`, then commit and
    /// release on every path — including when `f` fails, whose error is
    /// still propagated to the caller.
    pub fn with_cursor<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let result = f(&tx);
        let committed = tx.commit();
        match (result, committed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), _) => Err(err),
        }
    }

    /// Append one labeled point. The point must carry every catalog
    /// parameter; a failed write surfaces as an error and is not retried.
    pub fn insert_point(&mut self, point: &TelemetryPoint, anomaly: bool) -> Result<()> {
        let mut values = Vec::with_capacity(PARAMETERS.len() + 2);
        // fixed-width timestamps keep ORDER BY chronological
        values.push(Value::Text(encode_timestamp(point.timestamp)));
        for name in feature_names() {
            let value = point.get(name).ok_or_else(|| StoreError::IncompletePoint {
                parameter: name.to_owned(),
            })?;
            values.push(Value::Real(value));
        }
        values.push(Value::Integer(i64::from(anomaly)));

        let sql = self.insert_sql();
        self.with_cursor(|tx| {
            tx.execute(&sql, params_from_iter(values))?;
            Ok(())
        })
    }

    /// Latest `limit` labeled points, newest first; used to bootstrap the
    /// dashboard history window.
    pub fn recent_points(&self, limit: usize) -> Result<Vec<(TelemetryPoint, bool)>> {
        let names: Vec<&'static str> = feature_names().collect();
        let sql = format!(
            "SELECT timestamp, {}, anomaly FROM {} ORDER BY timestamp DESC LIMIT ?1",
            names.join(", "),
            self.table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([limit as i64], |row| {
            let timestamp: String = row.get(0)?;
            let mut pairs = Vec::with_capacity(names.len());
            for (idx, name) in names.iter().enumerate() {
                pairs.push((*name, row.get::<_, f64>(idx + 1)?));
            }
            let anomaly: i64 = row.get(names.len() + 1)?;
            Ok((timestamp, pairs, anomaly != 0))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (timestamp, pairs, anomaly) = row?;
            let timestamp: DateTime<Utc> =
                DateTime::parse_from_rfc3339(&timestamp)?.with_timezone(&Utc);
            points.push((TelemetryPoint::from_pairs(timestamp, pairs), anomaly));
        }
        Ok(points)
    }

    /// Configured table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn insert_sql(&self) -> String {
        let mut columns = vec!["timestamp".to_owned()];
        columns.extend(feature_names().map(str::to_owned));
        columns.push("anomaly".to_owned());
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}

impl std::fmt::Debug for TelemetryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStore")
            .field("table", &self.table)
            .finish()
    }
}

fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Table names are interpolated into SQL text, so only plain identifiers
/// are accepted.
fn validate_table(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !name.chars().next().is_some_and(|ch| ch.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable {
            name: name.to_owned(),
        })
    }
}
