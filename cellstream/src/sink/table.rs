//! SQLite sink: one `cell_data` row per record.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use super::ensure_parent;
use super::traits::{RecordSink, SinkError};
use crate::record::{CanonicalRecord, FIELD_NAMES};

/// Table every record lands in.
pub const TABLE_NAME: &str = "cell_data";

/// Non-unique lookup index on the dedup key.
pub const KEY_INDEX_NAME: &str = "idx_cell_key";

/// Appends records to a SQLite database.
///
/// All columns are `TEXT`. Databases created by older versions with fewer
/// columns are migrated on open by adding the missing columns.
pub struct SqliteSink {
    path: PathBuf,
    conn: Mutex<Connection>,
    insert_sql: String,
}

impl SqliteSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;

        let conn = Connection::open(&path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            path,
            conn: Mutex::new(conn),
            insert_sql: insert_statement(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write(&self, record: &CanonicalRecord) -> Result<bool, SinkError> {
        let conn = self.conn.lock();
        // autocommit: each insert is durable once execute returns
        let mut stmt = conn.prepare_cached(&self.insert_sql)?;
        stmt.execute(params_from_iter(record.values()))?;
        Ok(true)
    }
}

fn ensure_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    let columns = FIELD_NAMES
        .iter()
        .map(|name| format!("\"{}\" TEXT", name))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        TABLE_NAME, columns
    ))?;

    let existing = existing_columns(conn)?;
    for name in FIELD_NAMES.iter().filter(|n| !existing.iter().any(|e| e == *n)) {
        debug!(column = name, "Adding missing column");
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN \"{}\" TEXT;",
            TABLE_NAME, name
        ))?;
    }

    conn.execute_batch(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} (full_cell_key);",
        KEY_INDEX_NAME, TABLE_NAME
    ))?;
    Ok(())
}

fn existing_columns(conn: &Connection) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", TABLE_NAME))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    rows.collect()
}

fn insert_statement() -> String {
    let columns = FIELD_NAMES
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=FIELD_NAMES.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        TABLE_NAME, columns, placeholders
    )
}
