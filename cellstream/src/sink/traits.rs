//! Sink interface and error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::CanonicalRecord;

/// Errors raised by a single sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to open or create the sink's file.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while appending.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The sink was already finalized and accepts no more records.
    #[error("Sink already finalized")]
    Finalized,
}

/// A destination for canonical records.
///
/// Implementations own their file or connection handle exclusively and
/// serialize access internally, so a single sink can be shared by every
/// device session.
///
/// # Durability
///
/// `write` must flush before returning. There is no transaction across
/// sinks: a crash between two sink writes can leave them inconsistent.
pub trait RecordSink: Send + Sync {
    /// Short name for logs (`"jsonl"`, `"csv"`, ...).
    fn name(&self) -> &'static str;

    /// Append one record.
    ///
    /// Sinks that only accept some records (e.g. geospatial sinks skip
    /// records without coordinates) return `Ok(false)` for skipped records.
    fn write(&self, record: &CanonicalRecord) -> Result<bool, SinkError>;

    /// Close out the sink on orderly shutdown.
    ///
    /// Document sinks write their footer here. Calling it twice is a no-op.
    fn finalize(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
