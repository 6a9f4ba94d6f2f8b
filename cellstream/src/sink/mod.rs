//! Record sinks.
//!
//! Every canonical record is handed to a [`SinkFanout`], which writes it to
//! each configured sink in order:
//!
//! | Sink            | Format                      | Accepts                |
//! |-----------------|-----------------------------|------------------------|
//! | [`JsonLinesSink`] | one JSON object per line  | every record           |
//! | [`CsvSink`]     | canonical columns           | every record           |
//! | [`SqliteSink`]  | `cell_data` table           | every record           |
//! | [`KmlSink`]     | `<Placemark>` document      | records with lat + lon |
//! | [`GpxSink`]     | `<trkpt>` track segment     | records with lat + lon |
//!
//! Sinks are synchronous and serialize access behind a per-sink mutex.
//! Async callers run fanout writes on the blocking pool.

mod document;
mod fanout;
mod gpx;
mod kml;
mod line_log;
mod table;
mod tabular;
mod traits;

pub use document::DocumentWriter;
pub use fanout::{FanoutError, OutputConfig, SinkFanout};
pub use gpx::GpxSink;
pub use kml::KmlSink;
pub use line_log::JsonLinesSink;
pub use table::{SqliteSink, KEY_INDEX_NAME, TABLE_NAME};
pub use tabular::CsvSink;
pub use traits::{RecordSink, SinkError};

use std::fs::{File, OpenOptions};
use std::path::Path;

/// Create the parent directory of `path` if it does not exist.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), SinkError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Open {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Open `path` for appending, creating it and its parent directory.
pub(crate) fn open_append(path: &Path) -> Result<File, SinkError> {
    ensure_parent(path)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })
}
