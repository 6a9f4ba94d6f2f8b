//! CSV sink with a fixed canonical column order.

use std::fs::File;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::open_append;
use super::traits::{RecordSink, SinkError};
use crate::record::{CanonicalRecord, FIELD_NAMES};

/// Appends records as CSV rows.
///
/// The header row is written exactly once, when the file is empty at open
/// time. Re-opening an existing file keeps appending rows under the old
/// header.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(FIELD_NAMES)?;
            writer.flush()?;
        }

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, record: &CanonicalRecord) -> Result<bool, SinkError> {
        let row: Vec<String> = record
            .values()
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();

        let mut writer = self.writer.lock();
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(true)
    }
}
