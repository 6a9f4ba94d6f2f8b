//! JSON Lines sink: one record per line.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::open_append;
use super::traits::{RecordSink, SinkError};
use crate::record::CanonicalRecord;

/// Appends each record as a single UTF-8 JSON object terminated by `\n`.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open (or create) the file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn write(&self, record: &CanonicalRecord) -> Result<bool, SinkError> {
        let mut line = record.to_json()?;
        line.push('\n');

        // single write_all keeps concurrent sessions from interleaving lines
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;
    use tempfile::tempdir;

    #[test]
    fn test_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/records.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();

        sink.write(&sample_record(Some(1.0), Some(2.0))).unwrap();
        sink.write(&sample_record(None, None)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["device_id"], "emulator-5554");
        assert_eq!(first["lat"], 1.0);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second["lat"].is_null());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "{\"old\":true}\n").unwrap();

        let sink = JsonLinesSink::open(&path).unwrap();
        sink.write(&sample_record(None, None)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("{\"old\":true}"));
    }
}
