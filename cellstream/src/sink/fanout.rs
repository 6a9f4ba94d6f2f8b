//! Fanout of each record to every configured sink.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::gpx::GpxSink;
use super::kml::KmlSink;
use super::line_log::JsonLinesSink;
use super::table::SqliteSink;
use super::tabular::CsvSink;
use super::traits::{RecordSink, SinkError};
use crate::record::CanonicalRecord;

/// Output paths for the built-in sinks. `None` disables a sink.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputConfig {
    pub jsonl: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub sqlite: Option<PathBuf>,
    pub kml: Option<PathBuf>,
    pub gpx: Option<PathBuf>,
}

impl OutputConfig {
    /// True when no sink is configured.
    pub fn is_empty(&self) -> bool {
        self.jsonl.is_none()
            && self.csv.is_none()
            && self.sqlite.is_none()
            && self.kml.is_none()
            && self.gpx.is_none()
    }

    /// Overlay `other` on top of `self`: any path set in `other` wins.
    pub fn merged(mut self, other: &OutputConfig) -> Self {
        fn pick(base: &mut Option<PathBuf>, over: &Option<PathBuf>) {
            if over.is_some() {
                base.clone_from(over);
            }
        }
        pick(&mut self.jsonl, &other.jsonl);
        pick(&mut self.csv, &other.csv);
        pick(&mut self.sqlite, &other.sqlite);
        pick(&mut self.kml, &other.kml);
        pick(&mut self.gpx, &other.gpx);
        self
    }
}

/// Failures of individual sinks for one record.
///
/// The other sinks still received the record.
#[derive(Debug)]
pub struct FanoutError {
    pub failures: Vec<(&'static str, SinkError)>,
}

impl fmt::Display for FanoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sink(s) failed:", self.failures.len())?;
        for (name, err) in &self.failures {
            write!(f, " [{}: {}]", name, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for FanoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|(_, e)| e as &(dyn std::error::Error + 'static))
    }
}

/// Ordered set of sinks sharing one write call.
#[derive(Default)]
pub struct SinkFanout {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl SinkFanout {
    /// Empty fanout; records are dropped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink. Sinks receive records in insertion order.
    pub fn with_sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Open every sink named in `config`.
    ///
    /// Fails on the first sink that cannot be opened.
    pub fn from_config(config: &OutputConfig) -> Result<Self, SinkError> {
        let mut fanout = Self::new();
        if let Some(path) = &config.jsonl {
            fanout = fanout.with_sink(JsonLinesSink::open(path)?);
        }
        if let Some(path) = &config.csv {
            fanout = fanout.with_sink(CsvSink::open(path)?);
        }
        if let Some(path) = &config.sqlite {
            fanout = fanout.with_sink(SqliteSink::open(path)?);
        }
        if let Some(path) = &config.kml {
            fanout = fanout.with_sink(KmlSink::open(path)?);
        }
        if let Some(path) = &config.gpx {
            fanout = fanout.with_sink(GpxSink::open(path)?);
        }

        info!(sinks = ?fanout.sink_names(), "Sinks opened");
        Ok(fanout)
    }

    /// Hand `record` to every sink.
    ///
    /// Returns the number of sinks that accepted it. A failing sink is
    /// logged and skipped; the remaining sinks still receive the record.
    pub fn write(&self, record: &CanonicalRecord) -> Result<usize, FanoutError> {
        let mut accepted = 0;
        let mut failures = Vec::new();

        for sink in &self.sinks {
            match sink.write(record) {
                Ok(true) => accepted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(sink = sink.name(), device = %record.device_id, error = %e, "Sink write failed");
                    failures.push((sink.name(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(accepted)
        } else {
            Err(FanoutError { failures })
        }
    }

    /// Finalize every sink, continuing past failures.
    pub fn finalize(&self) -> Result<(), FanoutError> {
        let mut failures = Vec::new();
        for sink in &self.sinks {
            match sink.finalize() {
                Ok(()) => debug!(sink = sink.name(), "Sink finalized"),
                Err(e) => {
                    warn!(sink = sink.name(), error = %e, "Sink finalize failed");
                    failures.push((sink.name(), e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FanoutError { failures })
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl fmt::Debug for SinkFanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkFanout")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
