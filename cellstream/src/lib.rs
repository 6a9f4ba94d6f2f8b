//! CellStream - multi-device cellular telemetry collector
//!
//! This library ingests newline-delimited JSON telemetry streamed from phones
//! bridged over `adb`, normalizes every message into a single canonical record,
//! derives missing LTE carrier frequencies, and fans each record out to file,
//! table and geospatial sinks. The latest GPS fix is re-broadcast to TCP
//! listeners as NMEA 0183 sentences.
//!
//! # Architecture
//!
//! ```text
//! DiscoveryLoop ──► SessionManager (one per device)
//!                        │
//!                        ├──► normalize ──► SinkFanout ──► jsonl/csv/sqlite/kml/gpx
//!                        │   (band table)
//!                        │
//!                        └──► FixBroadcaster ──► NMEA listeners (GGA + RMC every second)
//! ```

pub mod app;
pub mod band;
pub mod config;
pub mod device;
pub mod logging;
pub mod nmea;
pub mod record;
pub mod session;
pub mod sink;

/// Library version, as declared in the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
