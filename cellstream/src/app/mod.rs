//! Application bootstrap and lifecycle management.
//!
//! `CollectorApp` wires the components in a fixed order and tears them
//! down in reverse, so the CLI only has to build an `AppConfig`, start the
//! app and cancel a token.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CollectorApp                          │
//! │                                                              │
//! │  1. SinkFanout ─────────► jsonl / csv / sqlite / kml / gpx   │
//! │                                                              │
//! │  2. FixBroadcaster ─────► NMEA TCP listeners (optional)      │
//! │                                                              │
//! │  3. DiscoveryLoop ──────► SessionManager per device          │
//! │                                                              │
//! │  shutdown: drain sessions → stop NMEA → finalize sinks       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::CollectorApp;
pub use config::AppConfig;
pub use error::AppError;
