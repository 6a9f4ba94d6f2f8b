//! NMEA 0183 re-broadcast of the latest device fix.
//!
//! Third-party tools (gpsd, Kismet) connect over TCP and receive a GGA and an
//! RMC sentence once per second for the most recent fix of any device, or of
//! one allow-listed device.

mod broadcaster;
mod fix;
mod sentence;

pub use broadcaster::{
    BroadcastError, BroadcasterConfig, BroadcasterHandle, FixBroadcaster, DEFAULT_PUMP_INTERVAL,
};
pub use fix::Fix;
pub use sentence::{
    checksum, format_latitude, format_longitude, frame, gga, rmc, sentences, DEFAULT_HDOP,
    DEFAULT_SATELLITES, KNOTS_PER_MPS,
};
