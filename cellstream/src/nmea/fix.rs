//! Latest-known position sample.

use chrono::{DateTime, Utc};

use crate::record::RawMessage;

/// One location sample taken from a device message.
///
/// Only the broadcaster holds fixes; they are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Sample time, seconds since the Unix epoch.
    pub ts: f64,
    pub lat: f64,
    pub lon: f64,
    pub alt_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub course_deg: Option<f64>,
    pub satellites: Option<u32>,
    pub accuracy_m: Option<f64>,
}

impl Fix {
    /// Extract a fix from a message.
    ///
    /// Returns `None` unless both coordinates are present and on the globe
    /// (|lat| <= 90, |lon| <= 180). A missing, zero or non-numeric timestamp
    /// is replaced by the current time.
    pub fn from_message(msg: &RawMessage) -> Option<Self> {
        let (lat, lon) = (msg.lat?, msg.lon?);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        let ts = msg
            .ts
            .as_ref()
            .filter(|ts| ts.is_truthy())
            .and_then(|ts| ts.as_f64())
            .unwrap_or_else(now_epoch_secs);

        Some(Self {
            ts,
            lat,
            lon,
            alt_m: msg.alt_m,
            speed_mps: msg.speed_mps,
            course_deg: msg.bearing_deg,
            satellites: msg.satellites,
            accuracy_m: msg.accuracy_m,
        })
    }

    /// Sample time in UTC. Out-of-range timestamps fall back to now.
    pub fn time(&self) -> DateTime<Utc> {
        let secs = self.ts.floor();
        let nanos = ((self.ts - secs) * 1e9) as u32;
        DateTime::from_timestamp(secs as i64, nanos).unwrap_or_else(Utc::now)
    }
}

fn now_epoch_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
