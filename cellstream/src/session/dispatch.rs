//! Per-message decision: which record, if any, a message produces.

use crate::record::{
    normalize, select_cells, CanonicalRecord, CellObservation, RawMessage, GPS_ONLY_KEY,
    GPS_ONLY_RAT,
};

/// What a message turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A record built around the serving cell.
    Cell {
        record: CanonicalRecord,
        neighbor_count: usize,
    },

    /// A fix-only record (GPS-only mode, no identified cell).
    GpsOnly { record: CanonicalRecord },
}

impl Dispatch {
    pub fn record(&self) -> &CanonicalRecord {
        match self {
            Self::Cell { record, .. } | Self::GpsOnly { record } => record,
        }
    }

    pub fn into_record(self) -> CanonicalRecord {
        match self {
            Self::Cell { record, .. } | Self::GpsOnly { record } => record,
        }
    }

    /// Console line for this record.
    pub fn summary(&self) -> String {
        match self {
            Self::Cell {
                record,
                neighbor_count,
            } => record.summary(*neighbor_count),
            Self::GpsOnly { record } => {
                let acc = record
                    .accuracy_m
                    .map(crate::record::format_float)
                    .unwrap_or_else(|| "None".to_string());
                match record.position() {
                    Some((lat, lon)) => format!("GPS-only GPS=({},{} acc={})", lat, lon, acc),
                    None => "GPS-only".to_string(),
                }
            }
        }
    }
}

/// Turns parsed messages into canonical records.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageDispatcher {
    gps_only: bool,
}

impl MessageDispatcher {
    pub fn new(gps_only: bool) -> Self {
        Self { gps_only }
    }

    pub fn gps_only(&self) -> bool {
        self.gps_only
    }

    /// Build the record for `message`, if it qualifies.
    ///
    /// Messages with at least one identified cell always yield a record.
    /// Otherwise a fix-only record is emitted when GPS-only mode is on and
    /// both coordinates are present.
    pub fn dispatch(&self, device_id: &str, message: &RawMessage) -> Option<Dispatch> {
        if let Some(selection) = select_cells(&message.cells) {
            let record = normalize(
                device_id,
                message,
                &selection.primary,
                Some(selection.neighbors.as_slice()),
            );
            return Some(Dispatch::Cell {
                record,
                neighbor_count: selection.neighbors.len(),
            });
        }

        if self.gps_only && message.has_position() {
            let mut record = normalize(device_id, message, &CellObservation::default(), Some(&[][..]));
            record.rat = Some(GPS_ONLY_RAT.to_string());
            record.full_cell_key = GPS_ONLY_KEY.to_string();
            return Some(Dispatch::GpsOnly { record });
        }

        None
    }
}
