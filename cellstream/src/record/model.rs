//! Inbound message shapes as sent by the phone, one JSON object per line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::scalar::{lenient, Scalar};

/// One telemetry message from a device.
///
/// Location fields are optional; a message may carry only cells, only a fix,
/// or both. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub ts: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub network_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub network_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub alt_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub speed_mps: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub bearing_deg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub accuracy_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub provider: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub satellites: Option<u32>,
    #[serde(default, deserialize_with = "cells_or_empty")]
    pub cells: Vec<CellObservation>,
}

impl RawMessage {
    /// Parse a single line of the device feed.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Both coordinates present.
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

/// One radio cell seen by the device.
///
/// Field names mirror the wire format. Values are kept as reported; see
/// [`Scalar`] for the lenient numeric views used during derivation.
///
/// Cells parsed through [`CellObservation::from_map`] (which is how
/// [`RawMessage`] reads them) also keep the device's original object, so
/// keys not modelled here survive into the `neighbors` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rat: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub registered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcc: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnc: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tac: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lac: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_cell_id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nci: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enb_id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earfcn: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arfcn: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nrarfcn: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_khz: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsrp: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsrq: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_advance: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vqi: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl_freq_mhz: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ul_freq_mhz: Option<Scalar>,
    #[serde(skip)]
    pub(crate) raw: Map<String, Value>,
}

impl CellObservation {
    /// Typed view over one wire object, keeping the object itself.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut cell: CellObservation = serde_json::from_value(Value::Object(map.clone()))?;
        cell.raw = map;
        Ok(cell)
    }

    /// Parse one cell object from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Self::from_map(serde_json::from_str(text)?)
    }

    /// The device flagged this cell as the serving cell.
    pub fn is_registered(&self) -> bool {
        self.registered.unwrap_or(false)
    }

    /// The cell as the device sent it.
    ///
    /// Cells built in code have no wire object; their typed fields are
    /// serialized instead.
    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        if self.raw.is_empty() {
            serde_json::to_value(self)
        } else {
            Ok(Value::Object(self.raw.clone()))
        }
    }

    /// Country and network codes both set; cells without them cannot be keyed.
    pub fn is_identified(&self) -> bool {
        is_set(&self.mcc) && is_set(&self.mnc)
    }
}

fn is_set(value: &Option<Scalar>) -> bool {
    value.as_ref().is_some_and(Scalar::is_truthy)
}

fn cells_or_empty<'de, D>(deserializer: D) -> Result<Vec<CellObservation>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<Map<String, Value>>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(CellObservation::from_map)
        .collect::<Result<_, _>>()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"ts": 1700000000, "network_name": "T-Mobile", "network_type": "LTE",
        "lat": 45.5, "lon": -122.25, "accuracy_m": 4.0, "satellites": "9", "extra": [1, 2],
        "cells": [{"rat": "LTE", "registered": true, "mcc": "310", "mnc": "260",
                   "tac": 12345, "full_cell_id": 123456789, "earfcn": 5110, "rsrp": -95}]}"#;

    #[test]
    fn test_parse_full_message() {
        let msg = RawMessage::from_line(SAMPLE).unwrap();
        assert_eq!(msg.ts, Some(Scalar::Int(1_700_000_000)));
        assert_eq!(msg.network_name.as_deref(), Some("T-Mobile"));
        assert_eq!(msg.lat, Some(45.5));
        assert_eq!(msg.satellites, Some(9));
        assert!(msg.has_position());
        assert_eq!(msg.cells.len(), 1);

        let cell = &msg.cells[0];
        assert!(cell.is_registered());
        assert!(cell.is_identified());
        assert_eq!(cell.earfcn, Some(Scalar::Int(5110)));
    }

    #[test]
    fn test_missing_and_null_cells() {
        let msg = RawMessage::from_line(r#"{"lat": 1.0}"#).unwrap();
        assert!(msg.cells.is_empty());
        assert!(!msg.has_position());

        let msg = RawMessage::from_line(r#"{"cells": null}"#).unwrap();
        assert!(msg.cells.is_empty());
    }

    #[test]
    fn test_malformed_line_is_error() {
        assert!(RawMessage::from_line("{not json").is_err());
        assert!(RawMessage::from_line("").is_err());
    }

    #[test]
    fn test_unidentified_cell() {
        let cell: CellObservation =
            serde_json::from_str(r#"{"mcc": "310", "mnc": "", "pci": 10}"#).unwrap();
        assert!(!cell.is_identified());

        let cell: CellObservation = serde_json::from_str(r#"{"mnc": "260"}"#).unwrap();
        assert!(!cell.is_identified());
    }

    #[test]
    fn test_cell_serializes_only_present_fields() {
        let cell: CellObservation =
            serde_json::from_str(r#"{"mcc": "310", "mnc": 260, "pci": 10}"#).unwrap();
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, r#"{"mcc":"310","mnc":260,"pci":10}"#);
    }

    #[test]
    fn test_registered_absent_vs_false() {
        let cell = CellObservation::from_json(r#"{"mcc": "310", "mnc": "260"}"#).unwrap();
        assert_eq!(cell.registered, None);
        assert!(!cell.is_registered());

        let cell = CellObservation::from_json(r#"{"registered": false}"#).unwrap();
        assert_eq!(cell.registered, Some(false));

        let cell = CellObservation::from_json(r#"{"registered": 1}"#).unwrap();
        assert_eq!(cell.registered, Some(true));
    }

    #[test]
    fn test_wire_object_keeps_unmodelled_keys() {
        let msg = RawMessage::from_line(
            r#"{"cells": [{"rat": "NR", "mcc": "310", "mnc": "260", "pci": 5, "csiRsrp": -80}]}"#,
        )
        .unwrap();
        let wire = msg.cells[0].to_wire().unwrap();

        assert_eq!(wire["csiRsrp"], -80);
        assert!(wire.get("registered").is_none());
        let keys: Vec<&str> = wire.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["rat", "mcc", "mnc", "pci", "csiRsrp"]);
    }

    #[test]
    fn test_cell_built_in_code_serializes_typed_fields() {
        let cell = CellObservation {
            mcc: Some("310".into()),
            pci: Some(Scalar::Int(3)),
            ..Default::default()
        };
        assert_eq!(cell.to_wire().unwrap(), serde_json::json!({"mcc": "310", "pci": 3}));
    }
}
