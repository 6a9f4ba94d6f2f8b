//! The canonical, flat record written to every sink.

use serde::Serialize;

use super::scalar::{format_float, Scalar};

/// Canonical field order, authoritative for the tabular and table sinks.
pub const FIELD_NAMES: [&str; 38] = [
    "ts",
    "device_id",
    "network_name",
    "network_type",
    "lat",
    "lon",
    "alt_m",
    "speed_mps",
    "bearing_deg",
    "accuracy_m",
    "provider",
    "rat",
    "registered",
    "mcc",
    "mnc",
    "tac",
    "lac",
    "cid",
    "full_cell_id",
    "full_cell_key",
    "enb_id",
    "sector_id",
    "earfcn",
    "arfcn",
    "nrarfcn",
    "band",
    "bandwidth_khz",
    "pci",
    "rssi",
    "rsrp",
    "rsrq",
    "snr",
    "timing_advance",
    "vqi",
    "dl_freq_mhz",
    "ul_freq_mhz",
    "satellites",
    "neighbors",
];

/// Dedup key used for records that carry a fix but no cell.
pub const GPS_ONLY_KEY: &str = "gps-only";

/// Radio access tag used for records that carry a fix but no cell.
pub const GPS_ONLY_RAT: &str = "GPS";

/// One normalized observation.
///
/// Struct field order matches [`FIELD_NAMES`]; serde serializes in declaration
/// order, so JSON output keeps the canonical order too. Built by
/// [`normalize`](super::normalize) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub ts: Option<Scalar>,
    pub device_id: String,
    pub network_name: Option<String>,
    pub network_type: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub provider: Option<String>,
    pub rat: Option<String>,
    pub registered: Option<bool>,
    pub mcc: Option<Scalar>,
    pub mnc: Option<Scalar>,
    pub tac: Option<Scalar>,
    pub lac: Option<Scalar>,
    pub cid: Option<Scalar>,
    pub full_cell_id: Option<Scalar>,
    pub full_cell_key: String,
    pub enb_id: Option<Scalar>,
    pub sector_id: Option<Scalar>,
    pub earfcn: Option<Scalar>,
    pub arfcn: Option<Scalar>,
    pub nrarfcn: Option<Scalar>,
    pub band: Option<Scalar>,
    pub bandwidth_khz: Option<Scalar>,
    pub pci: Option<Scalar>,
    pub rssi: Option<Scalar>,
    pub rsrp: Option<Scalar>,
    pub rsrq: Option<Scalar>,
    pub snr: Option<Scalar>,
    pub timing_advance: Option<Scalar>,
    pub vqi: Option<Scalar>,
    pub dl_freq_mhz: Option<Scalar>,
    pub ul_freq_mhz: Option<Scalar>,
    pub satellites: Option<u32>,
    /// Neighbor cells as an embedded JSON array.
    pub neighbors: Option<String>,
}

impl CanonicalRecord {
    /// Both coordinates present; gate for the geospatial sinks.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }

    /// Field values as text, in [`FIELD_NAMES`] order. Absent fields are `None`.
    pub fn values(&self) -> Vec<Option<String>> {
        fn text(v: &Option<String>) -> Option<String> {
            v.clone()
        }
        fn scalar(v: &Option<Scalar>) -> Option<String> {
            v.as_ref().map(Scalar::to_string)
        }
        fn float(v: &Option<f64>) -> Option<String> {
            v.map(format_float)
        }

        vec![
            scalar(&self.ts),
            Some(self.device_id.clone()),
            text(&self.network_name),
            text(&self.network_type),
            float(&self.lat),
            float(&self.lon),
            float(&self.alt_m),
            float(&self.speed_mps),
            float(&self.bearing_deg),
            float(&self.accuracy_m),
            text(&self.provider),
            text(&self.rat),
            self.registered.map(|b| b.to_string()),
            scalar(&self.mcc),
            scalar(&self.mnc),
            scalar(&self.tac),
            scalar(&self.lac),
            scalar(&self.cid),
            scalar(&self.full_cell_id),
            Some(self.full_cell_key.clone()),
            scalar(&self.enb_id),
            scalar(&self.sector_id),
            scalar(&self.earfcn),
            scalar(&self.arfcn),
            scalar(&self.nrarfcn),
            scalar(&self.band),
            scalar(&self.bandwidth_khz),
            scalar(&self.pci),
            scalar(&self.rssi),
            scalar(&self.rsrp),
            scalar(&self.rsrq),
            scalar(&self.snr),
            scalar(&self.timing_advance),
            scalar(&self.vqi),
            scalar(&self.dl_freq_mhz),
            scalar(&self.ul_freq_mhz),
            self.satellites.map(|s| s.to_string()),
            text(&self.neighbors),
        ]
    }

    /// Serialize as a single JSON object with keys in canonical order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// One-line human summary for the console log.
    pub fn summary(&self, neighbor_count: usize) -> String {
        let rat = self.rat.as_deref().unwrap_or("?");
        let rssi = self
            .rssi
            .as_ref()
            .map(Scalar::to_string)
            .unwrap_or_else(|| "None".to_string());
        let mut line = format!(
            "{} {}, RSSI={} neighbors={}",
            rat, self.full_cell_key, rssi, neighbor_count
        );
        if let Some((lat, lon)) = self.position() {
            let acc = self
                .accuracy_m
                .map(format_float)
                .unwrap_or_else(|| "None".to_string());
            line.push_str(&format!(" GPS=({},{} acc={})", lat, lon, acc));
        }
        line
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A minimal record for sink and fanout tests.
    pub(crate) fn sample_record(lat: Option<f64>, lon: Option<f64>) -> CanonicalRecord {
        CanonicalRecord {
            ts: Some(Scalar::Int(1_700_000_000)),
            device_id: "emulator-5554".to_string(),
            network_name: Some("T-Mobile".to_string()),
            network_type: Some("LTE".to_string()),
            lat,
            lon,
            alt_m: Some(12.0),
            speed_mps: None,
            bearing_deg: None,
            accuracy_m: Some(5.0),
            provider: Some("gps".to_string()),
            rat: Some("LTE".to_string()),
            registered: Some(true),
            mcc: Some("310".into()),
            mnc: Some("260".into()),
            tac: Some(Scalar::Int(12345)),
            lac: None,
            cid: None,
            full_cell_id: Some(Scalar::Int(123_456_789)),
            full_cell_key: "310-260-12345-123456789".to_string(),
            enb_id: None,
            sector_id: None,
            earfcn: Some(Scalar::Int(5110)),
            arfcn: None,
            nrarfcn: None,
            band: Some(Scalar::Int(12)),
            bandwidth_khz: None,
            pci: Some(Scalar::Int(101)),
            rssi: Some(Scalar::Int(-70)),
            rsrp: Some(Scalar::Int(-95)),
            rsrq: None,
            snr: None,
            timing_advance: None,
            vqi: None,
            dl_freq_mhz: Some(Scalar::Float(739.0)),
            ul_freq_mhz: Some(Scalar::Float(709.0)),
            satellites: Some(9),
            neighbors: Some("[]".to_string()),
        }
    }

    #[test]
    fn test_values_match_field_names() {
        let record = sample_record(Some(45.5), Some(-122.25));
        let values = record.values();
        assert_eq!(values.len(), FIELD_NAMES.len());
        assert_eq!(values[0].as_deref(), Some("1700000000"));
        assert_eq!(values[1].as_deref(), Some("emulator-5554"));
        assert_eq!(values[4].as_deref(), Some("45.5"));
        assert_eq!(values[19].as_deref(), Some("310-260-12345-123456789"));
        assert_eq!(values[34].as_deref(), Some("739.0"));
    }

    #[test]
    fn test_json_keys_in_canonical_order() {
        let record = sample_record(None, None);
        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, FIELD_NAMES.to_vec());
        assert!(json["lat"].is_null());
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        assert!(sample_record(Some(1.0), None).position().is_none());
        assert_eq!(
            sample_record(Some(1.0), Some(2.0)).position(),
            Some((1.0, 2.0))
        );
    }

    #[test]
    fn test_summary_line() {
        let record = sample_record(Some(45.5), Some(-122.25));
        assert_eq!(
            record.summary(2),
            "LTE 310-260-12345-123456789, RSSI=-70 neighbors=2 GPS=(45.5,-122.25 acc=5.0)"
        );
    }
}
