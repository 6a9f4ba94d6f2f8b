//! RawMessage + chosen cells → CanonicalRecord.
//!
//! Everything here is a pure function. Fields that can come from several wire
//! keys are resolved by exactly one function each ([`area_code`],
//! [`cell_identity`], [`channel_number`]), so every call site agrees on
//! priority.

use tracing::warn;

use crate::band;

use super::canonical::CanonicalRecord;
use super::model::{CellObservation, RawMessage};
use super::scalar::Scalar;

/// First value that is set (truthy), in priority order.
fn first_set<'a>(candidates: &[&'a Option<Scalar>]) -> Option<&'a Scalar> {
    candidates
        .iter()
        .filter_map(|c| c.as_ref())
        .find(|v| v.is_truthy())
}

/// Area code: precise tracking area, then legacy location area.
pub fn area_code(cell: &CellObservation) -> Option<&Scalar> {
    first_set(&[&cell.tac, &cell.lac])
}

/// Cell identity: 36-bit full id, then legacy cid, then NR cell identity.
pub fn cell_identity(cell: &CellObservation) -> Option<&Scalar> {
    first_set(&[&cell.full_cell_id, &cell.cid, &cell.nci])
}

/// Channel number used for frequency derivation: EARFCN, then NR-ARFCN.
///
/// Picks the first field that is present at all (a present-but-garbage value
/// wins over a later valid one and makes derivation unavailable).
pub fn channel_number(cell: &CellObservation) -> Option<&Scalar> {
    cell.earfcn.as_ref().or(cell.nrarfcn.as_ref())
}

/// Dedup key `"{mcc}-{mnc}-{area}-{cell}"`.
///
/// Missing components contribute an empty string, so the key is always
/// computable, e.g. `"310-260--"` for a cell without area or id.
pub fn dedup_key(cell: &CellObservation) -> String {
    fn part(v: Option<&Scalar>) -> String {
        v.map(Scalar::to_string).unwrap_or_default()
    }

    format!(
        "{}-{}-{}-{}",
        part(first_set(&[&cell.mcc])),
        part(first_set(&[&cell.mnc])),
        part(area_code(cell)),
        part(cell_identity(cell)),
    )
}

/// Outcome of frequency derivation for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFrequencies {
    pub band: u16,
    pub downlink_mhz: f64,
    pub uplink_mhz: Option<f64>,
}

/// Derive band and carrier frequencies from the cell's channel number.
///
/// Returns `None` when the channel or band is missing, unknown, or cannot be
/// interpreted as a number. Never panics.
pub fn derive_frequencies(cell: &CellObservation) -> Option<DerivedFrequencies> {
    let channel = u32::try_from(channel_number(cell)?.as_i64()?).ok()?;
    let band = match &cell.band {
        Some(explicit) => u16::try_from(explicit.as_i64()?).ok()?,
        None => band::band_for_channel(channel)?,
    };
    let freqs = band::carrier_frequencies(channel, band)?;

    Some(DerivedFrequencies {
        band,
        downlink_mhz: freqs.downlink_mhz,
        uplink_mhz: freqs.uplink_mhz,
    })
}

/// Build the canonical record for one message.
///
/// * `primary` - the serving cell; pass `CellObservation::default()` for
///   fix-only records
/// * `neighbors` - other visible cells, serialized into the `neighbors` field
///   when given
pub fn normalize(
    device_id: &str,
    message: &RawMessage,
    primary: &CellObservation,
    neighbors: Option<&[CellObservation]>,
) -> CanonicalRecord {
    let mut record = CanonicalRecord {
        ts: message.ts.clone(),
        device_id: device_id.to_string(),
        network_name: message.network_name.clone(),
        network_type: message.network_type.clone(),
        lat: message.lat,
        lon: message.lon,
        alt_m: message.alt_m,
        speed_mps: message.speed_mps,
        bearing_deg: message.bearing_deg,
        accuracy_m: message.accuracy_m,
        provider: message.provider.clone(),
        rat: primary.rat.clone(),
        registered: primary.registered,
        mcc: primary.mcc.clone(),
        mnc: primary.mnc.clone(),
        tac: primary.tac.clone(),
        lac: primary.lac.clone(),
        cid: primary.cid.clone(),
        full_cell_id: primary.full_cell_id.clone(),
        full_cell_key: dedup_key(primary),
        enb_id: primary.enb_id.clone(),
        sector_id: primary.sector_id.clone(),
        earfcn: primary.earfcn.clone(),
        arfcn: primary.arfcn.clone(),
        nrarfcn: primary.nrarfcn.clone(),
        band: primary.band.clone(),
        bandwidth_khz: primary.bandwidth_khz.clone(),
        pci: primary.pci.clone(),
        rssi: primary.rssi.clone(),
        rsrp: primary.rsrp.clone(),
        rsrq: primary.rsrq.clone(),
        snr: primary.snr.clone(),
        timing_advance: primary.timing_advance.clone(),
        vqi: primary.vqi.clone(),
        dl_freq_mhz: primary.dl_freq_mhz.clone(),
        ul_freq_mhz: primary.ul_freq_mhz.clone(),
        satellites: message.satellites,
        neighbors: None,
    };

    if record.dl_freq_mhz.is_none() && record.ul_freq_mhz.is_none() {
        if let Some(derived) = derive_frequencies(primary) {
            record.dl_freq_mhz = Some(Scalar::Float(derived.downlink_mhz));
            record.ul_freq_mhz = derived.uplink_mhz.map(Scalar::Float);
            if record.band.is_none() {
                record.band = Some(Scalar::Int(i64::from(derived.band)));
            }
        }
    }

    if let Some(neighbors) = neighbors {
        record.neighbors = match neighbor_payload(neighbors) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(device = %device_id, error = %e, "Failed to serialize neighbor cells");
                None
            }
        };
    }

    record
}

/// JSON array of the neighbor cells as the device reported them.
pub fn neighbor_payload(neighbors: &[CellObservation]) -> Result<String, serde_json::Error> {
    let wire = neighbors
        .iter()
        .map(CellObservation::to_wire)
        .collect::<Result<Vec<_>, _>>()?;
    serde_json::to_string(&wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cell(json: &str) -> CellObservation {
        CellObservation::from_json(json).unwrap()
    }

    #[test]
    fn test_dedup_key_full() {
        let c = cell(r#"{"mcc": "310", "mnc": "260", "tac": 12345, "full_cell_id": 987654321}"#);
        assert_eq!(dedup_key(&c), "310-260-12345-987654321");
    }

    #[test]
    fn test_dedup_key_missing_parts_are_empty() {
        let c = cell(r#"{"mcc": "310", "mnc": "260"}"#);
        assert_eq!(dedup_key(&c), "310-260--");
        assert_eq!(dedup_key(&CellObservation::default()), "---");
    }

    #[test]
    fn test_dedup_key_fallback_order() {
        let c = cell(r#"{"mcc": "310", "mnc": "260", "lac": 77, "cid": 5, "nci": 9}"#);
        assert_eq!(dedup_key(&c), "310-260-77-5");

        let c = cell(r#"{"mcc": "310", "mnc": "260", "tac": 0, "lac": 77, "nci": 9}"#);
        assert_eq!(dedup_key(&c), "310-260-77-9");
    }

    #[test]
    fn test_derive_from_earfcn_only() {
        let c = cell(r#"{"earfcn": 300}"#);
        let derived = derive_frequencies(&c).unwrap();
        assert_eq!(derived.band, 1);
        assert_eq!(derived.downlink_mhz, 2140.0);
        assert_eq!(derived.uplink_mhz, Some(1950.0));
    }

    #[test]
    fn test_derive_prefers_explicit_band() {
        let c = cell(r#"{"earfcn": 300, "band": "2"}"#);
        let derived = derive_frequencies(&c).unwrap();
        assert_eq!(derived.band, 2);
        assert_eq!(derived.downlink_mhz, 1900.0);
    }

    #[test]
    fn test_derive_falls_back_to_nrarfcn() {
        let c = cell(r#"{"nrarfcn": 600}"#);
        assert_eq!(derive_frequencies(&c).unwrap().band, 2);
    }

    #[test]
    fn test_derive_unavailable_cases() {
        assert!(derive_frequencies(&cell(r#"{}"#)).is_none());
        assert!(derive_frequencies(&cell(r#"{"earfcn": 4980}"#)).is_none());
        assert!(derive_frequencies(&cell(r#"{"earfcn": "abc", "nrarfcn": 300}"#)).is_none());
        assert!(derive_frequencies(&cell(r#"{"earfcn": -5}"#)).is_none());
        assert!(derive_frequencies(&cell(r#"{"earfcn": 300, "band": "x"}"#)).is_none());
        assert!(derive_frequencies(&cell(r#"{"earfcn": 300, "band": 15}"#)).is_none());
    }

    #[test]
    fn test_normalize_writes_inferred_band_and_frequencies() {
        let msg = RawMessage::from_line(r#"{"ts": 1, "lat": 1.0, "lon": 2.0}"#).unwrap();
        let primary = cell(r#"{"rat": "LTE", "registered": true, "mcc": "310", "mnc": "260", "earfcn": 300}"#);
        let record = normalize("dev1", &msg, &primary, Some(&[][..]));

        assert_eq!(record.device_id, "dev1");
        assert_eq!(record.band, Some(Scalar::Int(1)));
        assert_eq!(record.dl_freq_mhz, Some(Scalar::Float(2140.0)));
        assert_eq!(record.ul_freq_mhz, Some(Scalar::Float(1950.0)));
        assert_eq!(record.registered, Some(true));
        assert_eq!(record.neighbors.as_deref(), Some("[]"));
        assert_eq!(record.lat, Some(1.0));
    }

    #[test]
    fn test_normalize_keeps_reported_frequencies() {
        let msg = RawMessage::default();
        let primary = cell(r#"{"mcc": "310", "mnc": "260", "earfcn": 300, "dl_freq_mhz": 2141.5}"#);
        let record = normalize("dev1", &msg, &primary, None);

        assert_eq!(record.dl_freq_mhz, Some(Scalar::Float(2141.5)));
        assert!(record.ul_freq_mhz.is_none());
        assert!(record.band.is_none());
        assert!(record.neighbors.is_none());
    }

    #[test]
    fn test_normalize_downlink_only_band() {
        let primary = cell(r#"{"mcc": "310", "mnc": "410", "earfcn": 9700}"#);
        let record = normalize("dev1", &RawMessage::default(), &primary, None);
        assert_eq!(record.band, Some(Scalar::Int(29)));
        assert_eq!(record.dl_freq_mhz, Some(Scalar::Float(721.0)));
        assert!(record.ul_freq_mhz.is_none());
    }

    #[test]
    fn test_normalize_serializes_neighbors() {
        let primary = cell(r#"{"mcc": "310", "mnc": "260", "pci": 1}"#);
        let neighbors = vec![cell(r#"{"mcc": "310", "mnc": "260", "pci": 2}"#)];
        let record = normalize("dev1", &RawMessage::default(), &primary, Some(neighbors.as_slice()));

        assert_eq!(
            record.neighbors.as_deref(),
            Some(r#"[{"mcc":"310","mnc":"260","pci":2}]"#)
        );
    }

    #[test]
    fn test_neighbors_are_written_as_reported() {
        let primary = cell(r#"{"mcc": "310", "mnc": "260", "pci": 1, "registered": true}"#);
        let neighbors = vec![cell(r#"{"mcc":"310","mnc":"260","pci":5,"csiRsrp":-80,"earfcn":"300"}"#)];
        let record = normalize("dev1", &RawMessage::default(), &primary, Some(neighbors.as_slice()));

        assert_eq!(
            record.neighbors.as_deref(),
            Some(r#"[{"mcc":"310","mnc":"260","pci":5,"csiRsrp":-80,"earfcn":"300"}]"#)
        );
    }

    #[test]
    fn test_registered_left_empty_when_not_reported() {
        let primary = cell(r#"{"mcc": "310", "mnc": "260", "pci": 1}"#);
        let record = normalize("dev1", &RawMessage::default(), &primary, None);
        assert_eq!(record.registered, None);

        let primary = cell(r#"{"mcc": "310", "mnc": "260", "registered": false}"#);
        let record = normalize("dev1", &RawMessage::default(), &primary, None);
        assert_eq!(record.registered, Some(false));
    }

    proptest! {
        #[test]
        fn prop_dedup_key_is_deterministic(
            mcc in proptest::option::of("[0-9]{3}"),
            mnc in proptest::option::of("[0-9]{2,3}"),
            tac in proptest::option::of(1i64..65535),
            cid in proptest::option::of(1i64..268_435_455),
        ) {
            let c = CellObservation {
                mcc: mcc.as_deref().map(Scalar::from),
                mnc: mnc.as_deref().map(Scalar::from),
                tac: tac.map(Scalar::Int),
                cid: cid.map(Scalar::Int),
                ..Default::default()
            };
            let key = dedup_key(&c);
            prop_assert_eq!(&key, &dedup_key(&c.clone()));
            prop_assert_eq!(key.matches('-').count(), 3);
            prop_assert!(!key.contains("None"));
            prop_assert!(!key.contains("null"));
        }
    }
}
