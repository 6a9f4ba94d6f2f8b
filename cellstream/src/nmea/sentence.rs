//! NMEA 0183 sentence encoding for GGA and RMC.

use super::fix::Fix;

/// Knots per metre-per-second.
pub const KNOTS_PER_MPS: f64 = 1.943844;

/// Satellite count reported when the device sent none.
pub const DEFAULT_SATELLITES: u32 = 8;

/// HDOP reported when the device sent no accuracy.
pub const DEFAULT_HDOP: f64 = 1.0;

/// XOR of every byte of `body`, as two uppercase hex digits.
///
/// `body` is the text between `$` and `*`.
pub fn checksum(body: &str) -> String {
    let cs = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("{:02X}", cs)
}

/// Frame a sentence body as `$body*CS`.
pub fn frame(body: &str) -> String {
    format!("${}*{}", body, checksum(body))
}

/// Latitude as `DDMM.MMMM` plus hemisphere.
pub fn format_latitude(lat: f64) -> (String, char) {
    let hemi = if lat < 0.0 { 'S' } else { 'N' };
    (degrees_minutes(lat.abs(), 2), hemi)
}

/// Longitude as `DDDMM.MMMM` plus hemisphere.
pub fn format_longitude(lon: f64) -> (String, char) {
    let hemi = if lon < 0.0 { 'W' } else { 'E' };
    (degrees_minutes(lon.abs(), 3), hemi)
}

fn degrees_minutes(value: f64, degree_width: usize) -> String {
    let mut deg = value.trunc() as u32;
    let mut minutes = (value - value.trunc()) * 60.0;
    // 59.99999 would print as "60.0000"; carry into the degrees instead
    if (minutes * 10_000.0).round() >= 600_000.0 {
        deg = deg.saturating_add(1);
        minutes = 0.0;
    }
    format!("{:0dw$}{:07.4}", deg, minutes, dw = degree_width)
}

/// GGA (fix data) sentence for `fix`.
pub fn gga(fix: &Fix) -> String {
    let time = fix.time();
    let (lat, lat_hemi) = format_latitude(fix.lat);
    let (lon, lon_hemi) = format_longitude(fix.lon);
    let sats = fix.satellites.unwrap_or(DEFAULT_SATELLITES);
    let hdop = match fix.accuracy_m {
        Some(acc) if acc != 0.0 => acc / 5.0,
        _ => DEFAULT_HDOP,
    };
    let alt = fix.alt_m.unwrap_or(0.0);

    frame(&format!(
        "GPGGA,{},{},{},{},{},1,{:02},{:.1},{:.1},M,0.0,M,,",
        time.format("%H%M%S"),
        lat,
        lat_hemi,
        lon,
        lon_hemi,
        sats,
        hdop,
        alt
    ))
}

/// RMC (recommended minimum) sentence for `fix`.
pub fn rmc(fix: &Fix) -> String {
    let time = fix.time();
    let (lat, lat_hemi) = format_latitude(fix.lat);
    let (lon, lon_hemi) = format_longitude(fix.lon);
    let knots = fix.speed_mps.map(|s| s * KNOTS_PER_MPS).unwrap_or(0.0);
    let course = fix.course_deg.unwrap_or(0.0);

    frame(&format!(
        "GPRMC,{},A,{},{},{},{},{:.1},{:.1},{},,",
        time.format("%H%M%S"),
        lat,
        lat_hemi,
        lon,
        lon_hemi,
        knots,
        course,
        time.format("%d%m%y")
    ))
}

/// The sentences pushed for one fix per pump cycle: GGA then RMC.
pub fn sentences(fix: &Fix) -> [String; 2] {
    [gga(fix), rmc(fix)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fix() -> Fix {
        Fix {
            ts: 1_700_000_000.0,
            lat: 45.5,
            lon: -122.25,
            alt_m: None,
            speed_mps: None,
            course_deg: None,
            satellites: None,
            accuracy_m: None,
        }
    }

    /// Split `$body*CS` and check the checksum.
    fn verify(sentence: &str) -> &str {
        let body = sentence
            .strip_prefix('$')
            .and_then(|s| s.split_once('*'))
            .map(|(body, cs)| {
                assert_eq!(cs, checksum(body));
                body
            })
            .unwrap();
        body
    }

    #[test]
    fn test_coordinate_formatting() {
        assert_eq!(format_latitude(45.5), ("4530.0000".to_string(), 'N'));
        assert_eq!(format_longitude(-122.25), ("12215.0000".to_string(), 'W'));
        assert_eq!(format_latitude(-3.5), ("0330.0000".to_string(), 'S'));
        assert_eq!(format_longitude(7.0), ("00700.0000".to_string(), 'E'));
    }

    #[test]
    fn test_minutes_never_reach_sixty() {
        assert_eq!(format_latitude(45.999_999_99).0, "4600.0000");
    }

    #[test]
    fn test_minute_carry_saturates_huge_degrees() {
        let (text, hemi) = format_latitude(4_294_967_295.999_999_5);
        assert!(text.starts_with("4294967295"));
        assert_eq!(hemi, 'N');
    }

    #[test]
    fn test_known_checksum() {
        // Reference sentence from the NMEA 0183 documentation
        let body = "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(checksum(body), "47");
    }

    #[test]
    fn test_gga_defaults() {
        let sentence = gga(&fix());
        assert_eq!(
            verify(&sentence),
            "GPGGA,221320,4530.0000,N,12215.0000,W,1,08,1.0,0.0,M,0.0,M,,"
        );
    }

    #[test]
    fn test_gga_with_values() {
        let mut f = fix();
        f.satellites = Some(11);
        f.accuracy_m = Some(4.0);
        f.alt_m = Some(123.46);
        assert_eq!(
            verify(&gga(&f)),
            "GPGGA,221320,4530.0000,N,12215.0000,W,1,11,0.8,123.5,M,0.0,M,,"
        );
    }

    #[test]
    fn test_rmc() {
        let mut f = fix();
        f.speed_mps = Some(10.0);
        f.course_deg = Some(270.0);
        assert_eq!(
            verify(&rmc(&f)),
            "GPRMC,221320,A,4530.0000,N,12215.0000,W,19.4,270.0,141123,,"
        );
    }

    #[test]
    fn test_sentence_order() {
        let [first, second] = sentences(&fix());
        assert!(first.starts_with("$GPGGA,"));
        assert!(second.starts_with("$GPRMC,"));
    }

    proptest! {
        #[test]
        fn prop_checksum_stable(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            let mut f = fix();
            f.lat = lat;
            f.lon = lon;
            for sentence in sentences(&f) {
                let body = sentence[1..sentence.len() - 3].to_string();
                prop_assert_eq!(checksum(&body), checksum(&body));
                prop_assert_eq!(&sentence[sentence.len() - 2..], checksum(&body));
            }
        }
    }
}
