//! INI serialization: `ConfigFile` → commented INI text.

use std::path::Path;

use super::settings::ConfigFile;

/// Render `config` as the commented `config.ini` written by `init`.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let opt_path = |p: &Option<std::path::PathBuf>| p.as_deref().map(path_to_string).unwrap_or_default();
    let nmea_port = config.nmea.port.map(|p| p.to_string()).unwrap_or_default();

    format!(
        r#"[device]
; Telemetry server port on the phone. Device N (0-based) is reached on host
; port data_port + 2*N.
data_port = {}
; NMEA feed port on the phone, forwarded the same way
gps_port = {}
; Foreground service started on each phone after bridging
service_component = {}
; adb executable
adb_path = {}

[session]
; Connect attempts per session, and pause between them
connect_attempts = {}
connect_delay_ms = {}
; Seconds between device scans
discovery_interval_secs = {}
; Write location-only records when a message has no identified cell
gps_only = {}

[output]
; Output paths; leave empty to disable a sink
jsonl = {}
csv = {}
sqlite = {}
kml = {}
gpx = {}

[nmea]
; TCP port serving GGA/RMC sentences (e.g. 31337); empty disables it
port = {}
; Only broadcast fixes from this device id; empty accepts any device
device = {}
; Milliseconds between sentence bursts
interval_ms = {}

[logging]
directory = {}
file = {}
"#,
        config.device.data_port,
        config.device.gps_port,
        config.device.service_component,
        path_to_string(&config.device.adb_path),
        config.session.connect_attempts,
        config.session.connect_delay_ms,
        config.session.discovery_interval_secs,
        config.session.gps_only,
        opt_path(&config.output.jsonl),
        opt_path(&config.output.csv),
        opt_path(&config.output.sqlite),
        opt_path(&config.output.kml),
        opt_path(&config.output.gpx),
        nmea_port,
        config.nmea.device.as_deref().unwrap_or(""),
        config.nmea.interval_ms,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
