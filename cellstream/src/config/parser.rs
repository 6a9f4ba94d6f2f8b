//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The one place INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigError;
use super::settings::ConfigFile;

/// Parse an `Ini` into a `ConfigFile`, starting from defaults and overlaying
/// every key present.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigError> {
    let mut config = ConfigFile::default();

    // [device]
    if let Some(section) = ini.section(Some("device")) {
        if let Some(v) = section.get("data_port") {
            config.device.data_port = parse_port("device", "data_port", v)?;
        }
        if let Some(v) = section.get("gps_port") {
            config.device.gps_port = parse_port("device", "gps_port", v)?;
        }
        if let Some(v) = non_empty(section, "service_component") {
            if !v.contains('/') {
                return Err(invalid(
                    "device",
                    "service_component",
                    v,
                    "expected package/.Service",
                ));
            }
            config.device.service_component = v.to_string();
        }
        if let Some(v) = non_empty(section, "adb_path") {
            config.device.adb_path = expand_tilde(v);
        }
    }

    // [session]
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("connect_attempts") {
            let attempts: u32 = parse_number("session", "connect_attempts", v)?;
            if attempts == 0 {
                return Err(invalid("session", "connect_attempts", v, "must be at least 1"));
            }
            config.session.connect_attempts = attempts;
        }
        if let Some(v) = section.get("connect_delay_ms") {
            config.session.connect_delay_ms = parse_number("session", "connect_delay_ms", v)?;
        }
        if let Some(v) = section.get("discovery_interval_secs") {
            let secs: u64 = parse_number("session", "discovery_interval_secs", v)?;
            if secs == 0 {
                return Err(invalid(
                    "session",
                    "discovery_interval_secs",
                    v,
                    "must be at least 1",
                ));
            }
            config.session.discovery_interval_secs = secs;
        }
        if let Some(v) = section.get("gps_only") {
            config.session.gps_only = parse_bool("session", "gps_only", v)?;
        }
    }

    // [output]
    if let Some(section) = ini.section(Some("output")) {
        config.output.jsonl = non_empty(section, "jsonl").map(expand_tilde);
        config.output.csv = non_empty(section, "csv").map(expand_tilde);
        config.output.sqlite = non_empty(section, "sqlite").map(expand_tilde);
        config.output.kml = non_empty(section, "kml").map(expand_tilde);
        config.output.gpx = non_empty(section, "gpx").map(expand_tilde);
    }

    // [nmea]
    if let Some(section) = ini.section(Some("nmea")) {
        if let Some(v) = non_empty(section, "port") {
            config.nmea.port = Some(parse_port("nmea", "port", v)?);
        }
        config.nmea.device = non_empty(section, "device").map(str::to_string);
        if let Some(v) = section.get("interval_ms") {
            let ms: u64 = parse_number("nmea", "interval_ms", v)?;
            if ms == 0 {
                return Err(invalid("nmea", "interval_ms", v, "must be at least 1"));
            }
            config.nmea.interval_ms = ms;
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_port(section: &str, key: &str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(invalid(section, key, value, "must be a port number (1-65535)")),
    }
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
