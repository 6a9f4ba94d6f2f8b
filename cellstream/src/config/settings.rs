//! Settings structs and their defaults, one per INI section.

use std::path::PathBuf;

use crate::device::DEFAULT_SERVICE_COMPONENT;
use crate::session::{
    DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_DELAY_MS, DEFAULT_DATA_PORT, DEFAULT_GPS_PORT,
};
use crate::sink::OutputConfig;

use super::file::config_directory;

/// Default seconds between `adb devices` scans.
pub const DEFAULT_DISCOVERY_INTERVAL_SECS: u64 = 2;

/// Default NMEA pump period in milliseconds.
pub const DEFAULT_NMEA_INTERVAL_MS: u64 = 1000;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "cellstream.log";

/// Default bridge executable.
pub const DEFAULT_ADB_PATH: &str = "adb";

/// Contents of `config.ini`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigFile {
    pub device: DeviceSettings,
    pub session: SessionSettings,
    pub output: OutputConfig,
    pub nmea: NmeaSettings,
    pub logging: LoggingSettings,
}

/// `[device]` section.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSettings {
    pub data_port: u16,
    pub gps_port: u16,
    pub service_component: String,
    pub adb_path: PathBuf,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            data_port: DEFAULT_DATA_PORT,
            gps_port: DEFAULT_GPS_PORT,
            service_component: DEFAULT_SERVICE_COMPONENT.to_string(),
            adb_path: PathBuf::from(DEFAULT_ADB_PATH),
        }
    }
}

/// `[session]` section.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSettings {
    pub connect_attempts: u32,
    pub connect_delay_ms: u64,
    pub discovery_interval_secs: u64,
    pub gps_only: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_delay_ms: DEFAULT_CONNECT_DELAY_MS,
            discovery_interval_secs: DEFAULT_DISCOVERY_INTERVAL_SECS,
            gps_only: false,
        }
    }
}

/// `[nmea]` section. No port means no broadcaster.
#[derive(Clone, Debug, PartialEq)]
pub struct NmeaSettings {
    pub port: Option<u16>,
    pub device: Option<String>,
    pub interval_ms: u64,
}

impl Default for NmeaSettings {
    fn default() -> Self {
        Self {
            port: None,
            device: None,
            interval_ms: DEFAULT_NMEA_INTERVAL_MS,
        }
    }
}

/// `[logging]` section.
#[derive(Clone, Debug, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
