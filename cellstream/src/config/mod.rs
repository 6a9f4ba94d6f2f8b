//! User configuration stored in `~/.cellstream/config.ini`.
//!
//! Settings structs live in [`settings`], parsing in `parser`, and
//! serialization in `writer`. CLI flags override file values; see
//! [`AppConfig::from_config_file`](crate::app::AppConfig::from_config_file).
//!
//! # Example
//!
//! ```ignore
//! use cellstream::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("data port: {}", config.device.data_port);
//! ```

mod file;
mod parser;
pub mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigError};
pub use settings::{
    ConfigFile, DeviceSettings, LoggingSettings, NmeaSettings, SessionSettings,
    DEFAULT_ADB_PATH, DEFAULT_DISCOVERY_INTERVAL_SECS, DEFAULT_LOG_FILE, DEFAULT_NMEA_INTERVAL_MS,
};
