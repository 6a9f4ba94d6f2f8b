//! Application configuration for `CollectorApp`.
//!
//! `AppConfig` is the runtime view of the collector: the file configuration
//! translated into component configs, with CLI overrides layered on top via
//! the `with_*` builders.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::device::{DEFAULT_DISCOVERY_INTERVAL, DEFAULT_SERVICE_COMPONENT};
use crate::nmea::BroadcasterConfig;
use crate::session::{RetryPolicy, SessionConfig};
use crate::sink::OutputConfig;

/// Top-level configuration passed to `CollectorApp::start()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Sink output paths.
    pub output: OutputConfig,

    /// Per-session settings (ports, retry, GPS-only).
    pub session: SessionConfig,

    /// Pause between device scans.
    pub discovery_interval: Duration,

    /// NMEA broadcaster; `None` disables it.
    pub nmea: Option<BroadcasterConfig>,

    /// Bridge executable.
    pub adb_path: PathBuf,

    /// Service started on each device after bridging.
    pub service_component: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            session: SessionConfig::default(),
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL,
            nmea: None,
            adb_path: PathBuf::from("adb"),
            service_component: DEFAULT_SERVICE_COMPONENT.to_string(),
        }
    }
}

impl AppConfig {
    /// Create application config from the configuration file.
    ///
    /// Keeps the translation from INI sections to component configs in one
    /// place rather than scattered through CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let retry = RetryPolicy::fixed(
            config.session.connect_attempts,
            Duration::from_millis(config.session.connect_delay_ms),
        );

        let session = SessionConfig::default()
            .with_ports(config.device.data_port, config.device.gps_port)
            .with_retry(retry)
            .with_gps_only(config.session.gps_only);

        let nmea = config.nmea.port.map(|port| {
            let mut nmea = BroadcasterConfig::new(port)
                .with_interval(Duration::from_millis(config.nmea.interval_ms));
            if let Some(device) = &config.nmea.device {
                nmea = nmea.with_device_filter(device.clone());
            }
            nmea
        });

        Self {
            output: config.output.clone(),
            session,
            discovery_interval: Duration::from_secs(config.session.discovery_interval_secs),
            nmea,
            adb_path: config.device.adb_path.clone(),
            service_component: config.device.service_component.clone(),
        }
    }

    /// Overlay sink paths; any path set in `output` wins.
    pub fn with_output(mut self, output: &OutputConfig) -> Self {
        self.output = self.output.merged(output);
        self
    }

    /// Enable GPS-only records.
    pub fn with_gps_only(mut self, gps_only: bool) -> Self {
        self.session.gps_only = gps_only;
        self
    }

    /// Serve NMEA on `port`, keeping any configured filter and interval.
    pub fn with_nmea_port(mut self, port: u16) -> Self {
        self.nmea = Some(match self.nmea.take() {
            Some(mut nmea) => {
                nmea.port = port;
                nmea
            }
            None => BroadcasterConfig::new(port),
        });
        self
    }

    /// Restrict the NMEA feed to one device. No effect without a port.
    pub fn with_nmea_device(mut self, device: impl Into<String>) -> Self {
        if let Some(nmea) = self.nmea.take() {
            self.nmea = Some(nmea.with_device_filter(device));
        }
        self
    }

    pub fn with_adb_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.adb_path = path.into();
        self
    }

    pub fn with_discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval = interval;
        self
    }
}
