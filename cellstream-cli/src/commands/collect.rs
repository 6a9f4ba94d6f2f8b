//! Collect command - run the collector until Ctrl-C.

use std::path::{Path, PathBuf};

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cellstream::app::{AppConfig, CollectorApp};
use cellstream::config::ConfigFile;
use cellstream::sink::OutputConfig;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `cellstream collect`.
#[derive(Debug, Default, Args)]
pub struct CollectArgs {
    /// Append one JSON object per record
    #[arg(long, value_name = "PATH")]
    pub jsonl: Option<PathBuf>,

    /// Append CSV rows (header written once)
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Insert rows into a SQLite table
    #[arg(long, value_name = "PATH")]
    pub sqlite: Option<PathBuf>,

    /// KML placemarks for records with a position
    #[arg(long, value_name = "PATH")]
    pub kml: Option<PathBuf>,

    /// GPX track points for records with a position
    #[arg(long, value_name = "PATH")]
    pub gpx: Option<PathBuf>,

    /// Also write location-only records for messages without a cell
    #[arg(long)]
    pub gps_only: bool,

    /// Serve GGA/RMC sentences on this TCP port
    #[arg(long, value_name = "PORT")]
    pub nmea_port: Option<u16>,

    /// Only broadcast fixes from this device id
    #[arg(long, value_name = "ID")]
    pub nmea_device: Option<String>,

    /// adb executable
    #[arg(long, value_name = "PATH")]
    pub adb: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl CollectArgs {
    fn output(&self) -> OutputConfig {
        OutputConfig {
            jsonl: self.jsonl.clone(),
            csv: self.csv.clone(),
            sqlite: self.sqlite.clone(),
            kml: self.kml.clone(),
            gpx: self.gpx.clone(),
        }
    }
}

/// Layer the command-line flags over the file configuration.
pub fn build_app_config(file: &ConfigFile, args: &CollectArgs) -> AppConfig {
    let mut config = AppConfig::from_config_file(file).with_output(&args.output());

    if args.gps_only {
        config = config.with_gps_only(true);
    }
    if let Some(port) = args.nmea_port {
        config = config.with_nmea_port(port);
    }
    if let Some(device) = &args.nmea_device {
        config = config.with_nmea_device(device.clone());
    }
    if let Some(adb) = &args.adb {
        config = config.with_adb_path(adb.clone());
    }
    config
}

/// Run the collect command.
pub fn run(args: CollectArgs, config_path: &Path) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, args.verbose)?;
    runner.log_startup("collect", config_path);

    let config = build_app_config(runner.config(), &args);
    if args.nmea_device.is_some() && config.nmea.is_none() {
        warn!("--nmea-device has no effect without an NMEA port");
    }

    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async move {
        let app = CollectorApp::start(config, shutdown).await?;
        if let Some(addr) = app.nmea_addr() {
            info!(addr = %addr, "NMEA feed available");
        }
        info!("Collecting, press Ctrl-C to stop");

        app.wait().await?;
        Ok::<(), CliError>(())
    })?;

    info!("Collector stopped");
    Ok(())
}
