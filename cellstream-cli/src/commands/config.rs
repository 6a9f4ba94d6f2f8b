//! Config command - show the effective configuration.

use std::path::Path;

use cellstream::config::ConfigFile;
use console::style;

use super::common::display_or_unset;
use crate::error::CliError;

/// Run the config command.
pub fn run(config_path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(config_path)?;

    let state = if config_path.exists() {
        ""
    } else {
        " (missing, showing defaults)"
    };
    println!("Configuration file: {}{}", config_path.display(), state);
    println!();

    for (section, entries) in sections(&config) {
        println!("{}", style(format!("[{}]", section)).bold());
        for (key, value) in entries {
            println!("  {} = {}", key, display_or_unset(value));
        }
        println!();
    }

    Ok(())
}

type Entries = Vec<(&'static str, Option<String>)>;

/// Effective settings grouped by INI section.
fn sections(config: &ConfigFile) -> Vec<(&'static str, Entries)> {
    let path = |p: &Option<std::path::PathBuf>| p.as_ref().map(|p| p.display().to_string());

    vec![
        (
            "device",
            vec![
                ("data_port", Some(config.device.data_port.to_string())),
                ("gps_port", Some(config.device.gps_port.to_string())),
                ("service_component", Some(config.device.service_component.clone())),
                ("adb_path", Some(config.device.adb_path.display().to_string())),
            ],
        ),
        (
            "session",
            vec![
                ("connect_attempts", Some(config.session.connect_attempts.to_string())),
                ("connect_delay_ms", Some(config.session.connect_delay_ms.to_string())),
                (
                    "discovery_interval_secs",
                    Some(config.session.discovery_interval_secs.to_string()),
                ),
                ("gps_only", Some(config.session.gps_only.to_string())),
            ],
        ),
        (
            "output",
            vec![
                ("jsonl", path(&config.output.jsonl)),
                ("csv", path(&config.output.csv)),
                ("sqlite", path(&config.output.sqlite)),
                ("kml", path(&config.output.kml)),
                ("gpx", path(&config.output.gpx)),
            ],
        ),
        (
            "nmea",
            vec![
                ("port", config.nmea.port.map(|p| p.to_string())),
                ("device", config.nmea.device.clone()),
                ("interval_ms", Some(config.nmea.interval_ms.to_string())),
            ],
        ),
        (
            "logging",
            vec![
                ("directory", Some(config.logging.directory.display().to_string())),
                ("file", Some(config.logging.file.clone())),
            ],
        ),
    ]
}
