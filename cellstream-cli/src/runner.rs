//! CLI runner for common setup.
//!
//! Loads the config file and initializes logging once, so command handlers
//! start from a ready environment.

use std::path::Path;

use tracing::info;

use cellstream::config::ConfigFile;
use cellstream::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Keeps the file writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config at `config_path` and initialize logging from it.
    ///
    /// `verbose` raises the default level to `debug`; `RUST_LOG` still wins.
    pub fn new(config_path: &Path, verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load_from(config_path)?;

        let level = if verbose { "debug" } else { "info" };
        let logging_guard = init_logging(&config.logging.directory, &config.logging.file, level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str, config_path: &Path) {
        info!("CellStream v{}", cellstream::VERSION);
        info!(config = %config_path.display(), "CellStream CLI: {} command", command);
    }
}
