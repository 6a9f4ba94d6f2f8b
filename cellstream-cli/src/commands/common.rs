//! Common helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use cellstream::config::config_file_path;

/// The config file to use: `--config` when given, else the default path.
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    cli_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Render an optional value for display.
pub fn display_or_unset(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "(not set)".to_string())
}
