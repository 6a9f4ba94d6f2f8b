//! Init command - write the default configuration file.

use std::path::Path;

use cellstream::config::ConfigFile;
use console::style;

use crate::error::CliError;

/// What `init` did.
#[derive(Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    Overwritten,
    Kept,
}

/// Run the init command.
pub fn run(config_path: &Path, force: bool) -> Result<(), CliError> {
    let outcome = write_default(config_path, force)?;

    match outcome {
        InitOutcome::Created => println!("{} default configuration", style("Created").green().bold()),
        InitOutcome::Overwritten => {
            println!("{} with defaults", style("Overwrote configuration").yellow().bold())
        }
        InitOutcome::Kept => {
            println!("Configuration already exists; use --force to overwrite it.");
        }
    }

    println!("Configuration file: {}", config_path.display());
    println!();
    println!("Set output paths under [output] to enable sinks.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

/// Write defaults to `path` unless it exists and `force` is off.
pub fn write_default(path: &Path, force: bool) -> Result<InitOutcome, CliError> {
    let existed = path.exists();
    if existed && !force {
        return Ok(InitOutcome::Kept);
    }

    ConfigFile::default().save_to(path)?;

    Ok(if existed {
        InitOutcome::Overwritten
    } else {
        InitOutcome::Created
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_then_keeps() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg/config.ini");

        assert_eq!(write_default(&path, false).unwrap(), InitOutcome::Created);
        assert!(path.exists());

        std::fs::write(&path, "[session]\ngps_only = true\n").unwrap();
        assert_eq!(write_default(&path, false).unwrap(), InitOutcome::Kept);
        assert!(ConfigFile::load_from(&path).unwrap().session.gps_only);
    }

    #[test]
    fn test_init_force_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[session]\ngps_only = true\n").unwrap();

        assert_eq!(write_default(&path, true).unwrap(), InitOutcome::Overwritten);
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }
}
