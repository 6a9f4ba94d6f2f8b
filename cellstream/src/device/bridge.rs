//! Device bridge: enumerate phones and expose their local services.
//!
//! The collector never talks to a phone directly. It asks the bridge which
//! devices are reachable, then has the bridge forward a host TCP port to the
//! phone's telemetry server. [`AdbBridge`] does this by shelling out to
//! `adb`; tests substitute an in-memory implementation.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Foreground service started on each phone.
pub const DEFAULT_SERVICE_COMPONENT: &str = "com.example.cellstream/.CellStreamService";

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from the bridge tool.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The tool could not be started at all.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported failure.
    #[error("`{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },
}

/// Access to reachable devices.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so sessions can hold an
/// `Arc<dyn DeviceBridge>`.
pub trait DeviceBridge: Send + Sync {
    /// Ids of devices currently online.
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, BridgeError>>;

    /// Make `remote_port` on `device` reachable at `127.0.0.1:local_port`.
    ///
    /// Re-forwarding an existing mapping must succeed.
    fn forward<'a>(
        &'a self,
        device: &'a str,
        local_port: u16,
        remote_port: u16,
    ) -> BoxFuture<'a, Result<(), BridgeError>>;

    /// Ask the device to start its telemetry service.
    fn start_remote_service<'a>(&'a self, device: &'a str)
        -> BoxFuture<'a, Result<(), BridgeError>>;
}

/// Bridge backed by the `adb` command-line tool.
#[derive(Clone, Debug)]
pub struct AdbBridge {
    program: PathBuf,
    service_component: String,
}

impl Default for AdbBridge {
    fn default() -> Self {
        Self::new("adb")
    }
}

impl AdbBridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            service_component: DEFAULT_SERVICE_COMPONENT.to_string(),
        }
    }

    /// Override the `package/.Service` component started on each device.
    pub fn with_service_component(mut self, component: impl Into<String>) -> Self {
        self.service_component = component.into();
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn service_component(&self) -> &str {
        &self.service_component
    }

    /// Run adb with `args` and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, BridgeError> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        debug!(command = %command, "Running bridge command");

        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BridgeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::CommandFailed {
                command,
                reason: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DeviceBridge for AdbBridge {
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, BridgeError>> {
        Box::pin(async move {
            let stdout = self.run(&["devices"]).await?;
            Ok(parse_device_list(&stdout))
        })
    }

    fn forward<'a>(
        &'a self,
        device: &'a str,
        local_port: u16,
        remote_port: u16,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move {
            let local = format!("tcp:{}", local_port);
            let remote = format!("tcp:{}", remote_port);
            self.run(&["-s", device, "forward", local.as_str(), remote.as_str()]).await?;
            Ok(())
        })
    }

    fn start_remote_service<'a>(
        &'a self,
        device: &'a str,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move {
            self.run(&[
                "-s",
                device,
                "shell",
                "am",
                "start-foreground-service",
                "-n",
                self.service_component.as_str(),
            ])
            .await?;
            Ok(())
        })
    }
}

/// Parse `adb devices` output into the ids of online devices.
///
/// The first line is a header. Rows in any state other than `device`
/// (`offline`, `unauthorized`, ...) are skipped.
pub fn parse_device_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(id), Some("device")) => Some(id.to_string()),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_list() {
        let output = "List of devices attached\n\
                      emulator-5554\tdevice\n\
                      R58M123ABC\tunauthorized\n\
                      0123456789ABCDEF\tdevice product:foo model:bar\n\
                      \n";
        assert_eq!(
            parse_device_list(output),
            vec!["emulator-5554".to_string(), "0123456789ABCDEF".to_string()]
        );
    }

    #[test]
    fn test_parse_empty_device_list() {
        assert!(parse_device_list("List of devices attached\n\n").is_empty());
        assert!(parse_device_list("").is_empty());
    }

    #[test]
    fn test_header_is_skipped_even_if_it_looks_like_a_row() {
        assert!(parse_device_list("ghost device\n").is_empty());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let bridge = AdbBridge::new("/nonexistent/cellstream-adb");
        let err = bridge.list_devices().await.unwrap_err();
        assert!(matches!(err, BridgeError::Spawn { .. }));
    }

    #[test]
    fn test_service_component_override() {
        let bridge = AdbBridge::default().with_service_component("org.test/.Svc");
        assert_eq!(bridge.service_component(), "org.test/.Svc");
        assert_eq!(bridge.program(), &PathBuf::from("adb"));
    }
}
