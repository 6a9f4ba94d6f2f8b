//! Application bootstrap implementation.
//!
//! `CollectorApp` owns the startup order: sinks first (an unopenable sink is
//! fatal before any device is touched), then the NMEA listener, then the
//! discovery loop that spawns sessions. Shutdown runs the other way round so
//! every session's last record is written before the document footers.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::device::{AdbBridge, DeviceBridge, DiscoveryLoop};
use crate::nmea::{BroadcasterHandle, FixBroadcaster};
use crate::session::SessionContext;
use crate::sink::SinkFanout;

/// Running collector.
///
/// # Example
///
/// ```ignore
/// use cellstream::app::{AppConfig, CollectorApp};
/// use tokio_util::sync::CancellationToken;
///
/// let shutdown = CancellationToken::new();
/// let app = CollectorApp::start(config, shutdown.clone()).await?;
///
/// // Ctrl-C handler calls shutdown.cancel()
/// app.wait().await?;
/// ```
pub struct CollectorApp {
    fanout: Arc<SinkFanout>,
    broadcaster: Option<Arc<FixBroadcaster>>,
    broadcaster_handle: Option<BroadcasterHandle>,
    discovery: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl CollectorApp {
    /// Start the collector against the real `adb` bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if a sink cannot be opened or the NMEA port cannot
    /// be bound.
    pub async fn start(config: AppConfig, shutdown: CancellationToken) -> Result<Self, AppError> {
        let bridge = AdbBridge::new(config.adb_path.clone())
            .with_service_component(config.service_component.clone());
        Self::start_with_bridge(config, Arc::new(bridge), shutdown).await
    }

    /// Start the collector with a caller-supplied bridge.
    pub async fn start_with_bridge(
        config: AppConfig,
        bridge: Arc<dyn DeviceBridge>,
        shutdown: CancellationToken,
    ) -> Result<Self, AppError> {
        info!("Starting collector");

        // 1. Sinks
        if config.output.is_empty() {
            warn!("No sinks configured, records will only be logged");
        }
        let fanout = Arc::new(SinkFanout::from_config(&config.output)?);

        // 2. NMEA listener
        let (broadcaster, broadcaster_handle) = match &config.nmea {
            Some(nmea) => {
                let broadcaster = Arc::new(FixBroadcaster::new(nmea.clone()));
                let handle = Arc::clone(&broadcaster).start(shutdown.clone()).await?;
                (Some(broadcaster), Some(handle))
            }
            None => (None, None),
        };

        // 3. Discovery
        let ctx = SessionContext {
            bridge,
            fanout: Arc::clone(&fanout),
            broadcaster: broadcaster.clone(),
            config: config.session.clone(),
        };
        let discovery = DiscoveryLoop::new(ctx).with_interval(config.discovery_interval);
        let discovery = tokio::spawn(discovery.run(shutdown.clone()));

        info!(
            sinks = fanout.len(),
            data_port = config.session.data_port,
            gps_port = config.session.gps_port,
            gps_only = config.session.gps_only,
            "Collector started"
        );

        Ok(Self {
            fanout,
            broadcaster,
            broadcaster_handle,
            discovery,
            shutdown,
        })
    }

    /// Sinks shared by the sessions.
    pub fn fanout(&self) -> Arc<SinkFanout> {
        Arc::clone(&self.fanout)
    }

    /// The broadcaster, when NMEA is enabled.
    pub fn broadcaster(&self) -> Option<Arc<FixBroadcaster>> {
        self.broadcaster.clone()
    }

    /// Address the NMEA listener is bound to.
    pub fn nmea_addr(&self) -> Option<SocketAddr> {
        self.broadcaster_handle.as_ref().map(|h| h.local_addr())
    }

    /// Token that stops the collector when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run until the shutdown token fires, then stop cleanly.
    pub async fn wait(self) -> Result<(), AppError> {
        self.shutdown.cancelled().await;
        self.finish().await
    }

    /// Cancel the token and stop cleanly.
    pub async fn shutdown(self) -> Result<(), AppError> {
        self.shutdown.cancel();
        self.finish().await
    }

    async fn finish(self) -> Result<(), AppError> {
        info!("Shutting down collector");

        // Sessions drain inside the discovery task.
        if let Err(e) = self.discovery.await {
            error!(error = %e, "Discovery task failed");
        }

        if let Some(handle) = self.broadcaster_handle {
            handle.join().await;
        }

        self.fanout.finalize().map_err(AppError::Finalize)?;

        info!("Collector shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BoxFuture, BridgeError};
    use crate::sink::OutputConfig;
    use std::time::Duration;
    use tempfile::tempdir;

    struct NoDevices;

    impl DeviceBridge for NoDevices {
        fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, BridgeError>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn forward<'a>(
            &'a self,
            _device: &'a str,
            _local_port: u16,
            _remote_port: u16,
        ) -> BoxFuture<'a, Result<(), BridgeError>> {
            Box::pin(async { Ok(()) })
        }

        fn start_remote_service<'a>(
            &'a self,
            _device: &'a str,
        ) -> BoxFuture<'a, Result<(), BridgeError>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_app_start_and_shutdown() {
        let temp_dir = tempdir().unwrap();
        let kml = temp_dir.path().join("track.kml");
        let config = AppConfig::default()
            .with_output(&OutputConfig {
                jsonl: Some(temp_dir.path().join("cells.jsonl")),
                kml: Some(kml.clone()),
                ..Default::default()
            })
            .with_nmea_port(0)
            .with_discovery_interval(Duration::from_millis(20));

        let app = CollectorApp::start_with_bridge(config, Arc::new(NoDevices), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(app.fanout().len(), 2);
        assert!(app.broadcaster().is_some());
        assert_ne!(app.nmea_addr().unwrap().port(), 0);

        app.shutdown().await.unwrap();

        let text = std::fs::read_to_string(&kml).unwrap();
        assert!(text.ends_with("</Document></kml>\n"));
    }

    #[tokio::test]
    async fn test_wait_returns_after_cancel() {
        let shutdown = CancellationToken::new();
        let app = CollectorApp::start_with_bridge(
            AppConfig::default(),
            Arc::new(NoDevices),
            shutdown.clone(),
        )
        .await
        .unwrap();
        assert!(app.nmea_addr().is_none());

        let waiter = tokio::spawn(app.wait());
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_unopenable_sink_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let config = AppConfig::default().with_output(&OutputConfig {
            csv: Some(blocker.join("out.csv")),
            ..Default::default()
        });

        let result =
            CollectorApp::start_with_bridge(config, Arc::new(NoDevices), CancellationToken::new())
                .await;
        assert!(matches!(result, Err(AppError::SinkOpen(_))));
    }
}
