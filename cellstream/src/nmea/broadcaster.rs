//! Live NMEA fix broadcaster.
//!
//! Sessions push location updates; a pump task turns the latest fix into a
//! GGA + RMC pair once per period and fans it out to every connected TCP
//! listener.
//!
//! ```text
//!   update() ──► watch<Option<Arc<Fix>>> ──► pump (every period)
//!                                               │
//!                                               ▼
//!                                   broadcast<Arc<str>> ──► listener task ──► TCP
//!                                                       ──► listener task ──► TCP
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fix::Fix;
use super::sentence::sentences;
use crate::record::RawMessage;

// =============================================================================
// Configuration
// =============================================================================

/// Default pump period.
pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_secs(1);

/// Pump cycles buffered per listener before a slow listener starts skipping.
const LISTENER_BACKLOG: usize = 16;

/// Broadcaster settings.
#[derive(Clone, Debug)]
pub struct BroadcasterConfig {
    /// Address to bind; all interfaces by default.
    pub bind_addr: IpAddr,

    /// TCP port to listen on. `0` picks a free port.
    pub port: u16,

    /// Only accept fixes from this device when set.
    pub device_filter: Option<String>,

    /// Pump period.
    pub interval: Duration,
}

impl BroadcasterConfig {
    pub fn new(port: u16) -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port,
            device_filter: None,
            interval: DEFAULT_PUMP_INTERVAL,
        }
    }

    pub fn with_device_filter(mut self, device: impl Into<String>) -> Self {
        self.device_filter = Some(device.into());
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Errors starting the broadcaster.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Failed to bind NMEA listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Broadcaster
// =============================================================================

/// Holds the latest fix and pushes it to listeners.
///
/// Shared between sessions as `Arc<FixBroadcaster>`. `update` never blocks.
pub struct FixBroadcaster {
    config: BroadcasterConfig,
    fix_tx: watch::Sender<Option<Arc<Fix>>>,
    out_tx: broadcast::Sender<Arc<str>>,
}

impl FixBroadcaster {
    pub fn new(config: BroadcasterConfig) -> Self {
        let (fix_tx, _) = watch::channel(None);
        let (out_tx, _) = broadcast::channel(LISTENER_BACKLOG);
        Self {
            config,
            fix_tx,
            out_tx,
        }
    }

    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    /// Offer a device message as the new fix.
    ///
    /// Ignored when a device filter is set and does not match, or when the
    /// message lacks either coordinate. Returns whether the fix was replaced.
    pub fn update(&self, device_id: &str, msg: &RawMessage) -> bool {
        if let Some(filter) = &self.config.device_filter {
            if filter != device_id {
                return false;
            }
        }
        let Some(fix) = Fix::from_message(msg) else {
            return false;
        };

        self.fix_tx.send_replace(Some(Arc::new(fix)));
        true
    }

    /// Snapshot of the retained fix.
    pub fn latest(&self) -> Option<Arc<Fix>> {
        self.fix_tx.borrow().clone()
    }

    /// Subscribe to pump output. Each item is one cycle's sentences,
    /// newline-terminated.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.out_tx.subscribe()
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.out_tx.receiver_count()
    }

    /// Run one pump cycle.
    ///
    /// Returns the number of listeners the sentences were queued for; zero
    /// when no fix is retained or nobody is listening.
    pub fn pump_once(&self) -> usize {
        let Some(fix) = self.latest() else {
            return 0;
        };

        let mut payload = String::new();
        for sentence in sentences(&fix) {
            payload.push_str(&sentence);
            payload.push('\n');
        }
        self.out_tx.send(Arc::from(payload)).unwrap_or(0)
    }

    /// Bind the listener socket and spawn the accept and pump tasks.
    ///
    /// Both tasks stop when `shutdown` fires.
    pub async fn start(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> Result<BroadcasterHandle, BroadcastError> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BroadcastError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BroadcastError::Bind { addr, source })?;

        info!(addr = %local_addr, "NMEA TCP server listening");

        let accept_task = tokio::spawn(Arc::clone(&self).accept_loop(listener, shutdown.clone()));
        let pump_task = tokio::spawn(self.pump_loop(shutdown));

        Ok(BroadcasterHandle {
            local_addr,
            tasks: vec![accept_task, pump_task],
        })
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "NMEA listener attached");
                        let rx = self.subscribe();
                        tokio::spawn(serve_listener(stream, rx, shutdown.clone()));
                    }
                    Err(e) => warn!(error = %e, "NMEA accept failed"),
                }
            }
        }
        debug!("NMEA accept loop stopped");
    }

    async fn pump_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                _ = ticker.tick() => {
                    self.pump_once();
                }
            }
        }
        debug!("NMEA pump stopped");
    }
}

/// Handle to a started broadcaster.
#[derive(Debug)]
pub struct BroadcasterHandle {
    local_addr: SocketAddr,
    tasks: Vec<JoinHandle<()>>,
}

impl BroadcasterHandle {
    /// Address actually bound (useful when the configured port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the accept and pump tasks to finish.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Forward pump output to one listener until it disconnects or a write
/// fails. Anything the listener sends is discarded.
async fn serve_listener(
    stream: TcpStream,
    mut rx: broadcast::Receiver<Arc<str>>,
    shutdown: CancellationToken,
) {
    let peer = stream.peer_addr().ok();
    let (mut reader, mut writer) = stream.into_split();
    let mut scratch = [0u8; 256];

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            read = reader.read(&mut scratch) => match read {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            },

            msg = rx.recv() => match msg {
                Ok(payload) => {
                    if writer.write_all(payload.as_bytes()).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(peer = ?peer, skipped, "NMEA listener lagging, skipped cycles");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    debug!(peer = ?peer, "NMEA listener detached");
}
