//! Per-device session: bridge, connect, stream.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────────┐  forward data port   ┌────────────┐  TCP connect, N tries  ┌───────────┐
//! │ Bridging │ ───────────────────► │ Connecting │ ─────────────────────► │ Streaming │
//! └────┬─────┘  (+ gps port and     └─────┬──────┘                        └─────┬─────┘
//!      │         service start,           │ exhausted                          │ EOF / error /
//!      │         best effort)             ▼                                    ▼ shutdown
//!      └──────────────────────────────► Error                               Closed
//! ```
//!
//! Each line read while streaming is parsed on its own. The fix fields go to
//! the broadcaster, and the record (if any) goes to the sink fanout on the
//! blocking pool, one line at a time, so every sink sees this device's
//! records in arrival order.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::MessageDispatcher;
use super::retry::RetryPolicy;
use super::state::{DeviceSession, SessionState};
use crate::device::{BridgeError, DeviceBridge};
use crate::nmea::FixBroadcaster;
use crate::record::RawMessage;
use crate::sink::SinkFanout;

// =============================================================================
// Configuration
// =============================================================================

/// Telemetry server port on the phone.
pub const DEFAULT_DATA_PORT: u16 = 8765;

/// NMEA feed port on the phone.
pub const DEFAULT_GPS_PORT: u16 = 8766;

/// Longest slice of a rejected line echoed into the log.
const MAX_LOGGED_LINE: usize = 200;

/// Longest accepted feed line, newline included. Longer lines are discarded.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Settings shared by every session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Data port on the device, also the host port of slot 0.
    pub data_port: u16,

    /// GPS feed port on the device, also the host port of slot 0.
    pub gps_port: u16,

    /// Host address the forwarded ports are reachable on.
    pub connect_host: IpAddr,

    /// Connect retry policy.
    pub retry: RetryPolicy,

    /// Emit fix-only records for messages without an identified cell.
    pub gps_only: bool,

    /// Ask the device to start its telemetry service after bridging.
    pub start_service: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_port: DEFAULT_DATA_PORT,
            gps_port: DEFAULT_GPS_PORT,
            connect_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            retry: RetryPolicy::default(),
            gps_only: false,
            start_service: true,
        }
    }
}

impl SessionConfig {
    pub fn with_ports(mut self, data_port: u16, gps_port: u16) -> Self {
        self.data_port = data_port;
        self.gps_port = gps_port;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_gps_only(mut self, gps_only: bool) -> Self {
        self.gps_only = gps_only;
        self
    }

    pub fn with_start_service(mut self, start_service: bool) -> Self {
        self.start_service = start_service;
        self
    }

    /// Host ports for the session in `slot`.
    ///
    /// Concurrent devices must not share a host port, so each slot shifts
    /// both ports by two. Device-side ports never change.
    pub fn ports_for_slot(&self, slot: u16) -> PortAssignment {
        let shift = slot.saturating_mul(2);
        PortAssignment {
            local_data: self.data_port.saturating_add(shift),
            local_gps: self.gps_port.saturating_add(shift),
        }
    }
}

/// Host ports forwarded for one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortAssignment {
    pub local_data: u16,
    pub local_gps: u16,
}

/// Collaborators shared by all sessions.
#[derive(Clone)]
pub struct SessionContext {
    pub bridge: Arc<dyn DeviceBridge>,
    pub fanout: Arc<SinkFanout>,
    pub broadcaster: Option<Arc<FixBroadcaster>>,
    pub config: SessionConfig,
}

// =============================================================================
// Line reader
// =============================================================================

/// Result of one bounded line read.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    /// A line (possibly without trailing newline at EOF) is in the buffer.
    Line,
    /// The line exceeded the limit and was consumed without buffering.
    Oversized(usize),
}

/// Read up to and including the next `\n`, buffering at most `limit` bytes.
///
/// An over-long line is still consumed to its end, so the reader stays
/// aligned on the next line; only its length is reported.
async fn read_line_bounded<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(match total {
                0 => LineRead::Eof,
                n if n > limit => LineRead::Oversized(n),
                _ => LineRead::Line,
            });
        }

        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };
        total = total.saturating_add(used);
        if total <= limit {
            buf.extend_from_slice(&available[..used]);
        } else if !buf.is_empty() {
            buf.clear();
        }
        AsyncBufReadExt::consume(reader, used);

        if done {
            return Ok(if total > limit {
                LineRead::Oversized(total)
            } else {
                LineRead::Line
            });
        }
    }
}

// =============================================================================
// Errors and summary
// =============================================================================

/// Why a session ended abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The primary data port could not be forwarded.
    #[error("[{device}] failed to forward data port: {source}")]
    Bridge {
        device: String,
        #[source]
        source: BridgeError,
    },

    /// Every connect attempt failed.
    #[error("[{device}] failed to connect to {addr} after {attempts} attempts: {source}")]
    ConnectExhausted {
        device: String,
        addr: SocketAddr,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Counters reported when a session ends.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSummary {
    pub device_id: String,
    /// Non-blank lines read.
    pub lines: u64,
    /// Records handed to the fanout.
    pub records: u64,
    /// Lines that failed to parse.
    pub skipped: u64,
    /// Records at least one sink failed to store.
    pub sink_failures: u64,
    pub duration: Duration,
}

// =============================================================================
// Session manager
// =============================================================================

/// Drives one device from bridging to end of stream.
pub struct SessionManager {
    ctx: SessionContext,
    session: DeviceSession,
    ports: PortAssignment,
    dispatcher: MessageDispatcher,
    summary: SessionSummary,
}

impl SessionManager {
    pub fn new(ctx: SessionContext, device_id: impl Into<String>, ports: PortAssignment) -> Self {
        let device_id = device_id.into();
        let dispatcher = MessageDispatcher::new(ctx.config.gps_only);
        Self {
            ctx,
            session: DeviceSession::new(device_id.clone()),
            ports,
            dispatcher,
            summary: SessionSummary {
                device_id,
                ..Default::default()
            },
        }
    }

    pub fn device_id(&self) -> &str {
        self.session.id()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn ports(&self) -> PortAssignment {
        self.ports
    }

    /// Run the session to completion.
    ///
    /// Returns the summary when the stream ended (EOF, read error or
    /// shutdown). Bridge and connect failures are returned as errors; the
    /// discovery loop retries them on its next poll.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<SessionSummary, SessionError> {
        info!(
            device = %self.device_id(),
            local_data_port = self.ports.local_data,
            local_gps_port = self.ports.local_gps,
            "Session starting"
        );

        if let Err(e) = self.bridge().await {
            self.session.transition(SessionState::Error);
            return Err(e);
        }

        let stream = match self.connect(&shutdown).await {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                self.session.transition(SessionState::Closed);
                return Ok(self.finish());
            }
            Err(e) => {
                self.session.transition(SessionState::Error);
                return Err(e);
            }
        };

        info!(device = %self.device_id(), "Connected, waiting for data");
        self.session.transition(SessionState::Streaming);
        self.stream(BufReader::new(stream), &shutdown).await;
        self.session.transition(SessionState::Closed);

        Ok(self.finish())
    }

    /// Forward the device ports and start the remote service.
    async fn bridge(&mut self) -> Result<(), SessionError> {
        self.session.transition(SessionState::Bridging);
        let device = self.session.id().to_string();
        let bridge = Arc::clone(&self.ctx.bridge);
        let config = &self.ctx.config;

        debug!(device = %device, local = self.ports.local_data, remote = config.data_port, "Forwarding data port");
        bridge
            .forward(&device, self.ports.local_data, config.data_port)
            .await
            .map_err(|source| SessionError::Bridge {
                device: device.clone(),
                source,
            })?;

        debug!(device = %device, local = self.ports.local_gps, remote = config.gps_port, "Forwarding GPS port");
        if let Err(e) = bridge
            .forward(&device, self.ports.local_gps, config.gps_port)
            .await
        {
            warn!(device = %device, error = %e, "Failed to forward GPS port");
        }

        if config.start_service {
            if let Err(e) = bridge.start_remote_service(&device).await {
                warn!(device = %device, error = %e, "Failed to start remote service");
            }
        }
        Ok(())
    }

    /// Connect to the forwarded data port, retrying per policy.
    ///
    /// `Ok(None)` means shutdown fired while waiting between attempts.
    async fn connect(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<Option<TcpStream>, SessionError> {
        let addr = SocketAddr::new(self.ctx.config.connect_host, self.ports.local_data);
        let policy = self.ctx.config.retry.clone();
        let mut attempt = 1;

        loop {
            self.session.transition(SessionState::Connecting { attempt });

            let err = match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(Some(stream)),
                Err(e) => e,
            };

            let Some(delay) = policy.delay_after(attempt) else {
                return Err(SessionError::ConnectExhausted {
                    device: self.session.id().to_string(),
                    addr,
                    attempts: attempt,
                    source: err,
                });
            };

            info!(device = %self.device_id(), attempt, error = %err, "Connect attempt failed, retrying");
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(None),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Process newline-delimited messages until EOF, a read error or
    /// shutdown.
    pub async fn stream<R>(&mut self, mut reader: R, shutdown: &CancellationToken)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(device = %self.device_id(), "Session cancelled");
                    break;
                }
                read = read_line_bounded(&mut reader, &mut buf, MAX_LINE_BYTES) => read,
            };

            match read {
                Ok(LineRead::Eof) => {
                    info!(device = %self.device_id(), "Connection closed by peer");
                    break;
                }
                Ok(LineRead::Line) => {
                    let line = String::from_utf8_lossy(&buf);
                    self.handle_line(&line).await;
                }
                Ok(LineRead::Oversized(len)) => {
                    self.summary.lines += 1;
                    self.summary.skipped += 1;
                    warn!(
                        device = %self.device_id(),
                        bytes = len,
                        limit = MAX_LINE_BYTES,
                        "Line too long, discarding"
                    );
                }
                Err(e) => {
                    warn!(device = %self.device_id(), error = %e, "Read failed");
                    break;
                }
            }
        }
    }

    /// Handle one line of the feed.
    pub async fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.summary.lines += 1;
        self.session.touch();

        let message = match RawMessage::from_line(line) {
            Ok(message) => message,
            Err(e) => {
                self.summary.skipped += 1;
                warn!(
                    device = %self.device_id(),
                    error = %e,
                    line = %truncate(line, MAX_LOGGED_LINE),
                    "Bad JSON, skipping line"
                );
                return;
            }
        };

        if let Some(broadcaster) = &self.ctx.broadcaster {
            broadcaster.update(self.session.id(), &message);
        }

        let Some(dispatch) = self.dispatcher.dispatch(self.session.id(), &message) else {
            return;
        };
        info!(device = %self.device_id(), "{}", dispatch.summary());

        let record = dispatch.into_record();
        let fanout = Arc::clone(&self.ctx.fanout);
        self.summary.records += 1;
        match tokio::task::spawn_blocking(move || fanout.write(&record)).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => self.summary.sink_failures += 1,
            Err(e) => {
                self.summary.sink_failures += 1;
                warn!(device = %self.device_id(), error = %e, "Sink task failed");
            }
        }
    }

    /// Counters so far.
    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    fn finish(mut self) -> SessionSummary {
        self.summary.duration = self.session.uptime();
        info!(
            device = %self.summary.device_id,
            state = %self.session.state(),
            lines = self.summary.lines,
            records = self.summary.records,
            skipped = self.summary.skipped,
            sink_failures = self.summary.sink_failures,
            duration_secs = self.summary.duration.as_secs(),
            "Session ended"
        );
        self.summary
    }
}

fn truncate(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
