//! Discovery loop: start a session for every device that shows up.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::session::{SessionContext, SessionError, SessionManager, SessionSummary};

/// Default pause between device scans.
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(2);

struct TrackedSession {
    slot: u16,
    cancel: CancellationToken,
    handle: JoinHandle<Result<SessionSummary, SessionError>>,
}

/// Polls the bridge and keeps one session per online device.
///
/// Finished sessions are reaped on the next poll; if the device is still
/// listed it gets a fresh session. Sessions of devices that drop off the
/// list are cancelled.
pub struct DiscoveryLoop {
    ctx: SessionContext,
    interval: Duration,
    sessions: HashMap<String, TrackedSession>,
    waiting_logged: bool,
}

impl DiscoveryLoop {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            interval: DEFAULT_DISCOVERY_INTERVAL,
            sessions: HashMap::new(),
            waiting_logged: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll until `shutdown` fires, then wait for every session to stop.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Discovery loop starting");

        loop {
            self.poll_once(&shutdown).await;

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.drain().await;
        info!("Discovery loop stopped");
    }

    /// One scan: reap finished sessions, cancel vanished devices, start
    /// sessions for new ones. Returns the number of sessions started.
    pub async fn poll_once(&mut self, shutdown: &CancellationToken) -> usize {
        self.reap().await;

        let devices = match self.ctx.bridge.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "Device scan failed");
                return 0;
            }
        };

        for (id, tracked) in &self.sessions {
            if !devices.contains(id) && !tracked.cancel.is_cancelled() {
                info!(device = %id, "Device disappeared, stopping session");
                tracked.cancel.cancel();
            }
        }

        let mut started = 0;
        for id in devices.iter() {
            if self.sessions.contains_key(id) {
                continue;
            }
            info!(device = %id, "Found device");
            self.spawn_session(id.clone(), shutdown);
            started += 1;
        }

        if devices.is_empty() && self.sessions.is_empty() {
            if !self.waiting_logged {
                info!("Waiting for a device to appear over adb...");
                self.waiting_logged = true;
            }
        } else {
            self.waiting_logged = false;
        }

        started
    }

    /// Ids of tracked sessions, sorted.
    pub fn active_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Port slot held by `device`'s session.
    pub fn slot_of(&self, device: &str) -> Option<u16> {
        self.sessions.get(device).map(|s| s.slot)
    }

    /// True while the "waiting for a device" notice is armed off.
    pub fn is_waiting(&self) -> bool {
        self.waiting_logged
    }

    fn spawn_session(&mut self, id: String, shutdown: &CancellationToken) {
        let slot = self.free_slot();
        let ports = self.ctx.config.ports_for_slot(slot);
        let cancel = shutdown.child_token();
        let manager = SessionManager::new(self.ctx.clone(), id.clone(), ports);
        let handle = tokio::spawn(manager.run(cancel.clone()));

        debug!(device = %id, slot, "Session spawned");
        self.sessions.insert(
            id,
            TrackedSession {
                slot,
                cancel,
                handle,
            },
        );
    }

    /// Lowest slot not held by a tracked session.
    fn free_slot(&self) -> u16 {
        (0..=u16::MAX)
            .find(|slot| !self.sessions.values().any(|s| s.slot == *slot))
            .unwrap_or(u16::MAX)
    }

    /// Remove finished sessions and log how they ended.
    async fn reap(&mut self) {
        let finished: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();

        for id in finished {
            if let Some(tracked) = self.sessions.remove(&id) {
                log_outcome(&id, tracked.handle.await);
            }
        }
    }

    async fn drain(&mut self) {
        for (id, tracked) in self.sessions.drain() {
            tracked.cancel.cancel();
            log_outcome(&id, tracked.handle.await);
        }
    }
}

fn log_outcome(
    device: &str,
    outcome: Result<Result<SessionSummary, SessionError>, tokio::task::JoinError>,
) {
    match outcome {
        Ok(Ok(summary)) => debug!(device, records = summary.records, "Session reaped"),
        Ok(Err(e)) => warn!(device, error = %e, "Session failed"),
        Err(e) => error!(device, error = %e, "Session task panicked"),
    }
}
