//! Per-device session bookkeeping.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// Lifecycle of one device session.
///
/// ```text
/// Discovered ──► Bridging ──► Connecting(1..N) ──► Streaming ──► Closed
///                    │               │
///                    └───────────────┴──────────────► Error
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Discovered,
    Bridging,
    Connecting { attempt: u32 },
    Streaming,
    Closed,
    Error,
}

impl SessionState {
    /// Closed and Error end the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered => write!(f, "discovered"),
            Self::Bridging => write!(f, "bridging"),
            Self::Connecting { attempt } => write!(f, "connecting({})", attempt),
            Self::Streaming => write!(f, "streaming"),
            Self::Closed => write!(f, "closed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One device's session record, owned by its session task.
#[derive(Debug)]
pub struct DeviceSession {
    id: String,
    state: SessionState,
    retries: u32,
    started: Instant,
    last_activity: Instant,
}

impl DeviceSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            state: SessionState::Discovered,
            retries: 0,
            started: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`. Failed connect attempts bump the retry counter.
    pub fn transition(&mut self, next: SessionState) {
        if let SessionState::Connecting { attempt } = next {
            self.retries = attempt.saturating_sub(1);
        }
        debug!(device = %self.id, from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    /// Record inbound traffic.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Connect attempts that failed before the current one.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut session = DeviceSession::new("emulator-5554");
        assert_eq!(session.state(), SessionState::Discovered);

        session.transition(SessionState::Bridging);
        session.transition(SessionState::Connecting { attempt: 1 });
        assert_eq!(session.retries(), 0);
        session.transition(SessionState::Connecting { attempt: 3 });
        assert_eq!(session.retries(), 2);

        session.transition(SessionState::Streaming);
        assert!(!session.state().is_terminal());
        session.transition(SessionState::Closed);
        assert!(session.state().is_terminal());
        assert_eq!(session.retries(), 2);
    }

    #[test]
    fn test_touch_advances_activity() {
        let mut session = DeviceSession::new("a");
        let before = session.last_activity();
        session.touch();
        assert!(session.last_activity() >= before);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Connecting { attempt: 4 }.to_string(), "connecting(4)");
        assert_eq!(SessionState::Error.to_string(), "error");
    }
}
