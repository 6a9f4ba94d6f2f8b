//! Device sessions.
//!
//! A session owns one phone's stream end to end: it forwards the phone's
//! ports through the [`DeviceBridge`](crate::device::DeviceBridge), connects
//! with bounded retries, then reads newline-delimited JSON until the stream
//! ends. Every session runs in its own task, so a failing phone never
//! affects the others.

mod dispatch;
mod manager;
mod retry;
mod state;

pub use dispatch::{Dispatch, MessageDispatcher};
pub use manager::{
    PortAssignment, SessionConfig, SessionContext, SessionError, SessionManager, SessionSummary,
    DEFAULT_DATA_PORT, DEFAULT_GPS_PORT,
};
pub use retry::{RetryPolicy, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_DELAY_MS};
pub use state::{DeviceSession, SessionState};
