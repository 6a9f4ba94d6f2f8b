//! Application error types.

use std::fmt;

use crate::config::ConfigError;
use crate::nmea::BroadcastError;
use crate::sink::{FanoutError, SinkError};

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// A configured sink could not be opened.
    SinkOpen(SinkError),

    /// The NMEA listener could not be started.
    Broadcaster(BroadcastError),

    /// One or more sinks failed to finalize.
    Finalize(FanoutError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::SinkOpen(e) => write!(f, "Failed to open sink: {}", e),
            AppError::Broadcaster(e) => write!(f, "Failed to start NMEA broadcaster: {}", e),
            AppError::Finalize(e) => write!(f, "Failed to finalize sinks: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::SinkOpen(e) => Some(e),
            AppError::Broadcaster(e) => Some(e),
            AppError::Finalize(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<SinkError> for AppError {
    fn from(e: SinkError) -> Self {
        AppError::SinkOpen(e)
    }
}

impl From<BroadcastError> for AppError {
    fn from(e: BroadcastError) -> Self {
        AppError::Broadcaster(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("bad port".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn test_app_error_from_sink_error() {
        let sink_err = SinkError::Io(std::io::Error::other("disk full"));
        let app_err: AppError = sink_err.into();
        assert!(matches!(app_err, AppError::SinkOpen(_)));
        assert!(std::error::Error::source(&app_err).is_some());
    }
}
