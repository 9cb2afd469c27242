//! # Connection Configuration
//!
//! Polling and retry settings for a PLC connection.
//!
//! - **Poll interval**: period of the polling engine's timer. Zero disables
//!   the timer; tags can still be read on demand.
//! - **Max attempts**: total tries per tag read or write, the first attempt
//!   included. Each retry reconnects first when the client reports it is
//!   disconnected.

use std::time::Duration;

/// Default poll interval in milliseconds (polling disabled).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 0;

/// Default attempts per read or write (one try plus three retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Per-connection polling and retry settings.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use voltage_s7::ConnectionConfig;
///
/// let config = ConnectionConfig::new()
///     .with_poll_interval_ms(250)
///     .with_max_attempts(2);
///
/// assert_eq!(config.poll_interval(), Some(Duration::from_millis(250)));
/// assert_eq!(config.max_attempts, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Polling period in milliseconds, 0 = no timer.
    pub poll_interval_ms: u64,
    /// Attempts per device operation, always at least 1.
    pub max_attempts: u32,
}

impl ConnectionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling period in milliseconds.
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set attempts per device operation. Clamped to at least 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Timer period, or `None` when polling is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}
