//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Maximum reconnection attempts before giving up (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Initial delay before the first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Ceiling on the backoff delay
    pub max_reconnect_delay: Duration,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ping_interval: Duration::from_secs(10),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }
}

/// Events surfaced to the consumer of a WebSocket connection
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// Connection established (or re-established)
    Connected,
    /// Text frame received
    Text(String),
    /// Reconnecting after a failure
    Reconnecting {
        /// 1-based attempt counter since the last successful connect
        attempt: u32,
    },
    /// Connection closed for good
    Disconnected,
}

/// WebSocket errors
#[derive(Debug, Error)]
pub enum WsError {
    /// Connection could not be established or dropped mid-stream
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Outbound send failed
    #[error("send failed: {0}")]
    SendFailed(String),
    /// Gave up after the configured number of reconnection attempts
    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectsExceeded,
}
