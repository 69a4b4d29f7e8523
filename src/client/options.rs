//! Client timing and recovery options.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use seestar_imaging::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_heartbeat_interval(Duration::from_secs(10))
//!     .without_auto_reconnect();
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_HEARTBEAT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_NOT_READY_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// ============================================================================
// ClientOptions
// ============================================================================

/// Timing and recovery options for an [`ImagingClient`](crate::ImagingClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Wait before the first heartbeat after connecting.
    pub heartbeat_delay: Duration,

    /// Interval between heartbeats.
    pub heartbeat_interval: Duration,

    /// Reader sleep while the transport is down.
    pub not_ready_backoff: Duration,

    /// Reader sleep after an unexpected cycle failure.
    pub error_backoff: Duration,

    /// Re-open a dropped transport from the reader loop.
    pub auto_reconnect: bool,

    /// Minimum time between reconnect attempts.
    pub reconnect_interval: Duration,

    /// Timeout for opening the default TCP transport.
    pub connect_timeout: Duration,

    /// How long `disconnect()` waits for each background task before aborting it.
    pub shutdown_grace: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heartbeat_delay: DEFAULT_HEARTBEAT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            not_ready_backoff: DEFAULT_NOT_READY_BACKOFF,
            error_backoff: DEFAULT_ERROR_BACKOFF,
            auto_reconnect: true,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the delay before the first heartbeat.
    #[inline]
    #[must_use]
    pub const fn with_heartbeat_delay(mut self, delay: Duration) -> Self {
        self.heartbeat_delay = delay;
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the reader backoff while the transport is down.
    #[inline]
    #[must_use]
    pub const fn with_not_ready_backoff(mut self, backoff: Duration) -> Self {
        self.not_ready_backoff = backoff;
        self
    }

    /// Sets the reader backoff after an unexpected failure.
    #[inline]
    #[must_use]
    pub const fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Sets the minimum time between reconnect attempts.
    #[inline]
    #[must_use]
    pub const fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Disables reconnecting from the reader loop.
    #[inline]
    #[must_use]
    pub const fn without_auto_reconnect(mut self) -> Self {
        self.auto_reconnect = false;
        self
    }

    /// Sets the transport connect timeout.
    #[inline]
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-task shutdown grace period.
    #[inline]
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error message naming the first zero interval.
    pub fn validate(&self) -> Result<(), String> {
        let intervals = [
            ("heartbeat_interval", self.heartbeat_interval),
            ("not_ready_backoff", self.not_ready_backoff),
            ("error_backoff", self.error_backoff),
            ("reconnect_interval", self.reconnect_interval),
            ("connect_timeout", self.connect_timeout),
        ];

        for (name, value) in intervals {
            if value.is_zero() {
                return Err(format!("{name} must be greater than zero"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
