//! Byte-stream transport layer.
//!
//! The client reads binary frames and writes JSON command lines through the
//! [`Transport`] trait. [`TcpTransport`] is the default implementation for
//! the device's imaging port.
//!
//! # Contract
//!
//! - `read_exactly(n)` yields exactly `n` bytes or `None`; never a short read.
//! - A failed read closes the transport, so `is_connected()` turns `false`.
//! - `close()` aborts a read that is blocked waiting for data.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | TCP transport |

// ============================================================================
// Submodules
// ============================================================================

/// TCP transport for the imaging port.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::TcpTransport;

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Transport
// ============================================================================

/// Byte-exact transport to the device.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) if the device is unreachable.
    async fn open(&self) -> Result<()>;

    /// Closes the connection. Idempotent.
    async fn close(&self);

    /// Returns `true` while the connection is usable.
    fn is_connected(&self) -> bool;

    /// Reads exactly `n` bytes, or `None` if the connection failed or closed.
    async fn read_exactly(&self, n: usize) -> Option<Vec<u8>>;

    /// Writes one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`](crate::Error::NotConnected) when closed,
    /// or [`Error::Io`](crate::Error::Io) if the write fails.
    async fn write(&self, message: &str) -> Result<()>;
}
