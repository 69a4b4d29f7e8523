//! Error types for the Seestar imaging client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use seestar_imaging::{ImagingClient, Result};
//!
//! async fn example(client: &ImagingClient) -> Result<()> {
//!     client.connect().await?;
//!     client.start_streaming().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::NotConnected`] |
//! | Wire format | [`Error::InvalidHeader`], [`Error::Decode`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! Background loops never surface these to callers; they log and recover.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// TCP connection to the device failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Operation requires an open transport.
    #[error("Not connected")]
    NotConnected,

    // ========================================================================
    // Wire Format Errors
    // ========================================================================
    /// Binary frame header could not be parsed.
    #[error("Invalid frame header: {message}")]
    InvalidHeader {
        /// Description of the header problem.
        message: String,
    },

    /// Frame payload could not be decoded.
    #[error("Frame decode error (id {id}): {message}")]
    Decode {
        /// Message id from the frame header.
        id: u32,
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an invalid header error.
    #[inline]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Creates a decode error for the frame with the given id.
    #[inline]
    pub fn decode(id: u32, message: impl Into<String>) -> Self {
        Self::Decode {
            id,
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::NotConnected | Self::Io(_))
    }

    /// Returns `true` if this is a wire format error.
    ///
    /// The reader loop drops the offending message and keeps the
    /// connection; any other error is logged as a failed cycle.
    #[inline]
    #[must_use]
    pub fn is_wire_error(&self) -> bool {
        matches!(self, Self::InvalidHeader { .. } | Self::Decode { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_decode_error_display() {
        let err = Error::decode(23, "bad archive");
        assert_eq!(err.to_string(), "Frame decode error (id 23): bad archive");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("host is required");
        assert_eq!(err.to_string(), "Configuration error: host is required");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::invalid_header("short").is_connection_error());
    }

    #[test]
    fn test_is_wire_error() {
        assert!(Error::invalid_header("short").is_wire_error());
        assert!(Error::decode(21, "size").is_wire_error());
        assert!(!Error::NotConnected.is_wire_error());
        assert!(!Error::Io(IoError::other("reset")).is_wire_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::UnexpectedEof, "early eof");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
