//! Request message type.
//!
//! The imaging port takes one JSON object per line. Responses are not
//! correlated on this port; the id only tags the binary frames a request
//! produces.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Result;
use crate::identifiers::MessageId;

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from the client to the device.
///
/// # Format
///
/// ```json
/// { "id": 100, "method": "test_connection" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Message id.
    pub id: MessageId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request with a specific id.
    #[inline]
    #[must_use]
    pub fn with_id(id: MessageId, command: Command) -> Self {
        Self { id, command }
    }

    /// Serializes the request as a single JSON line (without terminator).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
