//! Control commands sent to the imaging port.
//!
//! | Command | Method | Id |
//! |---------|--------|----|
//! | [`Command::BeginStreaming`] | `begin_streaming` | reserved 21 |
//! | [`Command::StopStreaming`] | `stop_streaming` | counter |
//! | [`Command::GetStackedImage`] | `get_stacked_img` | reserved 23 |
//! | [`Command::TestConnection`] | `test_connection` | counter |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::MessageId;

// ============================================================================
// Command
// ============================================================================

/// Imaging port commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Command {
    /// Start pushing preview frames.
    #[serde(rename = "begin_streaming")]
    BeginStreaming,

    /// Stop pushing preview frames.
    #[serde(rename = "stop_streaming")]
    StopStreaming,

    /// Push the current stacked image once.
    #[serde(rename = "get_stacked_img")]
    GetStackedImage,

    /// Liveness probe.
    #[serde(rename = "test_connection")]
    TestConnection,
}

impl Command {
    /// Returns the wire method name.
    #[inline]
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::BeginStreaming => "begin_streaming",
            Self::StopStreaming => "stop_streaming",
            Self::GetStackedImage => "get_stacked_img",
            Self::TestConnection => "test_connection",
        }
    }

    /// Returns the id the device expects for this command, if it is fixed.
    ///
    /// The device tags the binary frames a command produces with the
    /// command's id, so frame-producing commands use reserved ids.
    #[inline]
    #[must_use]
    pub const fn reserved_id(&self) -> Option<MessageId> {
        match self {
            Self::BeginStreaming => Some(MessageId::STREAMING),
            Self::GetStackedImage => Some(MessageId::STACKED_IMAGE),
            Self::StopStreaming | Self::TestConnection => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_command_serialization() {
        let value = serde_json::to_value(Command::TestConnection).expect("serialize");
        assert_eq!(value, json!({ "method": "test_connection" }));
    }

    #[test]
    fn test_method_matches_serde_name() {
        for command in [
            Command::BeginStreaming,
            Command::StopStreaming,
            Command::GetStackedImage,
            Command::TestConnection,
        ] {
            let value = serde_json::to_value(command).expect("serialize");
            assert_eq!(value["method"], command.method());
        }
    }

    #[test]
    fn test_reserved_ids() {
        assert_eq!(
            Command::BeginStreaming.reserved_id(),
            Some(MessageId::new(21))
        );
        assert_eq!(
            Command::GetStackedImage.reserved_id(),
            Some(MessageId::new(23))
        );
        assert_eq!(Command::StopStreaming.reserved_id(), None);
        assert_eq!(Command::TestConnection.reserved_id(), None);
    }
}
