//! Binary frame codec.
//!
//! Turns an 80-byte header plus payload into a [`DecodedFrame`]. The client
//! only talks to the [`FrameCodec`] trait; [`BinaryProtocol`] is the default
//! implementation for the Seestar imaging port.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `header` | Header layout and parsing |
//! | `frame` | Decoded frame value |
//! | `binary` | Default codec (raw and zipped frames) |

// ============================================================================
// Submodules
// ============================================================================

/// Default codec implementation.
pub mod binary;

/// Decoded frame value.
pub mod frame;

/// Binary frame header.
pub mod header;

// ============================================================================
// Re-exports
// ============================================================================

pub use binary::BinaryProtocol;
pub use frame::{DecodedFrame, FrameKind};
pub use header::{FrameHeader, HEADER_SIZE};

use crate::error::Result;

// ============================================================================
// FrameCodec
// ============================================================================

/// Header parser and payload decoder used by the reader loop.
pub trait FrameCodec: Send + Sync {
    /// Parses a [`HEADER_SIZE`]-byte header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`](crate::Error::InvalidHeader) for malformed headers.
    fn parse_header(&self, header: &[u8]) -> Result<FrameHeader>;

    /// Decodes the payload that followed `header`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if the payload does not match the header.
    fn handle_incoming_message(&self, header: &FrameHeader, payload: Vec<u8>)
    -> Result<DecodedFrame>;
}
