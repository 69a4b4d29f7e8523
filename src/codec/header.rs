//! Binary frame header.
//!
//! Every binary message on the imaging port starts with an 80-byte header.
//! Only the first 20 bytes carry fields; the rest is padding.
//!
//! # Layout (big-endian)
//!
//! | Offset | Type | Field |
//! |--------|------|-------|
//! | 0 | `u16` × 3 | reserved |
//! | 6 | `u32` | payload size |
//! | 10 | `u16` × 2 | reserved |
//! | 14 | `u8` | frame code |
//! | 15 | `u8` | message id |
//! | 16 | `u16` | width |
//! | 18 | `u16` | height |

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};
use crate::identifiers::MessageId;

// ============================================================================
// Constants
// ============================================================================

/// Size of every binary frame header in bytes.
pub const HEADER_SIZE: usize = 80;

const SIZE_OFFSET: usize = 6;
const CODE_OFFSET: usize = 14;
const ID_OFFSET: usize = 15;
const WIDTH_OFFSET: usize = 16;
const HEIGHT_OFFSET: usize = 18;

// ============================================================================
// FrameHeader
// ============================================================================

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload size in bytes; `None` when the message carries no payload.
    pub size: Option<usize>,
    /// Id of the request that produced this frame.
    pub id: MessageId,
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
    /// Device frame code.
    pub code: u8,
}

impl FrameHeader {
    /// Parses a header from exactly [`HEADER_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if `bytes` has the wrong length.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; HEADER_SIZE] = bytes.try_into().map_err(|_| {
            Error::invalid_header(format!(
                "expected {HEADER_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;

        let size = u32::from_be_bytes([
            bytes[SIZE_OFFSET],
            bytes[SIZE_OFFSET + 1],
            bytes[SIZE_OFFSET + 2],
            bytes[SIZE_OFFSET + 3],
        ]);

        Ok(Self {
            size: (size > 0).then_some(size as usize),
            id: MessageId::from(bytes[ID_OFFSET]),
            width: u16::from_be_bytes([bytes[WIDTH_OFFSET], bytes[WIDTH_OFFSET + 1]]),
            height: u16::from_be_bytes([bytes[HEIGHT_OFFSET], bytes[HEIGHT_OFFSET + 1]]),
            code: bytes[CODE_OFFSET],
        })
    }

    /// Encodes the header into its 80-byte wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let size = self.size.unwrap_or(0) as u32;
        bytes[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&size.to_be_bytes());
        bytes[CODE_OFFSET] = self.code;
        bytes[ID_OFFSET] = self.id.as_u32() as u8;
        bytes[WIDTH_OFFSET..WIDTH_OFFSET + 2].copy_from_slice(&self.width.to_be_bytes());
        bytes[HEIGHT_OFFSET..HEIGHT_OFFSET + 2].copy_from_slice(&self.height.to_be_bytes());
        bytes
    }
}

// ============================================================================
// Tests
// ============================================================================
