//! Default codec for the Seestar imaging port.

// ============================================================================
// Imports
// ============================================================================

use std::io::{Cursor, Read};

use tracing::trace;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::identifiers::MessageId;

use super::{DecodedFrame, FrameCodec, FrameHeader};

// ============================================================================
// Constants
// ============================================================================

/// Unpack limit for archives whose header carries no dimensions.
const MAX_UNSIZED_ENTRY: usize = 64 * 1024 * 1024;

// ============================================================================
// BinaryProtocol
// ============================================================================

/// Decodes preview and stacked frames.
///
/// Stacked images (id 23) arrive as a zip archive whose first entry is the
/// raw frame; everything else is the raw frame itself. Raw frames hold
/// `width * height` 16-bit samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryProtocol;

impl BinaryProtocol {
    /// Creates the codec.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extracts the first entry of a stacked-image archive.
    ///
    /// Reads at most `limit` bytes; a larger entry is a decode error, whatever
    /// size the archive declares.
    fn unzip(id: MessageId, payload: &[u8], limit: usize) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(payload))
            .map_err(|e| Error::decode(id.as_u32(), format!("Invalid stacked image archive: {e}")))?;

        let mut entry = archive
            .by_index(0)
            .map_err(|e| Error::decode(id.as_u32(), format!("Empty stacked image archive: {e}")))?;

        let declared = usize::try_from(entry.size()).unwrap_or(usize::MAX);
        let mut raw = Vec::with_capacity(declared.min(limit));
        (&mut entry)
            .take(limit as u64 + 1)
            .read_to_end(&mut raw)
            .map_err(|e| Error::decode(id.as_u32(), format!("Unreadable stacked image: {e}")))?;

        if raw.len() > limit {
            return Err(Error::decode(
                id.as_u32(),
                format!("Stacked image exceeds {limit} bytes"),
            ));
        }

        trace!(%id, name = %entry.name(), len = raw.len(), "Unpacked stacked image");
        Ok(raw)
    }
}

impl FrameCodec for BinaryProtocol {
    fn parse_header(&self, header: &[u8]) -> Result<FrameHeader> {
        FrameHeader::parse(header)
    }

    fn handle_incoming_message(
        &self,
        header: &FrameHeader,
        payload: Vec<u8>,
    ) -> Result<DecodedFrame> {
        let expected = usize::from(header.width) * usize::from(header.height) * 2;

        let data = if header.id == MessageId::STACKED_IMAGE {
            let limit = if expected > 0 { expected } else { MAX_UNSIZED_ENTRY };
            Self::unzip(header.id, &payload, limit)?
        } else {
            payload
        };

        if expected > 0 && data.len() != expected {
            return Err(Error::decode(
                header.id.as_u32(),
                format!(
                    "{}x{} frame needs {expected} bytes, got {}",
                    header.width,
                    header.height,
                    data.len()
                ),
            ));
        }

        Ok(DecodedFrame::new(header.id, header.width, header.height, data))
    }
}

// ============================================================================
// Tests
// ============================================================================
