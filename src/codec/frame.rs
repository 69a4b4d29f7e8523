//! Decoded frame value.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::identifiers::MessageId;

// ============================================================================
// FrameKind
// ============================================================================

/// What produced a frame, derived from its message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Live preview frame pushed while streaming.
    Preview,
    /// Stacked image pushed in answer to `get_stacked_img`.
    Stacked,
    /// Any other binary message.
    Other,
}

impl From<MessageId> for FrameKind {
    fn from(id: MessageId) -> Self {
        match id {
            MessageId::STREAMING => Self::Preview,
            MessageId::STACKED_IMAGE => Self::Stacked,
            _ => Self::Other,
        }
    }
}

// ============================================================================
// DecodedFrame
// ============================================================================

/// A decoded image from the device.
///
/// Cloning is cheap: the pixel buffer is shared. Equality compares the
/// header fields and the pixel contents, so two decodes of the same bytes
/// are equal.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    id: MessageId,
    kind: FrameKind,
    width: u16,
    height: u16,
    data: Arc<[u8]>,
}

impl DecodedFrame {
    /// Creates a frame from raw 16-bit little-endian sample data.
    #[must_use]
    pub fn new(id: MessageId, width: u16, height: u16, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            kind: FrameKind::from(id),
            width,
            height,
            data: data.into(),
        }
    }

    /// Returns the message id the frame arrived with.
    #[inline]
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns what produced the frame.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Returns the width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns the raw sample bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterates the 16-bit samples in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = u16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Returns the sample at (`x`, `y`), if inside the frame.
    #[must_use]
    pub fn sample(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (usize::from(y) * usize::from(self.width) + usize::from(x)) * 2;
        self.data
            .get(offset..offset + 2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.data.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_id() {
        assert_eq!(FrameKind::from(MessageId::STREAMING), FrameKind::Preview);
        assert_eq!(FrameKind::from(MessageId::STACKED_IMAGE), FrameKind::Stacked);
        assert_eq!(FrameKind::from(MessageId::new(7)), FrameKind::Other);
    }

    #[test]
    fn test_equality_is_by_value() {
        let a = DecodedFrame::new(MessageId::STREAMING, 1, 1, vec![1u8, 0]);
        let b = DecodedFrame::new(MessageId::STREAMING, 1, 1, vec![1u8, 0]);
        let c = DecodedFrame::new(MessageId::STREAMING, 1, 1, vec![2u8, 0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_samples_are_little_endian() {
        let frame = DecodedFrame::new(MessageId::STREAMING, 2, 1, vec![0x34u8, 0x12, 0xff, 0x00]);
        let samples: Vec<u16> = frame.samples().collect();
        assert_eq!(samples, vec![0x1234, 0x00ff]);
        assert_eq!(frame.sample(1, 0), Some(0x00ff));
        assert_eq!(frame.sample(2, 0), None);
        assert_eq!(frame.sample(0, 1), None);
    }

    #[test]
    fn test_debug_omits_pixels() {
        let frame = DecodedFrame::new(MessageId::STACKED_IMAGE, 1, 1, vec![0u8; 2]);
        let debug = format!("{frame:?}");
        assert!(debug.contains("Stacked"));
        assert!(debug.contains("len: 2"));
    }
}
