//! Type-safe identifiers.
//!
//! Newtype wrappers keep control-message ids and bus listener ids from being
//! mixed up with plain integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MessageId
// ============================================================================

/// Id carried by every control message sent to the device.
///
/// The device echoes the id of the request that produced a binary frame in
/// that frame's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u32);

impl MessageId {
    /// Reserved id for `begin_streaming`; preview frames arrive with it.
    pub const STREAMING: Self = Self(21);

    /// Reserved id for `get_stacked_img`; stacked images arrive with it.
    pub const STACKED_IMAGE: Self = Self(23);

    /// First id handed out by a fresh [`MessageIdCounter`].
    pub const FIRST: Self = Self(100);

    /// Creates a message id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u8> for MessageId {
    #[inline]
    fn from(value: u8) -> Self {
        Self(u32::from(value))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// MessageIdCounter
// ============================================================================

/// Monotonic message id source owned by one client.
#[derive(Debug)]
pub struct MessageIdCounter(AtomicU32);

impl MessageIdCounter {
    /// Creates a counter starting at [`MessageId::FIRST`].
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU32::new(MessageId::FIRST.0))
    }

    /// Returns the current value and advances the counter.
    #[inline]
    pub fn next(&self) -> MessageId {
        MessageId(self.0.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the value the next call to [`next`](Self::next) will hand out.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> MessageId {
        MessageId(self.0.load(Ordering::Relaxed))
    }
}

impl Default for MessageIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Handle returned by [`EventBus::add_listener`](crate::EventBus::add_listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Generates a fresh random listener id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_first() {
        let counter = MessageIdCounter::new();
        assert_eq!(counter.peek(), MessageId::FIRST);
        assert_eq!(counter.next(), MessageId::new(100));
        assert_eq!(counter.next(), MessageId::new(101));
        assert_eq!(counter.peek(), MessageId::new(102));
    }

    #[test]
    fn test_message_id_serializes_as_number() {
        let json = serde_json::to_string(&MessageId::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_message_id_from_header_byte() {
        assert_eq!(MessageId::from(23u8), MessageId::STACKED_IMAGE);
    }

    #[test]
    fn test_listener_ids_are_unique() {
        assert_ne!(ListenerId::generate(), ListenerId::generate());
    }
}
