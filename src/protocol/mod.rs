//! Control protocol message types.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Device | JSON command line on the imaging port |
//! | binary frame | Device → Client | 80-byte header + payload (see [`crate::codec`]) |
//! | `Event` | Device → Bus | Telemetry and stacking notifications |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Imaging commands |
//! | `event` | Event types and typed payloads |
//! | `request` | Request envelope |

// ============================================================================
// Submodules
// ============================================================================

/// Imaging command definitions.
pub mod command;

/// Event message types.
pub mod event;

/// Request message type.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::Command;
pub use event::{
    ANNOTATE, AnnotateResult, Annotation, ChargerStatus, Event, FRAME_COMPLETE, PI_STATUS,
    ParsedEvent, PiStatusEvent, STACK, StackEvent,
};
pub use request::Request;
