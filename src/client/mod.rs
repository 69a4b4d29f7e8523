//! Imaging client module.
//!
//! This module provides the main entry point for talking to the device.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ImagingClient`] | Connection lifecycle, streaming control, frame stream |
//! | [`ImagingClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timing and recovery options |
//! | [`ImagingStatus`] | Telemetry and streaming/fetching flags |
//!
//! # Background Tasks
//!
//! While connected the client runs two tokio tasks:
//!
//! - **reader**: frames binary messages into the latest-frame slot
//! - **heartbeat**: sends `test_connection` periodically
//!
//! Both watch the connection flag and stop when `disconnect()` clears it.

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Client timing and recovery options.
pub mod options;

/// Device status snapshot.
pub mod status;

mod distributor;
mod heartbeat;
mod reader;
mod streaming;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{DEFAULT_PORT, ImagingClientBuilder};
pub use core::{ImagingClient, RECENT_EVENTS_CAPACITY};
pub use options::ClientOptions;
pub use status::ImagingStatus;
