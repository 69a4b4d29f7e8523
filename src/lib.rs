//! Seestar imaging client - resilient frame streaming over the imaging port.
//!
//! This library keeps a streaming connection to a Seestar smart telescope's
//! imaging port (TCP 4800) and hands the latest decoded frame to local
//! consumers.
//!
//! # Architecture
//!
//! The client speaks two directions over one socket:
//!
//! - **Outbound**: JSON command lines (`begin_streaming`, `get_stacked_img`, ...)
//! - **Inbound**: binary messages, each an 80-byte header plus payload
//!
//! Key design principles:
//!
//! - One [`ImagingClient`] per device; `connect`/`disconnect` may repeat
//! - A self-healing reader loop overwrites a single latest-frame slot
//! - Consumers pull distinct frames from [`ImagingClient::frames`]
//! - Out-of-band [`Event`]s on an [`EventBus`] drive stacked-image capture
//!
//! # Quick Start
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use seestar_imaging::{ImagingClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ImagingClient::builder().host("seestar.local").build()?;
//!
//!     client.connect().await?;
//!     client.start_streaming().await?;
//!
//!     let mut frames = Box::pin(client.frames());
//!     while let Some(frame) = frames.next().await {
//!         println!("frame {} {}x{}", frame.id(), frame.width(), frame.height());
//!     }
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bus`] | Publish/subscribe [`EventBus`] |
//! | [`client`] | [`ImagingClient`], builder, options and status |
//! | [`codec`] | Frame header and payload decoding |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Message and listener ids |
//! | [`protocol`] | JSON commands and events |
//! | [`transport`] | Byte-stream transport |

// ============================================================================
// Modules
// ============================================================================

/// Publish/subscribe event bus.
pub mod bus;

/// Imaging client and configuration.
///
/// Use [`ImagingClient::builder()`] to create a configured client.
pub mod client;

/// Binary frame codec.
pub mod codec;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// JSON control messages and device events.
pub mod protocol;

/// Byte-stream transport layer.
pub mod transport;

#[cfg(test)]
mod test_utils;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientOptions, ImagingClient, ImagingClientBuilder, ImagingStatus};

// Bus types
pub use bus::EventBus;

// Codec types
pub use codec::{BinaryProtocol, DecodedFrame, FrameCodec, FrameHeader, FrameKind};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ListenerId, MessageId};

// Protocol types
pub use protocol::{Command, Event, ParsedEvent};

// Transport types
pub use transport::{TcpTransport, Transport};
