//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`ImagingClient`] instances.
//!
//! # Example
//!
//! ```no_run
//! use seestar_imaging::{ClientOptions, ImagingClient};
//!
//! # fn example() -> seestar_imaging::Result<()> {
//! let client = ImagingClient::builder()
//!     .host("seestar.local")
//!     .options(ClientOptions::new().without_auto_reconnect())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::bus::EventBus;
use crate::codec::{BinaryProtocol, FrameCodec};
use crate::error::{Error, Result};
use crate::transport::{TcpTransport, Transport};

use super::core::ImagingClient;
use super::options::ClientOptions;

// ============================================================================
// Constants
// ============================================================================

/// Imaging port of the device.
pub const DEFAULT_PORT: u16 = 4800;

// ============================================================================
// ImagingClientBuilder
// ============================================================================

/// Builder for configuring an [`ImagingClient`] instance.
///
/// Use [`ImagingClient::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ImagingClientBuilder {
    /// Device host name or address.
    host: Option<String>,
    /// Device imaging port.
    port: u16,
    /// Timing and recovery options.
    options: ClientOptions,
    /// Shared event bus; a private one is created if unset.
    event_bus: Option<EventBus>,
    /// Transport override; TCP to `host:port` if unset.
    transport: Option<Arc<dyn Transport>>,
    /// Codec override; [`BinaryProtocol`] if unset.
    codec: Option<Arc<dyn FrameCodec>>,
}

impl Default for ImagingClientBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            options: ClientOptions::new(),
            event_bus: None,
            transport: None,
            codec: None,
        }
    }
}

impl fmt::Debug for ImagingClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagingClientBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("options", &self.options)
            .field("custom_transport", &self.transport.is_some())
            .field("custom_codec", &self.codec.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ImagingClientBuilder Implementation
// ============================================================================

impl ImagingClientBuilder {
    /// Creates a new builder with default settings and no host.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device host name or address.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the imaging port. Defaults to [`DEFAULT_PORT`].
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets timing and recovery options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares an existing event bus with the client.
    ///
    /// The client subscribes to `Stack`, `PiStatus` and `Annotate` on it.
    #[inline]
    #[must_use]
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Replaces the default TCP transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default [`BinaryProtocol`] codec.
    #[inline]
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn FrameCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Builds the client with validation.
    ///
    /// The client starts disconnected; call [`ImagingClient::connect`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if host is not set or empty
    /// - [`Error::Config`] if port is zero
    /// - [`Error::Config`] if an option interval is zero
    pub fn build(self) -> Result<ImagingClient> {
        let host = self.validate_host()?;
        self.validate_port()?;
        self.options.validate().map_err(Error::config)?;

        let transport = self.transport.unwrap_or_else(|| {
            Arc::new(
                TcpTransport::new(host.clone(), self.port)
                    .with_connect_timeout(self.options.connect_timeout),
            )
        });
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(BinaryProtocol::new()));
        let bus = self.event_bus.unwrap_or_default();

        Ok(ImagingClient::new(
            host,
            self.port,
            self.options,
            transport,
            codec,
            bus,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ImagingClientBuilder {
    /// Validates the host configuration.
    fn validate_host(&self) -> Result<String> {
        let host = self.host.clone().ok_or_else(|| {
            Error::config(
                "Device host is required. Use .host() to set it.\n\
                 Example: ImagingClient::builder().host(\"seestar.local\")",
            )
        })?;

        if host.trim().is_empty() {
            return Err(Error::config("Device host must not be empty"));
        }

        Ok(host)
    }

    /// Validates the port configuration.
    fn validate_port(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("Device port must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
