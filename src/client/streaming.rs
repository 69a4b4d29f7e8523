//! Streaming control and event-driven capture.
//!
//! `start_streaming()` and `stop_streaming()` toggle the device's preview
//! stream. Independently, a `Stack` event with state `frame_complete`
//! requests the current stacked image, but only while a frame stream is live.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::{Command, Event};

use super::core::ImagingClient;

// ============================================================================
// ImagingClient - Streaming
// ============================================================================

impl ImagingClient {
    /// Asks the device to start streaming preview frames.
    ///
    /// Streaming is marked as soon as the request is written; the device
    /// does not acknowledge it. Already streaming is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns the send error; streaming stays off.
    pub async fn start_streaming(&self) -> Result<()> {
        let _control = self.inner.control.lock().await;

        if self.is_streaming() {
            warn!(peer = %self, "Already streaming");
            return Ok(());
        }

        self.send(Command::BeginStreaming).await?;
        self.inner.status.write().is_streaming = true;
        info!(peer = %self, "Streaming started");
        Ok(())
    }

    /// Asks the device to stop streaming.
    ///
    /// Not streaming is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns the send error; streaming stays on.
    pub async fn stop_streaming(&self) -> Result<()> {
        let _control = self.inner.control.lock().await;

        if !self.is_streaming() {
            warn!(peer = %self, "Not streaming");
            return Ok(());
        }

        self.send(Command::StopStreaming).await?;
        self.inner.status.write().is_streaming = false;
        info!(peer = %self, "Streaming stopped");
        Ok(())
    }

    /// Re-sends `begin_streaming` after the reader re-opened the transport.
    pub(crate) async fn resume_streaming(&self) {
        let _control = self.inner.control.lock().await;

        if self.is_streaming() {
            return;
        }

        match self.send(Command::BeginStreaming).await {
            Ok(_) => {
                self.inner.status.write().is_streaming = true;
                info!(peer = %self, "Streaming resumed");
            }
            Err(e) => warn!(peer = %self, error = %e, "Failed to resume streaming"),
        }
    }

    /// Handles a `Stack` event from the bus.
    pub(crate) async fn handle_stack_event(&self, event: Event) {
        let trigger = event.is_frame_complete();
        self.handle_telemetry_event(event);

        if !trigger {
            return;
        }
        if !self.is_fetching() {
            debug!(peer = %self, "Frame complete with no consumers, not fetching");
            return;
        }

        if let Err(e) = self.send(Command::GetStackedImage).await {
            warn!(peer = %self, error = %e, "Failed to request stacked image");
        }
    }

    /// Records the event and applies its telemetry to status.
    pub(crate) fn handle_telemetry_event(&self, event: Event) {
        let parsed = event.parse();
        self.inner.status.write().apply(&parsed);
        self.record_event(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
