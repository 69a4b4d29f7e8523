//! Heartbeat loop.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace, warn};

use crate::protocol::Command;

use super::core::ImagingClient;

// ============================================================================
// Heartbeat Loop
// ============================================================================

/// Sends `test_connection` every `heartbeat_interval` after an initial
/// `heartbeat_delay`, until the client is disconnected.
pub(crate) async fn run_heartbeat(client: ImagingClient) {
    let options = client.inner.options;
    debug!(
        peer = %client,
        interval_ms = options.heartbeat_interval.as_millis() as u64,
        "Heartbeat loop started"
    );

    let mut connected = client
        .sleep_while_connected(options.heartbeat_delay)
        .await;

    while connected {
        if client.inner.transport.is_connected() {
            match client.send(Command::TestConnection).await {
                Ok(id) => trace!(%id, "Heartbeat sent"),
                Err(e) => warn!(peer = %client, error = %e, "Heartbeat failed"),
            }
        }

        connected = client
            .sleep_while_connected(options.heartbeat_interval)
            .await;
    }

    debug!(peer = %client, "Heartbeat loop stopped");
}

// ============================================================================
// Tests
// ============================================================================
