//! Reader loop.
//!
//! Frames binary messages off the transport: an 80-byte header, then
//! `size` payload bytes when the header declares any. Decoded frames
//! overwrite the latest-frame slot.
//!
//! The loop never returns an error. Transport trouble is retried after
//! `not_ready_backoff`, decode trouble after `error_backoff`, and the loop
//! ends only when the connection flag is cleared.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use crate::codec::HEADER_SIZE;
use crate::error::Result;

use super::core::ImagingClient;

// ============================================================================
// Reader Loop
// ============================================================================

/// Runs until the client is disconnected.
pub(crate) async fn run_reader(client: ImagingClient) {
    info!(peer = %client, "Reader loop started");
    let mut last_reconnect: Option<Instant> = None;

    while client.is_connected() {
        if let Err(e) = read_cycle(&client, &mut last_reconnect).await {
            if e.is_wire_error() {
                warn!(peer = %client, error = %e, "Dropping malformed message");
            } else {
                error!(peer = %client, error = %e, "Reader cycle failed");
            }
            if !client
                .sleep_while_connected(client.inner.options.error_backoff)
                .await
            {
                break;
            }
        }
    }

    info!(peer = %client, "Reader loop stopped");
}

/// Reads and publishes at most one message.
async fn read_cycle(client: &ImagingClient, last_reconnect: &mut Option<Instant>) -> Result<()> {
    let inner = &client.inner;

    if !inner.transport.is_connected() {
        maybe_reconnect(client, last_reconnect).await;
        if !inner.transport.is_connected() {
            client
                .sleep_while_connected(inner.options.not_ready_backoff)
                .await;
        }
        return Ok(());
    }

    let Some(header_bytes) = inner.transport.read_exactly(HEADER_SIZE).await else {
        back_off_if_dropped(client).await;
        return Ok(());
    };

    let header = inner.codec.parse_header(&header_bytes)?;
    trace!(
        id = %header.id,
        code = header.code,
        size = header.size.unwrap_or(0),
        width = header.width,
        height = header.height,
        "Header received"
    );

    let Some(size) = header.size else {
        return Ok(());
    };

    let Some(payload) = inner.transport.read_exactly(size).await else {
        back_off_if_dropped(client).await;
        return Ok(());
    };

    let frame = inner.codec.handle_incoming_message(&header, payload)?;
    client.publish_frame(frame);
    Ok(())
}

/// Sleeps after a failed read if the transport went down with it.
async fn back_off_if_dropped(client: &ImagingClient) {
    if !client.inner.transport.is_connected() {
        debug!(peer = %client, "Read failed, transport down");
        client
            .sleep_while_connected(client.inner.options.not_ready_backoff)
            .await;
    }
}

/// Re-opens the transport when enabled and the last attempt is old enough.
///
/// A successful re-open resets status like `connect()` does, then restarts
/// streaming if it was on before the drop.
async fn maybe_reconnect(client: &ImagingClient, last_reconnect: &mut Option<Instant>) {
    let inner = &client.inner;
    let options = &inner.options;

    if !options.auto_reconnect {
        return;
    }
    if last_reconnect.is_some_and(|at| at.elapsed() < options.reconnect_interval) {
        return;
    }
    *last_reconnect = Some(Instant::now());

    debug!(peer = %client, "Reconnecting");
    let opened = tokio::select! {
        result = inner.transport.open() => Some(result),
        () = client.wait_disconnected() => None,
    };

    match opened {
        Some(Ok(())) if client.is_connected() => {
            let was_streaming = {
                let mut status = inner.status.write();
                let was_streaming = status.is_streaming;
                status.reset();
                was_streaming
            };
            info!(peer = %client, was_streaming, "Reconnected");

            if was_streaming {
                client.resume_streaming().await;
            }
        }
        Some(Ok(())) | None => {
            // Disconnected while opening.
            inner.transport.close().await;
        }
        Some(Err(e)) => {
            warn!(peer = %client, error = %e, "Reconnect failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
