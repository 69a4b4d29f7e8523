//! Preview streaming from a real device.
//!
//! Demonstrates:
//! - Building a client for a device host
//! - Starting preview streaming
//! - Pulling distinct frames from the frame stream
//! - Reading the status snapshot
//!
//! Usage:
//!   cargo run --example 001_stream_frames -- --host 192.168.1.20
//!   cargo run --example 001_stream_frames -- --frames 10 --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use common::Args;
use futures_util::StreamExt;
use seestar_imaging::ImagingClient;

// ============================================================================
// Constants
// ============================================================================

const FRAME_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== 001: Stream Frames ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Connecting to {}...", args.host);
    let client = ImagingClient::builder().host(&args.host).build()?;
    client
        .connect()
        .await
        .with_context(|| format!("connecting to {}", args.host))?;
    println!("    ✓ Connected\n");

    // ========================================================================
    // Stream
    // ========================================================================

    println!("[2] Starting preview stream...");
    client.start_streaming().await?;
    println!("    ✓ Streaming\n");

    println!("[3] Receiving {} frames...", args.frames);
    let mut frames = Box::pin(client.frames());
    for n in 1..=args.frames {
        let frame = tokio::time::timeout(FRAME_TIMEOUT, frames.next())
            .await
            .context("no frame within 30s")?
            .context("connection closed")?;

        let peak = frame.samples().max().unwrap_or_default();
        println!(
            "    [{n}] id={} {}x{} peak={peak}",
            frame.id(),
            frame.width(),
            frame.height()
        );
    }
    drop(frames);
    println!();

    // ========================================================================
    // Status
    // ========================================================================

    println!("[4] Status:");
    println!("{}", serde_json::to_string_pretty(&client.status())?);

    client.disconnect().await;
    println!("\n    ✓ Disconnected");
    Ok(())
}
