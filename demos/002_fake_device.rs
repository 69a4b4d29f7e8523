//! Local fake device.
//!
//! Demonstrates:
//! - The wire format: 80-byte header + 16-bit little-endian samples
//! - Stacked-image capture driven by a `Stack` / `frame_complete` event
//! - Telemetry from `PiStatus` events
//!
//! Runs without hardware: a loopback listener plays the device.
//!
//! Usage:
//!   cargo run --example 002_fake_device
//!   cargo run --example 002_fake_device -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use futures_util::StreamExt;
use seestar_imaging::protocol::{FRAME_COMPLETE, PI_STATUS, STACK};
use seestar_imaging::{ClientOptions, Event, FrameHeader, ImagingClient, MessageId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Constants
// ============================================================================

const WIDTH: u16 = 4;
const HEIGHT: u16 = 2;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("=== 002: Fake Device ===\n");

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await
            && let Err(e) = serve(socket).await
        {
            eprintln!("[device] {e}");
        }
    });
    println!("[1] Fake device on 127.0.0.1:{port}\n");

    let client = ImagingClient::builder()
        .host("127.0.0.1")
        .port(port)
        .options(ClientOptions::new().with_heartbeat_delay(Duration::from_secs(60)))
        .build()?;
    client.connect().await?;

    let mut frames = Box::pin(client.frames());

    println!("[2] Preview frame");
    client.start_streaming().await?;
    if let Some(frame) = frames.next().await {
        println!("    {frame:?}");
    }

    println!("[3] frame_complete -> stacked image");
    client
        .event_bus()
        .emit(Event::new(STACK).with_state(FRAME_COMPLETE).with_param("stacked_frame", 1));
    if let Some(frame) = frames.next().await {
        println!("    {frame:?}");
    }

    client
        .event_bus()
        .emit(Event::new(PI_STATUS).with_param("temp", 35.2).with_param("battery_capacity", 90));
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("\n[4] Status: {:?}", client.status());

    drop(frames);
    client.disconnect().await;
    Ok(())
}

/// Answers `begin_streaming` and `get_stacked_img` with one frame each.
async fn serve(socket: TcpStream) -> anyhow::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let request: serde_json::Value = serde_json::from_str(&line)?;
        let (id, fill) = match request["method"].as_str() {
            Some("begin_streaming") => (MessageId::STREAMING, 100u16),
            Some("get_stacked_img") => (MessageId::STACKED_IMAGE, 200u16),
            _ => continue,
        };

        let payload: Vec<u8> = (0..WIDTH * HEIGHT)
            .flat_map(|i| (fill + i).to_le_bytes())
            .collect();
        let payload = if id == MessageId::STACKED_IMAGE {
            zipped(&payload)?
        } else {
            payload
        };

        let header = FrameHeader {
            size: Some(payload.len()),
            id,
            width: WIDTH,
            height: HEIGHT,
            code: 3,
        };
        write_half.write_all(&header.encode()).await?;
        write_half.write_all(&payload).await?;
    }
    Ok(())
}

fn zipped(raw: &[u8]) -> anyhow::Result<Vec<u8>> {
    use std::io::{Cursor, Write};

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("raw_data", zip::write::SimpleFileOptions::default())?;
    writer.write_all(raw)?;
    Ok(writer.finish()?.into_inner())
}
