//! In-memory doubles for client tests.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::client::{ClientOptions, ImagingClient};
use crate::codec::{BinaryProtocol, DecodedFrame, FrameCodec, FrameHeader};
use crate::error::{Error, Result};
use crate::transport::Transport;

// ============================================================================
// ScriptedTransport
// ============================================================================

/// Transport fed from a queue of reads.
///
/// Each queued chunk answers exactly one `read_exactly` call of the same
/// length. A `None` chunk, or a length mismatch, fails the read and drops
/// the connection like a real socket error would.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    reads: Mutex<VecDeque<Option<Vec<u8>>>>,
    wake: Notify,
    open: AtomicBool,
    fail_open: AtomicBool,
    opens: AtomicUsize,
    written: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn push_header(&self, header: &FrameHeader) {
        self.push(Some(header.encode().to_vec()));
    }

    pub fn push_frame(&self, header: &FrameHeader, payload: Vec<u8>) {
        let mut reads = self.reads.lock();
        reads.push_back(Some(header.encode().to_vec()));
        reads.push_back(Some(payload));
        drop(reads);
        self.wake.notify_one();
    }

    pub fn push_failure(&self) {
        self.push(None);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().clone()
    }

    /// Method names of the written JSON commands.
    pub fn methods(&self) -> Vec<String> {
        self.written()
            .iter()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|value| value["method"].as_str().map(str::to_string))
            .collect()
    }

    fn push(&self, chunk: Option<Vec<u8>>) {
        self.reads.lock().push_back(chunk);
        self.wake.notify_one();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self) -> Result<()> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::connection("scripted open failure"));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn read_exactly(&self, n: usize) -> Option<Vec<u8>> {
        loop {
            if !self.is_connected() {
                return None;
            }

            let woken = self.wake.notified();
            let chunk = self.reads.lock().pop_front();
            match chunk {
                Some(Some(bytes)) if bytes.len() == n => return Some(bytes),
                Some(_) => {
                    self.open.store(false, Ordering::SeqCst);
                    return None;
                }
                None => woken.await,
            }
        }
    }

    async fn write(&self, message: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.written.lock().push(message.to_string());
        Ok(())
    }
}

// ============================================================================
// CountingCodec
// ============================================================================

/// [`BinaryProtocol`] that counts its calls.
#[derive(Default)]
pub(crate) struct CountingCodec {
    headers: AtomicUsize,
    decodes: AtomicUsize,
}

impl CountingCodec {
    pub fn headers(&self) -> usize {
        self.headers.load(Ordering::SeqCst)
    }

    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl FrameCodec for CountingCodec {
    fn parse_header(&self, header: &[u8]) -> Result<FrameHeader> {
        self.headers.fetch_add(1, Ordering::SeqCst);
        BinaryProtocol.parse_header(header)
    }

    fn handle_incoming_message(
        &self,
        header: &FrameHeader,
        payload: Vec<u8>,
    ) -> Result<DecodedFrame> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        BinaryProtocol.handle_incoming_message(header, payload)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Options with short backoffs and a heartbeat that stays out of the way.
pub(crate) fn fast_options() -> ClientOptions {
    ClientOptions::new()
        .with_heartbeat_delay(Duration::from_secs(60))
        .with_not_ready_backoff(Duration::from_millis(20))
        .with_error_backoff(Duration::from_millis(20))
        .with_reconnect_interval(Duration::from_millis(20))
        .with_shutdown_grace(Duration::from_secs(1))
}

/// Builds a disconnected client over a scripted transport and counting codec.
pub(crate) fn scripted_client(
    options: ClientOptions,
) -> (ImagingClient, Arc<ScriptedTransport>, Arc<CountingCodec>) {
    let transport = Arc::new(ScriptedTransport::new());
    let codec = Arc::new(CountingCodec::default());
    let client = ImagingClient::builder()
        .host("127.0.0.1")
        .options(options)
        .transport(transport.clone())
        .codec(codec.clone())
        .build()
        .expect("valid test client");
    (client, transport, codec)
}

/// Polls `condition` until it holds, panicking after two seconds.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
