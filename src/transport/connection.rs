//! TCP transport for the imaging port.
//!
//! The stream is split into independently locked halves so the reader loop
//! can block on a frame while heartbeats and commands are written.
//!
//! # Framing
//!
//! - Outbound: one message per write, terminated with `\r\n`
//! - Inbound: raw bytes, framed by the caller via `read_exactly`

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for establishing the TCP connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Line terminator expected by the device.
const LINE_TERMINATOR: &str = "\r\n";

// ============================================================================
// TcpTransport
// ============================================================================

/// TCP connection to the device.
///
/// # Thread Safety
///
/// `TcpTransport` is `Send + Sync`; reads and writes may run concurrently
/// from different tasks.
pub struct TcpTransport {
    /// Device host name or address.
    host: String,
    /// Device port.
    port: u16,
    /// Timeout for `open()`.
    connect_timeout: Duration,
    /// Read half, `None` while closed.
    reader: Mutex<Option<BufReader<OwnedReadHalf>>>,
    /// Write half, `None` while closed.
    writer: Mutex<Option<OwnedWriteHalf>>,
    /// Open state; readers wait on it to abort blocked reads.
    open: watch::Sender<bool>,
    /// Successful `read_exactly` calls since `open()`.
    read_messages: AtomicU64,
    /// Successful writes since `open()`.
    written_messages: AtomicU64,
}

impl TcpTransport {
    /// Creates a closed transport for `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            open: watch::Sender::new(false),
            read_messages: AtomicU64::new(0),
            written_messages: AtomicU64::new(0),
        }
    }

    /// Sets the timeout for `open()`.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the number of reads completed since the last `open()`.
    #[inline]
    #[must_use]
    pub fn read_messages(&self) -> u64 {
        self.read_messages.load(Ordering::Relaxed)
    }

    /// Returns the number of messages written since the last `open()`.
    #[inline]
    #[must_use]
    pub fn written_messages(&self) -> u64 {
        self.written_messages.load(Ordering::Relaxed)
    }
}

impl fmt::Display for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("open", &*self.open.borrow())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&self) -> Result<()> {
        let address = (self.host.as_str(), self.port);
        let stream = timeout(self.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                Error::connection(format!(
                    "Timed out after {}ms connecting to {self}",
                    self.connect_timeout.as_millis()
                ))
            })?
            .map_err(|e| Error::connection(format!("Failed to connect to {self}: {e}")))?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "Failed to set TCP_NODELAY");
        }

        let (read_half, write_half) = stream.into_split();
        *self.reader.lock().await = Some(BufReader::new(read_half));
        *self.writer.lock().await = Some(write_half);

        self.read_messages.store(0, Ordering::Relaxed);
        self.written_messages.store(0, Ordering::Relaxed);
        self.open.send_replace(true);

        info!(peer = %self, "Transport opened");
        Ok(())
    }

    async fn close(&self) {
        // Flip the flag first so a blocked read releases the reader lock.
        let was_open = self.open.send_replace(false);

        if let Some(mut writer) = self.writer.lock().await.take()
            && let Err(e) = writer.shutdown().await
        {
            debug!(error = %e, "Failed to shut down write half");
        }
        self.reader.lock().await.take();

        if was_open {
            debug!(peer = %self, "Transport closed");
        }
    }

    fn is_connected(&self) -> bool {
        *self.open.borrow()
    }

    async fn read_exactly(&self, n: usize) -> Option<Vec<u8>> {
        let mut open = self.open.subscribe();
        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut()?;

        let mut buf = vec![0u8; n];
        let outcome = tokio::select! {
            result = reader.read_exact(&mut buf) => Some(result),
            () = wait_closed(&mut open) => None,
        };

        match outcome {
            Some(Ok(_)) => {
                self.read_messages.fetch_add(1, Ordering::Relaxed);
                Some(buf)
            }
            Some(Err(e)) => {
                error!(peer = %self, error = %e, wanted = n, "Error while reading");
                drop(guard);
                self.close().await;
                None
            }
            None => {
                debug!(peer = %self, "Read aborted by close");
                None
            }
        }
    }

    async fn write(&self, message: &str) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::NotConnected)?;

        trace!(peer = %self, message, "Writing");
        writer.write_all(message.as_bytes()).await?;
        writer.write_all(LINE_TERMINATOR.as_bytes()).await?;
        writer.flush().await?;

        self.written_messages.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Resolves once the open flag is cleared.
async fn wait_closed(open: &mut watch::Receiver<bool>) {
    let _ = open.wait_for(|open| !*open).await;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        (listener, port)
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_CONNECT_TIMEOUT.as_secs(), 10);
        assert_eq!(LINE_TERMINATOR, "\r\n");
    }

    #[tokio::test]
    async fn test_open_failure_is_connection_error() {
        let (listener, port) = listener().await;
        drop(listener);

        let transport = TcpTransport::new("127.0.0.1", port);
        let err = transport.open().await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_read_exactly_and_write() {
        let (listener, port) = listener().await;
        let device = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            socket.write_all(&[1, 2, 3, 4, 5]).await.expect("write");

            let mut lines = tokio::io::BufReader::new(socket);
            let mut line = String::new();
            lines.read_line(&mut line).await.expect("read line");
            line
        });

        let transport = TcpTransport::new("127.0.0.1", port);
        transport.open().await.expect("open");
        assert!(transport.is_connected());

        assert_eq!(transport.read_exactly(3).await, Some(vec![1, 2, 3]));
        assert_eq!(transport.read_exactly(2).await, Some(vec![4, 5]));
        assert_eq!(transport.read_messages(), 2);

        transport.write("{\"id\":100}").await.expect("write");
        assert_eq!(transport.written_messages(), 1);
        assert_eq!(device.await.expect("join"), "{\"id\":100}\r\n");

        transport.close().await;
    }

    #[tokio::test]
    async fn test_short_read_closes_transport() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            socket.write_all(&[1, 2]).await.expect("write");
        });

        let transport = TcpTransport::new("127.0.0.1", port);
        transport.open().await.expect("open");

        assert_eq!(transport.read_exactly(80).await, None);
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.write("ping").await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_close_aborts_blocked_read() {
        let (listener, port) = listener().await;
        let _device = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let transport = std::sync::Arc::new(TcpTransport::new("127.0.0.1", port));
        transport.open().await.expect("open");

        let reader = {
            let transport = std::sync::Arc::clone(&transport);
            tokio::spawn(async move { transport.read_exactly(80).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        transport.close().await;
        let result = timeout(Duration::from_secs(2), reader)
            .await
            .expect("read should abort")
            .expect("join");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_read_when_closed_returns_none() {
        let transport = TcpTransport::new("127.0.0.1", 4800);
        assert_eq!(transport.read_exactly(80).await, None);
        transport.close().await;
    }

    #[test]
    fn test_display() {
        let transport = TcpTransport::new("seestar.local", 4800);
        assert_eq!(transport.to_string(), "seestar.local:4800");
    }
}
