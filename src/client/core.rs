//! Imaging client handle and connection lifecycle.
//!
//! [`ImagingClient`] owns the transport, codec and status of one device and
//! drives two background tasks while connected: the reader loop, which frames
//! binary messages into the latest-frame slot, and the heartbeat.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use seestar_imaging::ImagingClient;
//!
//! # async fn example() -> seestar_imaging::Result<()> {
//! let client = ImagingClient::builder().host("seestar.local").build()?;
//! client.connect().await?;
//! client.start_streaming().await?;
//!
//! let mut frames = Box::pin(client.frames());
//! if let Some(frame) = frames.next().await {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::bus::EventBus;
use crate::codec::{DecodedFrame, FrameCodec};
use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, MessageId, MessageIdCounter};
use crate::protocol::{ANNOTATE, Command, Event, PI_STATUS, Request, STACK};
use crate::transport::Transport;

use super::builder::ImagingClientBuilder;
use super::options::ClientOptions;
use super::status::ImagingStatus;
use super::{heartbeat, reader};

// ============================================================================
// Constants
// ============================================================================

/// Number of recent events kept for inspection.
pub const RECENT_EVENTS_CAPACITY: usize = 5;

// ============================================================================
// Types
// ============================================================================

/// Handles of the per-connection background tasks.
pub(crate) struct BackgroundTasks {
    pub heartbeat: JoinHandle<()>,
    pub reader: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Waits for both tasks, aborting any that outlive `grace`.
    async fn shutdown(self, grace: Duration) {
        join_or_abort("heartbeat", self.heartbeat, grace).await;
        join_or_abort("reader", self.reader, grace).await;
    }
}

async fn join_or_abort(name: &'static str, mut handle: JoinHandle<()>, grace: Duration) {
    match timeout(grace, &mut handle).await {
        Ok(Ok(())) => debug!(task = name, "Background task stopped"),
        Ok(Err(e)) => warn!(task = name, error = %e, "Background task failed"),
        Err(_) => {
            warn!(
                task = name,
                grace_ms = grace.as_millis() as u64,
                "Background task did not stop in time, aborting"
            );
            handle.abort();
        }
    }
}

/// Internal shared state for the client.
pub(crate) struct ClientInner {
    /// Device host name or address.
    pub host: String,

    /// Device imaging port.
    pub port: u16,

    /// Timing and recovery options.
    pub options: ClientOptions,

    /// Byte stream to the device.
    pub transport: Arc<dyn Transport>,

    /// Header parser and payload decoder.
    pub codec: Arc<dyn FrameCodec>,

    /// Event bus the client listens on.
    pub bus: EventBus,

    /// Counter for command ids.
    pub ids: MessageIdCounter,

    /// Connection flag; loops watch it to stop promptly.
    pub connected: watch::Sender<bool>,

    /// Telemetry and streaming/fetching flags.
    pub status: RwLock<ImagingStatus>,

    /// Latest decoded frame. Written only by the reader loop.
    pub latest: watch::Sender<Option<DecodedFrame>>,

    /// Reader and heartbeat handles while connected.
    pub tasks: Mutex<Option<BackgroundTasks>>,

    /// Last few events seen by the client's listeners, oldest first.
    pub recent_events: Mutex<VecDeque<Event>>,

    /// Live frame streams.
    pub fetchers: AtomicUsize,

    /// Bus subscriptions, removed on drop.
    pub listeners: Vec<(&'static str, ListenerId)>,

    /// Serializes `connect` and `disconnect`.
    pub lifecycle: AsyncMutex<()>,

    /// Serializes streaming state transitions.
    pub control: AsyncMutex<()>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        for (category, id) in &self.listeners {
            self.bus.remove_listener(category, *id);
        }
    }
}

// ============================================================================
// ImagingClient
// ============================================================================

/// Streaming client for the device's imaging port.
///
/// Cheap to clone; clones share one connection.
///
/// Background tasks keep the client alive while connected, so call
/// [`disconnect`](Self::disconnect) before dropping the last handle.
#[derive(Clone)]
pub struct ImagingClient {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// ImagingClient - Display
// ============================================================================

impl fmt::Display for ImagingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.inner.host, self.inner.port)
    }
}

impl fmt::Debug for ImagingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagingClient")
            .field("host", &self.inner.host)
            .field("port", &self.inner.port)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ImagingClient - Public API
// ============================================================================

impl ImagingClient {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ImagingClientBuilder {
        ImagingClientBuilder::new()
    }

    /// Opens the transport and starts the reader and heartbeat loops.
    ///
    /// Status is reset to defaults. Connecting an already connected client
    /// only logs a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the transport cannot be opened; the
    /// client stays disconnected.
    pub async fn connect(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        if self.is_connected() {
            warn!(peer = %self, "Already connected");
            return Ok(());
        }

        self.inner.transport.open().await.map_err(|e| match e {
            Error::Connection { .. } => e,
            other => Error::connection(format!("Failed to open transport to {self}: {other}")),
        })?;

        self.inner.connected.send_replace(true);
        self.inner.status.write().reset();

        let heartbeat = tokio::spawn(heartbeat::run_heartbeat(self.clone()));
        let reader = tokio::spawn(reader::run_reader(self.clone()));
        *self.inner.tasks.lock() = Some(BackgroundTasks { heartbeat, reader });

        info!(peer = %self, "Connected");
        Ok(())
    }

    /// Stops streaming if active, closes the transport and stops both loops.
    ///
    /// A failed stop-streaming exchange is logged, not returned. Loops that do
    /// not finish within [`ClientOptions::shutdown_grace`] are aborted.
    pub async fn disconnect(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;

        if self.is_streaming()
            && let Err(e) = self.stop_streaming().await
        {
            warn!(peer = %self, error = %e, "Failed to stop streaming during disconnect");
            self.inner.status.write().is_streaming = false;
        }

        let was_connected = self.inner.connected.send_replace(false);
        self.inner.transport.close().await;

        let tasks = self.inner.tasks.lock().take();
        if let Some(tasks) = tasks {
            tasks.shutdown(self.inner.options.shutdown_grace).await;
        }

        if was_connected {
            info!(peer = %self, "Disconnected");
        }
    }

    /// Sends a structured command and returns the id it was sent with.
    ///
    /// Frame-producing commands carry their reserved id; all others take
    /// the next counter value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the transport is closed, or the
    /// transport's write error.
    pub async fn send(&self, command: Command) -> Result<MessageId> {
        let id = command.reserved_id().unwrap_or_else(|| self.inner.ids.next());
        let line = Request::with_id(id, command).to_json()?;

        self.inner.transport.write(&line).await?;
        trace!(%id, method = command.method(), "Command sent");
        Ok(id)
    }

    /// Sends an unstructured line as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the transport is closed, or the
    /// transport's write error.
    pub async fn send_raw(&self, message: &str) -> Result<()> {
        self.inner.transport.write(message).await?;
        trace!(message, "Raw message sent");
        Ok(())
    }

    /// Returns `true` between `connect()` and `disconnect()`.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    /// Returns a snapshot of the device status.
    #[must_use]
    pub fn status(&self) -> ImagingStatus {
        self.inner.status.read().clone()
    }

    /// Returns `true` if preview streaming was requested.
    #[inline]
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.inner.status.read().is_streaming
    }

    /// Returns `true` while at least one frame stream is live.
    #[inline]
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.inner.status.read().is_fetching_images
    }

    /// Returns the most recently decoded frame.
    #[must_use]
    pub fn latest_frame(&self) -> Option<DecodedFrame> {
        self.inner.latest.borrow().clone()
    }

    /// Returns the last few events seen by the client, oldest first.
    #[must_use]
    pub fn recent_events(&self) -> Vec<Event> {
        self.inner.recent_events.lock().iter().cloned().collect()
    }

    /// Returns the event bus the client listens on.
    #[inline]
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Returns the value the next counter-assigned command will use.
    #[inline]
    #[must_use]
    pub fn next_message_id(&self) -> MessageId {
        self.inner.ids.peek()
    }
}

// ============================================================================
// ImagingClient - Internal API
// ============================================================================

impl ImagingClient {
    /// Creates a disconnected client and subscribes it to the bus.
    pub(crate) fn new(
        host: String,
        port: u16,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
        codec: Arc<dyn FrameCodec>,
        bus: EventBus,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ClientInner>| {
            let listeners = vec![
                subscribe(&bus, STACK, weak.clone(), |client, event| async move {
                    client.handle_stack_event(event).await;
                }),
                subscribe(&bus, PI_STATUS, weak.clone(), |client, event| async move {
                    client.handle_telemetry_event(event);
                }),
                subscribe(&bus, ANNOTATE, weak.clone(), |client, event| async move {
                    client.handle_telemetry_event(event);
                }),
            ];

            ClientInner {
                host,
                port,
                options,
                transport,
                codec,
                bus,
                ids: MessageIdCounter::new(),
                connected: watch::Sender::new(false),
                status: RwLock::new(ImagingStatus::default()),
                latest: watch::Sender::new(None),
                tasks: Mutex::new(None),
                recent_events: Mutex::new(VecDeque::with_capacity(RECENT_EVENTS_CAPACITY)),
                fetchers: AtomicUsize::new(0),
                listeners,
                lifecycle: AsyncMutex::new(()),
                control: AsyncMutex::new(()),
            }
        });

        debug!(host = %inner.host, port = inner.port, "Imaging client created");
        Self { inner }
    }

    /// Replaces the latest frame. Newest wins.
    pub(crate) fn publish_frame(&self, frame: DecodedFrame) {
        trace!(id = %frame.id(), width = frame.width(), height = frame.height(), "Frame decoded");
        self.inner.latest.send_replace(Some(frame));
    }

    /// Appends to the recent-events history, evicting the oldest.
    pub(crate) fn record_event(&self, event: Event) {
        let mut events = self.inner.recent_events.lock();
        if events.len() == RECENT_EVENTS_CAPACITY {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Resolves once the connection flag is cleared.
    pub(crate) async fn wait_disconnected(&self) {
        let mut connected = self.inner.connected.subscribe();
        // Err only if the sender is gone, which `self` prevents.
        let _ = connected.wait_for(|connected| !*connected).await;
    }

    /// Sleeps for `duration` unless disconnected first.
    ///
    /// Returns `true` if still connected afterwards.
    pub(crate) async fn sleep_while_connected(&self, duration: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(duration) => self.is_connected(),
            () = self.wait_disconnected() => false,
        }
    }
}

/// Subscribes `handler` to `category` through a weak client reference.
fn subscribe<F, Fut>(
    bus: &EventBus,
    category: &'static str,
    weak: Weak<ClientInner>,
    handler: F,
) -> (&'static str, ListenerId)
where
    F: Fn(ImagingClient, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let id = bus.add_listener(category, move |event: Event| {
        let pending = weak
            .upgrade()
            .map(|inner| handler(ImagingClient { inner }, event));
        async move {
            if let Some(pending) = pending {
                pending.await;
            }
        }
    });
    (category, id)
}

// ============================================================================
// Tests
// ============================================================================
