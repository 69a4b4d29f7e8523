//! Deduplicating frame stream.
//!
//! Each call to [`ImagingClient::frames`] returns an independent stream over
//! the latest-frame slot. A stream yields the slot's frame whenever it
//! differs from the last frame that stream yielded, and ends when the client
//! disconnects. Frames published between two polls are skipped; only the
//! newest is seen.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures_util::Stream;
use futures_util::stream;
use tokio::sync::watch;
use tracing::debug;

use crate::codec::DecodedFrame;

use super::core::{ClientInner, ImagingClient};

// ============================================================================
// ImagingClient - Frames
// ============================================================================

impl ImagingClient {
    /// Returns a stream of distinct frames.
    ///
    /// The client counts as fetching from this call until the stream ends or
    /// is dropped, which enables stacked-image capture on `frame_complete`.
    /// The stream ends when the client disconnects; a stream created while
    /// disconnected ends immediately.
    pub fn frames(&self) -> impl Stream<Item = DecodedFrame> + Send + 'static {
        let cursor = FrameCursor {
            latest: self.inner.latest.subscribe(),
            connected: self.inner.connected.subscribe(),
            last: None,
            _fetch: FetchGuard::acquire(Arc::clone(&self.inner)),
        };

        stream::unfold(cursor, |mut cursor| async move {
            let frame = cursor.next_distinct().await?;
            Some((frame, cursor))
        })
    }
}

// ============================================================================
// FrameCursor
// ============================================================================

/// Per-stream view of the latest-frame slot.
struct FrameCursor {
    latest: watch::Receiver<Option<DecodedFrame>>,
    connected: watch::Receiver<bool>,
    last: Option<DecodedFrame>,
    _fetch: FetchGuard,
}

impl FrameCursor {
    /// Waits for a frame different from the last one yielded.
    ///
    /// Returns `None` once the client is disconnected.
    async fn next_distinct(&mut self) -> Option<DecodedFrame> {
        loop {
            if !*self.connected.borrow_and_update() {
                return None;
            }

            let candidate = self.latest.borrow_and_update().clone();
            if let Some(frame) = candidate
                && self.last.as_ref() != Some(&frame)
            {
                self.last = Some(frame.clone());
                return Some(frame);
            }

            tokio::select! {
                changed = self.latest.changed() => changed.ok()?,
                changed = self.connected.changed() => changed.ok()?,
            }
        }
    }
}

// ============================================================================
// FetchGuard
// ============================================================================

/// Holds one claim on the fetching flag.
struct FetchGuard {
    inner: Arc<ClientInner>,
}

impl FetchGuard {
    fn acquire(inner: Arc<ClientInner>) -> Self {
        {
            let mut status = inner.status.write();
            let fetchers = inner.fetchers.fetch_add(1, Ordering::AcqRel) + 1;
            status.is_fetching_images = true;
            debug!(fetchers, "Frame stream opened");
        }
        Self { inner }
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        let mut status = self.inner.status.write();
        let fetchers = self.inner.fetchers.fetch_sub(1, Ordering::AcqRel) - 1;
        status.is_fetching_images = fetchers > 0;
        debug!(fetchers, "Frame stream closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;
    use tokio::time::timeout;

    use crate::codec::DecodedFrame;
    use crate::identifiers::MessageId;
    use crate::test_utils::{fast_options, scripted_client, wait_until};

    fn frame(value: u8) -> DecodedFrame {
        DecodedFrame::new(MessageId::STREAMING, 1, 1, vec![value, 0])
    }

    #[tokio::test]
    async fn test_frames_sets_fetching_eagerly() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");
        assert!(!client.is_fetching());

        let frames = client.frames();
        assert!(client.is_fetching());

        drop(frames);
        assert!(!client.is_fetching());
        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_duplicates_are_not_yielded() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");

        let consumer = {
            let stream = client.frames();
            tokio::spawn(async move {
                stream
                    .map(|frame| frame.sample(0, 0).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .await
            })
        };

        for value in [1, 1, 2, 2, 2, 3] {
            client.publish_frame(frame(value));
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        client.disconnect().await;

        let seen = timeout(Duration::from_secs(1), consumer)
            .await
            .expect("stream should end")
            .expect("join");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_burst_yields_in_order_without_repeats() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");

        let consumer = {
            let stream = client.frames();
            tokio::spawn(async move {
                stream
                    .map(|frame| frame.sample(0, 0).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .await
            })
        };

        for value in 1..=50 {
            client.publish_frame(frame(value));
            if value % 10 == 0 {
                tokio::task::yield_now().await;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.disconnect().await;

        let seen = timeout(Duration::from_secs(1), consumer)
            .await
            .expect("stream should end")
            .expect("join");
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(seen.last(), Some(&50));
    }

    #[tokio::test]
    async fn test_existing_frame_is_yielded_first() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");
        client.publish_frame(frame(9));

        let mut frames = Box::pin(client.frames());
        let first = timeout(Duration::from_millis(200), frames.next())
            .await
            .expect("frame ready")
            .expect("stream open");
        assert_eq!(first.sample(0, 0), Some(9));

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnect_ends_stream_and_clears_fetching() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");

        let mut frames = Box::pin(client.frames());
        let waiter = tokio::spawn(async move { frames.next().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(client.is_fetching());

        client.inner.connected.send_replace(false);
        let next = timeout(Duration::from_millis(100), waiter)
            .await
            .expect("stream should end promptly")
            .expect("join");
        assert!(next.is_none());
        wait_until(|| !client.is_fetching()).await;

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_fetching_tracks_all_streams() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");

        let first = client.frames();
        let second = client.frames();
        drop(first);
        assert!(client.is_fetching());
        drop(second);
        assert!(!client.is_fetching());

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_each_stream_sees_every_distinct_frame() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        client.connect().await.expect("connect");

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let stream = client.frames();
                tokio::spawn(async move {
                    stream
                        .map(|frame| frame.sample(0, 0).unwrap_or_default())
                        .collect::<Vec<_>>()
                        .await
                })
            })
            .collect();

        client.publish_frame(frame(1));
        tokio::time::sleep(Duration::from_millis(15)).await;
        client.publish_frame(frame(2));
        tokio::time::sleep(Duration::from_millis(15)).await;
        client.disconnect().await;

        for consumer in consumers {
            let seen = timeout(Duration::from_secs(1), consumer)
                .await
                .expect("stream should end")
                .expect("join");
            assert_eq!(seen, vec![1, 2]);
        }
    }

    #[tokio::test]
    async fn test_stream_while_disconnected_ends_immediately() {
        let (client, _transport, _codec) = scripted_client(fast_options());
        let mut frames = Box::pin(client.frames());
        assert!(frames.next().await.is_none());
        drop(frames);
        assert!(!client.is_fetching());
    }
}
