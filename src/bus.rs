//! Publish/subscribe event bus.
//!
//! Listeners subscribe to an event category and receive each matching
//! [`Event`] on their own tokio task, so a slow listener never delays the
//! publisher or other listeners.
//!
//! # Example
//!
//! ```no_run
//! use seestar_imaging::{Event, EventBus};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! bus.add_listener("Stack", |event: Event| async move {
//!     println!("stack state: {:?}", event.state);
//! });
//!
//! bus.emit(Event::new("Stack").with_state("frame_complete"));
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::ListenerId;
use crate::protocol::Event;

// ============================================================================
// Types
// ============================================================================

/// Boxed asynchronous listener.
pub type EventListener = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Map of categories to their listeners.
type ListenerMap = FxHashMap<String, Vec<(ListenerId, EventListener)>>;

// ============================================================================
// EventBus
// ============================================================================

/// Shared event bus. Clones refer to the same listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<ListenerMap>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_struct("EventBus")
            .field("categories", &listeners.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `listener` to events of `category`.
    ///
    /// Returns an id for [`remove_listener`](Self::remove_listener).
    pub fn add_listener<F, Fut>(&self, category: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = ListenerId::generate();
        let category = category.into();
        let listener: EventListener = Arc::new(move |event: Event| listener(event).boxed());

        debug!(%id, category = %category, "Listener added");
        self.listeners
            .lock()
            .entry(category)
            .or_default()
            .push((id, listener));
        id
    }

    /// Unsubscribes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, category: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(category) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            listeners.remove(category);
        }
        if removed {
            debug!(%id, category, "Listener removed");
        }
        removed
    }

    /// Returns the number of listeners subscribed to `category`.
    #[must_use]
    pub fn listener_count(&self, category: &str) -> usize {
        self.listeners.lock().get(category).map_or(0, Vec::len)
    }

    /// Delivers `event` to every listener of its category.
    ///
    /// Each listener runs on its own task; this returns immediately.
    /// Must be called from within a tokio runtime.
    pub fn emit(&self, event: Event) {
        let targets: Vec<EventListener> = self
            .listeners
            .lock()
            .get(&event.category)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        trace!(category = %event.category, listeners = targets.len(), "Emitting event");
        for listener in targets {
            tokio::spawn(listener(event.clone()));
        }
    }

    /// Parses a JSON event line and emits it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the line is not an event.
    pub fn emit_json(&self, line: &str) -> Result<()> {
        self.emit(Event::from_json(line)?);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
