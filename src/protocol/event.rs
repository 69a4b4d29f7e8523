//! Device event types.
//!
//! Events are unsolicited JSON notifications the device publishes on its
//! control port. Whatever reads that port forwards them onto the
//! [`EventBus`](crate::EventBus), keyed by [`Event::category`].
//!
//! # Event Categories
//!
//! | Category | Payload |
//! |----------|---------|
//! | `Stack` | `state`, `stacked_frame`, `dropped_frame` |
//! | `PiStatus` | `temp`, `charger_status`, `charge_online`, `battery_capacity` |
//! | `Annotate` | `result` (plate-solve annotations) |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Category of live-stacking progress events.
pub const STACK: &str = "Stack";

/// Category of device telemetry events.
pub const PI_STATUS: &str = "PiStatus";

/// Category of plate-solve annotation events.
pub const ANNOTATE: &str = "Annotate";

/// `Stack` state announcing that a new frame was folded into the stack.
pub const FRAME_COMPLETE: &str = "frame_complete";

// ============================================================================
// Event
// ============================================================================

/// An event notification from the device.
///
/// # Format
///
/// ```json
/// {
///   "Event": "Stack",
///   "Timestamp": "9507.244805160",
///   "state": "frame_complete",
///   "stacked_frame": 12,
///   "dropped_frame": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event category, used as the bus routing key.
    #[serde(rename = "Event")]
    pub category: String,

    /// Device-side timestamp.
    #[serde(rename = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Event state, when the category has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Remaining category-specific fields.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Event {
    /// Creates an event with no payload beyond its category.
    #[inline]
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            timestamp: None,
            state: None,
            params: Map::new(),
        }
    }

    /// Sets the event state.
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Adds a payload field.
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parses an event from a JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not an event object.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text.trim())?)
    }

    /// Returns `true` if this is a `Stack` event announcing a completed frame.
    #[inline]
    #[must_use]
    pub fn is_frame_complete(&self) -> bool {
        self.category == STACK && self.state.as_deref() == Some(FRAME_COMPLETE)
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.category.as_str() {
            STACK => ParsedEvent::Stack(StackEvent {
                state: self.state.clone().unwrap_or_default(),
                stacked_frame: self.get_u32("stacked_frame"),
                dropped_frame: self.get_u32("dropped_frame"),
            }),

            PI_STATUS => ParsedEvent::PiStatus(PiStatusEvent {
                temp: self.params.get("temp").and_then(Value::as_f64),
                charger_status: self
                    .params
                    .get("charger_status")
                    .and_then(|v| ChargerStatus::deserialize(v).ok()),
                charge_online: self.params.get("charge_online").and_then(Value::as_bool),
                battery_capacity: self
                    .params
                    .get("battery_capacity")
                    .and_then(Value::as_u64)
                    .map(|v| v.min(100) as u8),
            }),

            ANNOTATE => match self.params.get("result").map(AnnotateResult::deserialize) {
                Some(Ok(result)) => ParsedEvent::Annotate(result),
                _ => self.unknown(),
            },

            _ => self.unknown(),
        }
    }

    fn unknown(&self) -> ParsedEvent {
        ParsedEvent::Unknown {
            category: self.category.clone(),
            params: Value::Object(self.params.clone()),
        }
    }

    /// Gets a u32 from params, `None` if absent or out of range.
    #[inline]
    fn get_u32(&self, key: &str) -> Option<u32> {
        self.params
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// Live-stacking progress.
    Stack(StackEvent),

    /// Device telemetry. Absent fields were not reported.
    PiStatus(PiStatusEvent),

    /// Plate-solve result.
    Annotate(AnnotateResult),

    /// Category this crate does not interpret.
    Unknown {
        /// Event category.
        category: String,
        /// Event payload.
        params: Value,
    },
}

/// Payload of a `Stack` event. Absent counters were not reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEvent {
    /// Stacking state (`frame_complete`, `start`, ...).
    pub state: String,
    /// Frames accepted into the stack so far.
    pub stacked_frame: Option<u32>,
    /// Frames rejected so far.
    pub dropped_frame: Option<u32>,
}

/// Payload of a `PiStatus` event.
#[derive(Debug, Clone, PartialEq)]
pub struct PiStatusEvent {
    /// Board temperature in °C.
    pub temp: Option<f64>,
    /// Charger state.
    pub charger_status: Option<ChargerStatus>,
    /// Whether external power is connected.
    pub charge_online: Option<bool>,
    /// Battery level in percent.
    pub battery_capacity: Option<u8>,
}

// ============================================================================
// ChargerStatus
// ============================================================================

/// Battery charger state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargerStatus {
    /// Running on battery.
    Discharging,
    /// Battery charging.
    Charging,
    /// Battery full.
    Full,
}

// ============================================================================
// AnnotateResult
// ============================================================================

/// Plate-solve annotations for the current image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotateResult {
    /// Annotated image size in pixels (width, height).
    #[serde(default)]
    pub image_size: Option<(u32, u32)>,

    /// Objects identified in the field.
    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Device-side image id.
    #[serde(default)]
    pub image_id: Option<u64>,
}

/// A single identified object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Object class (`ngc`, `star`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Catalogue names.
    #[serde(default)]
    pub names: Vec<String>,
    /// Center x in image pixels.
    #[serde(default)]
    pub pixelx: f64,
    /// Center y in image pixels.
    #[serde(default)]
    pub pixely: f64,
    /// Radius in image pixels.
    #[serde(default)]
    pub radius: f64,
}

// ============================================================================
// Tests
// ============================================================================
