//! Device status snapshot.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::protocol::{AnnotateResult, ChargerStatus, ParsedEvent};

// ============================================================================
// ImagingStatus
// ============================================================================

/// Volatile telemetry plus the client's streaming and fetching flags.
///
/// Telemetry fields stay `None` until the device reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImagingStatus {
    /// Board temperature in °C.
    pub temp: Option<f64>,
    /// Charger state.
    pub charger_status: Option<ChargerStatus>,
    /// Whether external power is connected.
    pub charge_online: Option<bool>,
    /// Battery level in percent.
    pub battery_capacity: Option<u8>,
    /// Frames accepted into the live stack.
    pub stacked_frame: u32,
    /// Frames rejected from the live stack.
    pub dropped_frame: u32,
    /// Current target name.
    pub target_name: String,
    /// Last plate-solve result.
    pub annotate: Option<AnnotateResult>,
    /// Preview streaming requested.
    pub is_streaming: bool,
    /// At least one frame stream is live.
    pub is_fetching_images: bool,
}

impl ImagingStatus {
    /// Resets everything except `is_fetching_images`, which tracks local
    /// consumers rather than the device.
    pub fn reset(&mut self) {
        *self = Self {
            is_fetching_images: self.is_fetching_images,
            ..Self::default()
        };
    }

    /// Applies telemetry carried by an event.
    ///
    /// Fields absent from a `PiStatus` event keep their previous value.
    pub fn apply(&mut self, event: &ParsedEvent) {
        match event {
            ParsedEvent::PiStatus(pi) => {
                if let Some(temp) = pi.temp {
                    self.temp = Some(temp);
                }
                if let Some(charger_status) = pi.charger_status {
                    self.charger_status = Some(charger_status);
                }
                if let Some(charge_online) = pi.charge_online {
                    self.charge_online = Some(charge_online);
                }
                if let Some(battery_capacity) = pi.battery_capacity {
                    self.battery_capacity = Some(battery_capacity);
                }
            }
            ParsedEvent::Stack(stack) => {
                if let Some(stacked_frame) = stack.stacked_frame {
                    self.stacked_frame = stacked_frame;
                }
                if let Some(dropped_frame) = stack.dropped_frame {
                    self.dropped_frame = dropped_frame;
                }
            }
            ParsedEvent::Annotate(result) => {
                self.annotate = Some(result.clone());
            }
            ParsedEvent::Unknown { .. } => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::{PiStatusEvent, StackEvent};

    #[test]
    fn test_reset_keeps_fetching_flag() {
        let mut status = ImagingStatus {
            temp: Some(40.0),
            stacked_frame: 9,
            target_name: "M31".into(),
            is_streaming: true,
            is_fetching_images: true,
            ..ImagingStatus::default()
        };

        status.reset();
        assert_eq!(
            status,
            ImagingStatus {
                is_fetching_images: true,
                ..ImagingStatus::default()
            }
        );
    }

    #[test]
    fn test_apply_partial_pi_status() {
        let mut status = ImagingStatus {
            battery_capacity: Some(50),
            ..ImagingStatus::default()
        };

        status.apply(&ParsedEvent::PiStatus(PiStatusEvent {
            temp: Some(38.5),
            charger_status: Some(ChargerStatus::Full),
            charge_online: None,
            battery_capacity: None,
        }));

        assert_eq!(status.temp, Some(38.5));
        assert_eq!(status.charger_status, Some(ChargerStatus::Full));
        assert_eq!(status.battery_capacity, Some(50));
    }

    #[test]
    fn test_apply_stack_counters() {
        let mut status = ImagingStatus::default();
        status.apply(&ParsedEvent::Stack(StackEvent {
            state: "frame_complete".into(),
            stacked_frame: Some(4),
            dropped_frame: Some(1),
        }));
        assert_eq!((status.stacked_frame, status.dropped_frame), (4, 1));
    }

    #[test]
    fn test_apply_stack_without_counters_keeps_them() {
        let mut status = ImagingStatus {
            stacked_frame: 7,
            dropped_frame: 2,
            ..ImagingStatus::default()
        };
        status.apply(&ParsedEvent::Stack(StackEvent {
            state: "frame_complete".into(),
            stacked_frame: None,
            dropped_frame: None,
        }));
        assert_eq!((status.stacked_frame, status.dropped_frame), (7, 2));
    }

    #[test]
    fn test_serializes_for_hosts() {
        let value = serde_json::to_value(ImagingStatus::default()).unwrap();
        assert_eq!(value["is_streaming"], false);
        assert_eq!(value["target_name"], "");
    }
}
