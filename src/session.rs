//! Session state shared by the frame worker and the tap handler.
//!
//! Alert mode, torch state, the tap tracker, the speech debouncer and the display
//! fields all live in one `SessionState` behind one mutex. Every mutation goes through
//! `Session`, so a tap arriving while a frame is processed cannot race with it.
//! Alert events are collected under the lock and emitted after it is released.

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::alert::{AlertEvent, AlertSink, Cue, DisplayField, Torch};
use crate::decision::{SpeechDebouncer, TapAction, TapTracker};

/// Detected-object text shown when the frame source cannot be opened.
pub const SOURCE_UNAVAILABLE_NOTICE: &str = "Camera source unavailable";

/// Proximity alert state.
#[derive(Clone, Debug, Default)]
pub struct AlertState {
    pub alert_mode: bool,
    pub speech: SpeechDebouncer,
}

/// Best-effort mirror of the torch. Never read back from hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlashState {
    pub on: bool,
}

/// Latest text of each display field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFields {
    pub detected_object: Option<String>,
    pub traffic_light: Option<String>,
    pub alert_mode: Option<String>,
    pub proximity_alert: Option<String>,
}

impl DisplayFields {
    pub fn get(&self, field: DisplayField) -> Option<&str> {
        match field {
            DisplayField::DetectedObject => self.detected_object.as_deref(),
            DisplayField::TrafficLight => self.traffic_light.as_deref(),
            DisplayField::AlertMode => self.alert_mode.as_deref(),
            DisplayField::ProximityAlert => self.proximity_alert.as_deref(),
        }
    }

    fn slot(&mut self, field: DisplayField) -> &mut Option<String> {
        match field {
            DisplayField::DetectedObject => &mut self.detected_object,
            DisplayField::TrafficLight => &mut self.traffic_light,
            DisplayField::AlertMode => &mut self.alert_mode,
            DisplayField::ProximityAlert => &mut self.proximity_alert,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub alert: AlertState,
    pub flash: FlashState,
    pub taps: TapTracker,
    pub display: DisplayFields,
}

impl SessionState {
    /// Update a display field and queue the matching event.
    pub fn show(&mut self, field: DisplayField, text: String, events: &mut Vec<AlertEvent>) {
        *self.display.slot(field) = Some(text.clone());
        events.push(AlertEvent::Display { field, text });
    }

    /// Flip the torch state. Returns the requested state, or `None` when the device has
    /// no torch (state unchanged).
    pub fn toggle_flash(&mut self, torch: &dyn Torch, events: &mut Vec<AlertEvent>) -> Option<bool> {
        if !torch.available() {
            log::debug!("torch unavailable; flash toggle ignored");
            return None;
        }
        let on = !self.flash.on;
        self.flash.on = on;
        if on {
            events.push(AlertEvent::Play(Cue::FlashOn));
        }
        if let Err(e) = torch.set_torch(on) {
            log::warn!("torch request failed: {:#}", e);
        }
        Some(on)
    }
}

/// Copy of the session state for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub alert_mode: bool,
    pub flash_on: bool,
    pub tap_count: u32,
    pub display: DisplayFields,
}

/// Shared handle to the session state.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    started: Instant,
}

impl Session {
    pub fn new(alert_mode: bool) -> Self {
        let state = SessionState {
            alert: AlertState {
                alert_mode,
                ..AlertState::default()
            },
            ..SessionState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the session started; the clock for debounce and taps.
    pub fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))
    }

    /// Run `f` under the session lock, then emit the events it queued.
    pub fn update<R>(
        &self,
        sink: &dyn AlertSink,
        f: impl FnOnce(&mut SessionState, &mut Vec<AlertEvent>) -> R,
    ) -> Result<R> {
        let mut events = Vec::new();
        let result = {
            let mut state = self.lock()?;
            f(&mut state, &mut events)
        };
        for event in events {
            sink.emit(event);
        }
        Ok(result)
    }

    /// Handle a tap on the control region at `now_ms`.
    ///
    /// The second rapid tap flips alert mode; the third asks the caller to exit.
    pub fn on_tap(&self, now_ms: u64, sink: &dyn AlertSink) -> Result<TapAction> {
        self.update(sink, |state, events| {
            let action = state.taps.register(now_ms);
            match action {
                TapAction::ToggleAlertMode => {
                    let enabled = !state.alert.alert_mode;
                    state.alert.alert_mode = enabled;
                    let (cue, text) = if enabled {
                        (Cue::AlertModeOn, "Proximity alert mode: on")
                    } else {
                        (Cue::AlertModeOff, "Proximity alert mode: off")
                    };
                    events.push(AlertEvent::Play(cue));
                    state.show(DisplayField::AlertMode, text.to_string(), events);
                    log::info!("proximity alert mode {}", if enabled { "on" } else { "off" });
                }
                TapAction::Exit => log::info!("exit requested by tap gesture"),
                TapAction::None => {}
            }
            action
        })
    }

    /// The frame source could not be opened: show the notice and play its cue.
    /// Nothing is retried.
    pub fn report_source_unavailable(&self, sink: &dyn AlertSink) -> Result<()> {
        self.update(sink, |state, events| {
            state.show(
                DisplayField::DetectedObject,
                SOURCE_UNAVAILABLE_NOTICE.to_string(),
                events,
            );
            events.push(AlertEvent::Play(Cue::SourceUnavailable));
        })
    }

    /// Manual torch toggle (the flash control).
    pub fn toggle_flash(&self, torch: &dyn Torch, sink: &dyn AlertSink) -> Result<Option<bool>> {
        self.update(sink, |state, events| state.toggle_flash(torch, events))
    }

    pub fn alert_mode(&self) -> Result<bool> {
        Ok(self.lock()?.alert.alert_mode)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let state = self.lock()?;
        Ok(SessionSnapshot {
            alert_mode: state.alert.alert_mode,
            flash_on: state.flash.on,
            tap_count: state.taps.count(),
            display: state.display.clone(),
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}
