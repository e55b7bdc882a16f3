//! Alert output.
//!
//! The decision pipeline and the tap handler describe what should be heard or shown
//! as `AlertEvent`s. Sinks turn them into speech, sound or screen updates; playback
//! itself lives outside this crate. Emission is fire-and-forget.

use anyhow::{anyhow, Result};
use std::sync::Mutex;

/// Fixed sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Startup,
    RedLight,
    GreenLight,
    AlertModeOn,
    AlertModeOff,
    FlashOn,
    SourceUnavailable,
}

/// Live-updating text fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayField {
    DetectedObject,
    TrafficLight,
    AlertMode,
    ProximityAlert,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AlertEvent {
    Speak(String),
    Play(Cue),
    Display { field: DisplayField, text: String },
}

/// Destination for alert events. Shared between the frame worker and the tap handler.
pub trait AlertSink: Send + Sync {
    fn emit(&self, event: AlertEvent);
}

/// Writes alert events to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn emit(&self, event: AlertEvent) {
        match event {
            AlertEvent::Speak(text) => log::info!("speak: {}", text),
            AlertEvent::Play(cue) => log::info!("play: {:?}", cue),
            AlertEvent::Display { field, text } => log::debug!("display {:?}: {}", field, text),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AlertEvent::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AlertEvent::Play(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl AlertSink for RecordingSink {
    fn emit(&self, event: AlertEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

// ----------------------------------------------------------------------------
// Torch
// ----------------------------------------------------------------------------

/// Continuous illumination LED.
///
/// Best-effort: there is no readback, so callers keep their own view of the state.
pub trait Torch: Send + Sync {
    /// False when the device has no torch; toggles are then ignored.
    fn available(&self) -> bool {
        true
    }

    fn set_torch(&self, on: bool) -> Result<()>;
}

/// Torch that only logs requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTorch;

impl Torch for LogTorch {
    fn set_torch(&self, on: bool) -> Result<()> {
        log::info!("torch {}", if on { "on" } else { "off" });
        Ok(())
    }
}

/// Torch that records every request. `unavailable()` models a device without one.
#[derive(Debug)]
pub struct RecordingTorch {
    available: bool,
    requests: Mutex<Vec<bool>>,
}

impl RecordingTorch {
    pub fn new() -> Self {
        Self {
            available: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<bool> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for RecordingTorch {
    fn default() -> Self {
        Self::new()
    }
}

impl Torch for RecordingTorch {
    fn available(&self) -> bool {
        self.available
    }

    fn set_torch(&self, on: bool) -> Result<()> {
        if !self.available {
            return Err(anyhow!("device has no torch"));
        }
        self.requests
            .lock()
            .map_err(|_| anyhow!("torch lock poisoned"))?
            .push(on);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_splits_events() {
        let sink = RecordingSink::new();
        sink.emit(AlertEvent::Play(Cue::Startup));
        sink.emit(AlertEvent::Speak("car nearby".to_string()));
        sink.emit(AlertEvent::Display {
            field: DisplayField::DetectedObject,
            text: "Detected object: car".to_string(),
        });

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.cues(), vec![Cue::Startup]);
        assert_eq!(sink.spoken(), vec!["car nearby".to_string()]);

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn unavailable_torch_refuses_requests() {
        let torch = RecordingTorch::unavailable();
        assert!(!torch.available());
        assert!(torch.set_torch(true).is_err());
        assert!(torch.requests().is_empty());
    }
}
