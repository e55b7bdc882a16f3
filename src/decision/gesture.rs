/// Taps closer together than this count as one burst.
pub const RAPID_TAP_WINDOW_MS: u64 = 1000;

/// What a tap asks the application to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapAction {
    None,
    /// Second rapid tap: flip proximity alert mode.
    ToggleAlertMode,
    /// Third rapid tap: terminate the process.
    Exit,
}

/// Counts rapid taps on the control region.
///
/// The guards are exact matches and the counter is not reset after a toggle, so a
/// fourth rapid tap does nothing and a third one right after toggling exits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TapTracker {
    count: u32,
    last_tap_ms: Option<u64>,
}

impl TapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, now_ms: u64) -> TapAction {
        let rapid = self
            .last_tap_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < RAPID_TAP_WINDOW_MS);
        self.count = if rapid { self.count.saturating_add(1) } else { 1 };
        self.last_tap_ms = Some(now_ms);

        match self.count {
            2 => TapAction::ToggleAlertMode,
            3 => TapAction::Exit,
            _ => TapAction::None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
