/// Minimum gap before the same label may be announced again.
pub const REPEAT_INTERVAL_MS: u64 = 8000;

/// Two-condition debounce for spoken proximity alerts.
///
/// A label is announced when it differs from the last announced label, or when at
/// least `REPEAT_INTERVAL_MS` have passed since the last announcement of any label.
/// A label that keeps changing is announced on every call; this is not a rate limiter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpeechDebouncer {
    last_label: Option<String>,
    last_at_ms: Option<u64>,
}

impl SpeechDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permits(&self, label: &str, now_ms: u64) -> bool {
        if self.last_label.as_deref() != Some(label) {
            return true;
        }
        match self.last_at_ms {
            Some(last) => now_ms.saturating_sub(last) >= REPEAT_INTERVAL_MS,
            None => true,
        }
    }

    /// Check and, when permitted, record `(label, now_ms)` as the last announcement.
    pub fn try_announce(&mut self, label: &str, now_ms: u64) -> bool {
        if !self.permits(label, now_ms) {
            return false;
        }
        self.last_label = Some(label.to_string());
        self.last_at_ms = Some(now_ms);
        true
    }

    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn last_at_ms(&self) -> Option<u64> {
        self.last_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_label_waits_for_interval() {
        let mut debouncer = SpeechDebouncer::new();
        assert!(debouncer.try_announce("car", 0));
        assert!(!debouncer.try_announce("car", 5000));
        assert!(debouncer.try_announce("car", 9000));
        assert_eq!(debouncer.last_at_ms(), Some(9000));
    }

    #[test]
    fn different_label_passes_immediately() {
        let mut debouncer = SpeechDebouncer::new();
        assert!(debouncer.try_announce("car", 0));
        assert!(debouncer.try_announce("truck", 1000));
        assert_eq!(debouncer.last_label(), Some("truck"));
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let mut debouncer = SpeechDebouncer::new();
        assert!(debouncer.try_announce("bus", 100));
        assert!(!debouncer.permits("bus", 8099));
        assert!(debouncer.permits("bus", 8100));
    }

    #[test]
    fn suppressed_attempt_does_not_reset_timer() {
        let mut debouncer = SpeechDebouncer::new();
        assert!(debouncer.try_announce("car", 0));
        assert!(!debouncer.try_announce("car", 7000));
        assert!(debouncer.try_announce("car", 8000));
    }
}
