//! Per-frame decisions: what to draw, what to say, when to light the torch.

pub mod brightness;
mod debounce;
mod gesture;
pub mod overlay;
mod pipeline;

pub use brightness::{average_brightness, needs_torch, LOW_LIGHT_THRESHOLD};
pub use debounce::{SpeechDebouncer, REPEAT_INTERVAL_MS};
pub use gesture::{TapAction, TapTracker, RAPID_TAP_WINDOW_MS};
pub use overlay::OverlayBox;
pub use pipeline::{
    DecisionPipeline, FrameReport, PipelineSettings, CONFIDENCE_THRESHOLD, LABEL_PLACEHOLDER,
    PROXIMITY_HEIGHT_RATIO,
};
