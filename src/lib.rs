//! Hazard Watch
//!
//! Per-frame hazard detection over a camera stream: an object detector runs on every
//! frame, confident detections are drawn as overlays, traffic lights are classified
//! red or green, and large nearby objects trigger spoken proximity alerts.
//!
//! # Architecture
//!
//! Frame Source -> Preprocessor -> Detector -> Decision Pipeline ->
//! {overlay render, Classifier (conditionally), Alert Sink}
//!
//! The pipeline enforces a few rules by construction:
//!
//! 1. **Fixed confidence gate**: only candidates scoring above 0.63 are considered.
//! 2. **Debounced speech**: a proximity alert for the same label repeats at most every 8 s.
//! 3. **Latest frame wins**: the frame worker never queues; stale frames are dropped.
//! 4. **Single owner of state**: alert mode, torch state and the tap tracker live in
//!    one `Session` behind one lock, shared by the frame worker and the tap handler.
//!
//! # Module Structure
//!
//! - `frame`: RGB frame container, crop rectangles, the latest-frame slot
//! - `ingest`: Frame sources (synthetic `stub://` scenes, local image directories)
//! - `preprocess`: Bilinear resize into detector and classifier tensors
//! - `detect`: Detector/classifier traits, output contract, backends
//! - `decision`: Debounce, tap gestures, brightness heuristic, overlays, the pipeline
//! - `session`: Shared mutable state and the tap/flash entry points
//! - `alert`: Alert events, sinks and torch control
//! - `worker`: Background thread draining the frame slot

pub mod alert;
pub mod config;
pub mod decision;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod labels;
pub mod preprocess;
pub mod session;
pub mod worker;

pub use alert::{
    AlertEvent, AlertSink, Cue, DisplayField, LogSink, LogTorch, RecordingSink, RecordingTorch, Torch,
};
pub use config::{AlertSettings, HazardConfig, ModelSettings};
pub use decision::{
    DecisionPipeline, FrameReport, OverlayBox, PipelineSettings, SpeechDebouncer, TapAction,
    TapTracker, CONFIDENCE_THRESHOLD, PROXIMITY_HEIGHT_RATIO,
};
pub use detect::{
    load_classifier, load_detector, BoundingBox, Detection, DetectorOutput, FixedClassifier,
    FixtureDetector, LightClassifier, LightColor, ObjectDetector, PixelBox,
};
pub use frame::{FrameSlot, PixelRect, RgbFrame, SlotStats};
pub use ingest::{FrameSource, SourceConfig, SourceStats};
pub use labels::LabelMap;
pub use session::{DisplayFields, Session, SessionSnapshot, SOURCE_UNAVAILABLE_NOTICE};
pub use worker::{FrameWorker, WorkerStats};
