use anyhow::Result;
use std::sync::Arc;

use crate::alert::{AlertEvent, AlertSink, Cue, DisplayField, Torch};
use crate::decision::brightness::{average_brightness, needs_torch};
use crate::decision::overlay::{self, OverlayBox};
use crate::detect::{Detection, LightClassifier, LightColor, ObjectDetector, PixelBox};
use crate::frame::RgbFrame;
use crate::labels::LabelMap;
use crate::preprocess;
use crate::session::Session;

/// Candidates must score strictly above this to be considered.
pub const CONFIDENCE_THRESHOLD: f32 = 0.63;

/// Boxes taller than this fraction of the frame count as nearby.
pub const PROXIMITY_HEIGHT_RATIO: f32 = 0.45;

/// Placeholder substituted with the class label in the alert phrase.
pub const LABEL_PLACEHOLDER: &str = "{label}";

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Label that routes a detection through the traffic light classifier.
    pub traffic_light_label: String,
    /// Spoken proximity alert; `{label}` is replaced by the class label.
    pub alert_template: String,
    /// Keep the rendered overlay frame in the report.
    pub render_overlay: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            traffic_light_label: "traffic light".to_string(),
            alert_template: "{label} nearby, be careful".to_string(),
            render_overlay: false,
        }
    }
}

impl PipelineSettings {
    pub fn alert_text(&self, label: &str) -> String {
        self.alert_template.replace(LABEL_PLACEHOLDER, label)
    }
}

/// What one frame produced.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    pub sequence: u64,
    /// True when the frame was missing or empty and nothing ran.
    pub skipped: bool,
    pub brightness: Option<u32>,
    pub torch_requested: bool,
    pub overlays: Vec<OverlayBox>,
    /// Label of the last confident detection (last writer wins).
    pub last_object: Option<String>,
    /// Colour verdicts, one per classified traffic light.
    pub lights: Vec<LightColor>,
    /// Proximity alerts actually spoken.
    pub spoken: Vec<String>,
    pub rendered: Option<RgbFrame>,
}

/// Per-frame decision pipeline.
///
/// Owns the model backends and a handle to the shared `Session`. Each call to
/// `process_frame` runs brightness check, detection, overlay, traffic light
/// classification and proximity alerts for one frame, synchronously.
pub struct DecisionPipeline {
    detector: Option<Box<dyn ObjectDetector>>,
    classifier: Option<Box<dyn LightClassifier>>,
    labels: LabelMap,
    settings: PipelineSettings,
    session: Session,
    sink: Arc<dyn AlertSink>,
    torch: Arc<dyn Torch>,
}

impl DecisionPipeline {
    pub fn new(
        labels: LabelMap,
        settings: PipelineSettings,
        session: Session,
        sink: Arc<dyn AlertSink>,
        torch: Arc<dyn Torch>,
    ) -> Self {
        Self {
            detector: None,
            classifier: None,
            labels,
            settings,
            session,
            sink,
            torch,
        }
    }

    pub fn with_detector(mut self, detector: Option<Box<dyn ObjectDetector>>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_classifier(mut self, classifier: Option<Box<dyn LightClassifier>>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn process_frame(&mut self, frame: &RgbFrame, now_ms: u64) -> Result<FrameReport> {
        let mut report = FrameReport {
            sequence: frame.sequence,
            ..FrameReport::default()
        };
        if frame.is_empty() {
            log::debug!("frame {} has no pixels; skipping", frame.sequence);
            report.skipped = true;
            return Ok(report);
        }

        self.check_ambient_light(frame, &mut report)?;

        let Some(detector) = self.detector.as_mut() else {
            return Ok(report);
        };
        let input = preprocess::detector_input(frame)?;
        let detections = detector.detect(&input)?.detections()?;

        for detection in detections {
            if detection.score > CONFIDENCE_THRESHOLD {
                self.handle_detection(frame, detection, now_ms, &mut report)?;
            }
        }

        if self.settings.render_overlay {
            report.rendered = Some(overlay::render(frame, &report.overlays)?);
        }
        Ok(report)
    }

    /// Runs on every frame, detections or not. Only ever turns the torch on.
    fn check_ambient_light(&self, frame: &RgbFrame, report: &mut FrameReport) -> Result<()> {
        let Some(brightness) = average_brightness(frame) else {
            return Ok(());
        };
        report.brightness = Some(brightness);
        let torch = self.torch.as_ref();
        report.torch_requested = self.session.update(self.sink.as_ref(), |state, events| {
            if needs_torch(brightness, state.flash.on) {
                log::info!("low light (brightness {}); turning torch on", brightness);
                state.toggle_flash(torch, events).is_some()
            } else {
                false
            }
        })?;
        Ok(())
    }

    fn handle_detection(
        &mut self,
        frame: &RgbFrame,
        detection: Detection,
        now_ms: u64,
        report: &mut FrameReport,
    ) -> Result<()> {
        let Some(label) = self.labels.get(detection.class_index).map(str::to_string) else {
            log::warn!(
                "class index {} outside label map ({} labels); candidate {} skipped",
                detection.class_index,
                self.labels.len(),
                detection.slot
            );
            return Ok(());
        };

        let bbox = detection.bbox.to_pixels(frame.width, frame.height);
        report
            .overlays
            .push(OverlayBox::new(detection.slot, &label, detection.score, bbox));
        report.last_object = Some(label.clone());
        self.session.update(self.sink.as_ref(), |state, events| {
            state.show(
                DisplayField::DetectedObject,
                format!("Detected object: {}", label),
                events,
            );
        })?;

        if label == self.settings.traffic_light_label {
            if let Some(color) = self.classify_light(frame, &bbox) {
                report.lights.push(color);
                self.session.update(self.sink.as_ref(), |state, events| {
                    state.show(
                        DisplayField::TrafficLight,
                        format!("Traffic light status: {}", color.as_str()),
                        events,
                    );
                    let cue = match color {
                        LightColor::Red => Cue::RedLight,
                        LightColor::Green => Cue::GreenLight,
                    };
                    events.push(AlertEvent::Play(cue));
                })?;
            }
        }

        if bbox.height() > PROXIMITY_HEIGHT_RATIO * frame.height as f32 {
            let text = self.settings.alert_text(&label);
            let spoken = self.session.update(self.sink.as_ref(), |state, events| {
                if !state.alert.alert_mode || !state.alert.speech.try_announce(&label, now_ms) {
                    return false;
                }
                state.show(DisplayField::ProximityAlert, text.clone(), events);
                events.push(AlertEvent::Speak(text.clone()));
                true
            })?;
            if spoken {
                report.spoken.push(text);
            }
        }
        Ok(())
    }

    /// Crop the box and ask the classifier for a colour. `None` when no classifier is
    /// loaded, the crop is degenerate, or inference fails.
    fn classify_light(&mut self, frame: &RgbFrame, bbox: &PixelBox) -> Option<LightColor> {
        let classifier = self.classifier.as_mut()?;
        let Some(crop) = bbox
            .crop_rect(frame.width, frame.height)
            .and_then(|rect| frame.crop(rect))
        else {
            log::debug!("traffic light box {:?} has no area; not classified", bbox);
            return None;
        };
        let score = preprocess::classifier_input(&crop)
            .and_then(|input| classifier.classify(&input));
        match score {
            Ok(score) => Some(LightColor::from_score(score)),
            Err(e) => {
                log::warn!("traffic light classification failed: {:#}", e);
                None
            }
        }
    }
}
