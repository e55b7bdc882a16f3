//! End-to-end runs: frame source -> slot -> worker -> pipeline -> alert sink.

use std::sync::mpsc;
use std::sync::Arc;

use anyhow::Result;
use hazard_watch::{
    Cue, DecisionPipeline, DetectorOutput, FixedClassifier, FixtureDetector, FrameReport,
    FrameSlot, FrameSource, FrameWorker, LabelMap, LightClassifier, ObjectDetector,
    PipelineSettings, RecordingSink, RecordingTorch, RgbFrame, Session, SourceConfig, TapAction,
};

const CAR: f32 = 2.0;
const TRAFFIC_LIGHT: f32 = 9.0;

struct Rig {
    slot: Arc<FrameSlot>,
    worker: FrameWorker,
    reports: mpsc::Receiver<FrameReport>,
    session: Session,
    sink: Arc<RecordingSink>,
    torch: Arc<RecordingTorch>,
}

fn rig(alert_mode: bool, output: DetectorOutput, light_score: f32) -> Result<Rig> {
    let sink = Arc::new(RecordingSink::new());
    let torch = Arc::new(RecordingTorch::new());
    let session = Session::new(alert_mode);
    let detector: Box<dyn ObjectDetector> = Box::new(FixtureDetector::new(output));
    let classifier: Box<dyn LightClassifier> = Box::new(FixedClassifier::new(light_score));
    let pipeline = DecisionPipeline::new(
        LabelMap::builtin(),
        PipelineSettings::default(),
        session.clone(),
        sink.clone(),
        torch.clone(),
    )
    .with_detector(Some(detector))
    .with_classifier(Some(classifier));

    let slot = Arc::new(FrameSlot::new());
    let (tx, reports) = mpsc::channel();
    let worker = FrameWorker::spawn(slot.clone(), pipeline, move |report| {
        let _ = tx.send(report);
    })?;
    Ok(Rig {
        slot,
        worker,
        reports,
        session,
        sink,
        torch,
    })
}

fn street_scene() -> DetectorOutput {
    DetectorOutput {
        locations: vec![
            0.25, 0.25, 0.75, 0.5, // car, half the frame tall
            0.05, 0.8, 0.2, 0.9, // traffic light, small
            0.0, 0.0, 1.0, 1.0, // low confidence
        ],
        classes: vec![CAR, TRAFFIC_LIGHT, CAR],
        scores: vec![0.92, 0.81, 0.4],
    }
}

#[test]
fn synthetic_street_produces_overlays_light_and_alert() -> Result<()> {
    let rig = rig(true, street_scene(), 0.73)?;
    let mut source = FrameSource::new(SourceConfig {
        url: "stub://street".to_string(),
        target_fps: 10,
        width: 120,
        height: 80,
    })?;
    source.connect()?;

    let frame = source.next_frame()?.expect("synthetic frame");
    rig.slot.publish(frame)?;
    let report = rig.reports.recv()?;

    assert_eq!(report.overlays.len(), 2);
    assert_eq!(report.overlays[0].caption, "car 92%");
    assert_eq!(report.overlays[1].caption, "traffic light 81%");
    assert_eq!(report.last_object.as_deref(), Some("traffic light"));
    assert_eq!(report.spoken, vec!["car nearby, be careful".to_string()]);
    assert!(!report.torch_requested);

    rig.slot.close();
    let stats = rig.worker.join()?;
    assert_eq!(stats.frames_processed, 1);
    assert_eq!(stats.alerts_spoken, 1);

    assert_eq!(rig.sink.cues(), vec![Cue::RedLight]);
    assert_eq!(rig.sink.spoken(), vec!["car nearby, be careful".to_string()]);
    assert!(rig.torch.requests().is_empty());
    Ok(())
}

#[test]
fn dark_scene_turns_torch_on_once() -> Result<()> {
    let rig = rig(false, DetectorOutput::default(), 0.0)?;
    let mut source = FrameSource::new(SourceConfig {
        url: "stub://dark".to_string(),
        target_fps: 10,
        width: 32,
        height: 32,
    })?;
    source.connect()?;

    for _ in 0..3 {
        let frame = source.next_frame()?.expect("synthetic frame");
        rig.slot.publish(frame)?;
        rig.reports.recv()?;
    }

    rig.slot.close();
    rig.worker.join()?;
    assert_eq!(rig.torch.requests(), vec![true]);
    assert_eq!(rig.sink.cues(), vec![Cue::FlashOn]);
    assert!(rig.session.snapshot()?.flash_on);
    Ok(())
}

#[test]
fn tap_toggle_enables_alerts_for_the_worker() -> Result<()> {
    let rig = rig(false, street_scene(), 0.2)?;
    let frame = || RgbFrame::filled(100, 100, [200, 200, 200]);

    rig.slot.publish(frame().with_sequence(1))?;
    assert!(rig.reports.recv()?.spoken.is_empty());

    let tap_sink = RecordingSink::new();
    assert_eq!(rig.session.on_tap(10, &tap_sink)?, TapAction::None);
    assert_eq!(rig.session.on_tap(300, &tap_sink)?, TapAction::ToggleAlertMode);
    assert_eq!(tap_sink.cues(), vec![Cue::AlertModeOn]);

    rig.slot.publish(frame().with_sequence(2))?;
    let report = rig.reports.recv()?;
    assert_eq!(report.sequence, 2);
    assert_eq!(report.spoken.len(), 1);

    rig.slot.close();
    rig.worker.join()?;
    assert_eq!(rig.sink.cues(), vec![Cue::GreenLight, Cue::GreenLight]);
    Ok(())
}

#[test]
fn empty_frames_are_skipped() -> Result<()> {
    let rig = rig(true, street_scene(), 0.9)?;
    rig.slot.publish(RgbFrame::filled(0, 0, [0, 0, 0]))?;
    let report = rig.reports.recv()?;
    assert!(report.skipped);

    rig.slot.close();
    let stats = rig.worker.join()?;
    assert_eq!(stats.frames_skipped, 1);
    assert!(rig.sink.events().is_empty());
    Ok(())
}

#[test]
fn triple_tap_during_processing_requests_exit() -> Result<()> {
    let rig = rig(false, street_scene(), 0.9)?;
    let tap_sink = RecordingSink::new();
    let mut actions = Vec::new();

    for (sequence, tap_ms) in [(1u64, 0u64), (2, 400), (3, 700)] {
        rig.slot
            .publish(RgbFrame::filled(100, 100, [120, 120, 120]).with_sequence(sequence))?;
        actions.push(rig.session.on_tap(tap_ms, &tap_sink)?);
        assert_eq!(rig.reports.recv()?.sequence, sequence);
    }

    assert_eq!(
        actions,
        vec![TapAction::None, TapAction::ToggleAlertMode, TapAction::Exit]
    );
    assert_eq!(tap_sink.cues(), vec![Cue::AlertModeOn]);

    rig.slot.close();
    let stats = rig.worker.join()?;
    assert_eq!(stats.frames_processed, 3);
    let snapshot = rig.session.snapshot()?;
    assert!(snapshot.alert_mode);
    assert_eq!(snapshot.tap_count, 3);
    Ok(())
}
