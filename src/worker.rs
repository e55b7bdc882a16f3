//! Frame worker: one background thread that drains the `FrameSlot`.
//!
//! Each frame runs through the whole pipeline synchronously before the next one is
//! taken. Frames published in the meantime overwrite each other in the slot, so a slow
//! inference delays processing but never builds a backlog. A per-frame error is logged
//! and the worker moves on. Closing the slot stops the worker.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::decision::{DecisionPipeline, FrameReport};
use crate::frame::FrameSlot;

/// Counters returned when the worker stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub frames_processed: u64,
    pub frames_failed: u64,
    pub frames_skipped: u64,
    pub alerts_spoken: u64,
}

pub struct FrameWorker {
    handle: JoinHandle<Result<WorkerStats>>,
}

impl FrameWorker {
    /// Start the worker thread. `on_report` sees every successfully processed frame.
    pub fn spawn<F>(slot: Arc<FrameSlot>, mut pipeline: DecisionPipeline, mut on_report: F) -> Result<Self>
    where
        F: FnMut(FrameReport) + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name("frame-worker".to_string())
            .spawn(move || {
                let mut stats = WorkerStats::default();
                while let Some(frame) = slot.take()? {
                    let now_ms = pipeline.session().now_ms();
                    match pipeline.process_frame(&frame, now_ms) {
                        Ok(report) => {
                            if report.skipped {
                                stats.frames_skipped += 1;
                            } else {
                                stats.frames_processed += 1;
                            }
                            stats.alerts_spoken += report.spoken.len() as u64;
                            log::debug!(
                                "frame {}: {} boxes, brightness {:?}, age {:?}",
                                report.sequence,
                                report.overlays.len(),
                                report.brightness,
                                frame.age()
                            );
                            on_report(report);
                        }
                        Err(e) => {
                            stats.frames_failed += 1;
                            log::warn!("frame {} failed: {:#}", frame.sequence, e);
                        }
                    }
                }
                log::info!(
                    "frame worker stopped: processed={} skipped={} failed={}",
                    stats.frames_processed,
                    stats.frames_skipped,
                    stats.frames_failed
                );
                Ok(stats)
            })
            .context("failed to spawn frame worker thread")?;
        Ok(Self { handle })
    }

    /// Wait for the worker to finish. Close the slot first or this blocks forever.
    pub fn join(self) -> Result<WorkerStats> {
        self.handle
            .join()
            .map_err(|_| anyhow!("frame worker panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{RecordingSink, RecordingTorch};
    use crate::decision::PipelineSettings;
    use crate::detect::{DetectorOutput, FixtureDetector, ObjectDetector};
    use crate::frame::RgbFrame;
    use crate::labels::LabelMap;
    use crate::session::Session;
    use std::sync::mpsc;

    fn pipeline(detector: Option<Box<dyn ObjectDetector>>) -> DecisionPipeline {
        DecisionPipeline::new(
            LabelMap::builtin(),
            PipelineSettings::default(),
            Session::new(false),
            Arc::new(RecordingSink::new()),
            Arc::new(RecordingTorch::new()),
        )
        .with_detector(detector)
    }

    #[test]
    fn worker_processes_until_closed() -> Result<()> {
        let slot = Arc::new(FrameSlot::new());
        let (tx, rx) = mpsc::channel();
        let worker = FrameWorker::spawn(slot.clone(), pipeline(None), move |report| {
            let _ = tx.send(report.sequence);
        })?;

        slot.publish(RgbFrame::filled(8, 8, [90, 90, 90]).with_sequence(1))?;
        assert_eq!(rx.recv()?, 1);
        slot.publish(RgbFrame::filled(8, 8, [90, 90, 90]).with_sequence(2))?;
        assert_eq!(rx.recv()?, 2);

        slot.close();
        let stats = worker.join()?;
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.frames_failed, 0);
        Ok(())
    }

    #[test]
    fn bad_detector_output_is_counted_not_fatal() -> Result<()> {
        let broken = DetectorOutput {
            locations: vec![0.0; 3],
            classes: vec![1.0],
            scores: vec![0.9],
        };
        let slot = Arc::new(FrameSlot::new());
        let detector: Box<dyn ObjectDetector> = Box::new(FixtureDetector::new(broken));
        let worker = FrameWorker::spawn(slot.clone(), pipeline(Some(detector)), |_| {})?;

        slot.publish(RgbFrame::filled(8, 8, [90, 90, 90]).with_sequence(1))?;
        slot.close();
        let stats = worker.join()?;
        assert_eq!(stats.frames_failed, 1);
        assert_eq!(stats.frames_processed, 0);
        Ok(())
    }
}
