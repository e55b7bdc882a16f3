//! hazard_watch - hazard detection daemon
//!
//! This daemon:
//! 1. Loads config, labels and models (a model that fails to load disables its feature)
//! 2. Opens the configured frame source
//! 3. Publishes frames into a latest-frame-wins slot at the target rate
//! 4. Runs the decision pipeline on a dedicated worker thread
//! 5. Feeds scripted taps (`--taps`) through the gesture controller

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hazard_watch::{
    load_classifier, load_detector, AlertEvent, AlertSink, Cue, DecisionPipeline, FrameSlot,
    FrameSource, FrameWorker, HazardConfig, LabelMap, LogSink, LogTorch, Session, TapAction,
};

/// Give up on a source that fails this many frames in a row.
const MAX_CONSECUTIVE_FRAME_ERRORS: u32 = 10;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "HAZARD_CONFIG")]
    config: Option<PathBuf>,
    /// Frame source: stub://<scene> or a local image directory.
    #[arg(long)]
    source: Option<String>,
    /// Stop after this many frames (0 = until the source ends).
    #[arg(long, default_value_t = 0)]
    frames: u64,
    /// Start with proximity alerts enabled.
    #[arg(long)]
    alert_mode: bool,
    /// Scripted taps on the control region, in ms since start (comma separated).
    #[arg(long, value_delimiter = ',')]
    taps: Vec<u64>,
    /// Render overlay frames (kept in reports, logged at debug level).
    #[arg(long)]
    render: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = HazardConfig::load_from(args.config.as_deref())?;
    if let Some(source) = args.source {
        cfg.source.url = source;
    }
    if args.alert_mode {
        cfg.alerts.alert_mode = true;
    }

    let sink: Arc<dyn AlertSink> = Arc::new(LogSink);
    let torch = Arc::new(LogTorch);
    sink.emit(AlertEvent::Play(Cue::Startup));

    let labels = match &cfg.labels_path {
        Some(path) => LabelMap::load(path)?,
        None => LabelMap::builtin(),
    };
    let session = Session::new(cfg.alerts.alert_mode);
    let mut settings = cfg.pipeline_settings();
    settings.render_overlay = args.render;
    let pipeline = DecisionPipeline::new(labels, settings, session.clone(), sink.clone(), torch)
        .with_detector(load_detector(&cfg.models))
        .with_classifier(load_classifier(&cfg.models));

    let mut source = FrameSource::new(cfg.source.clone())?;
    if let Err(e) = source.connect() {
        log::error!("frame source {} unavailable: {:#}", cfg.source.url, e);
        session.report_source_unavailable(sink.as_ref())?;
        return Ok(());
    }

    let slot = Arc::new(FrameSlot::new());
    {
        let slot = Arc::clone(&slot);
        ctrlc::set_handler(move || slot.close())
            .map_err(|e| anyhow!("failed to install ctrl-c handler: {}", e))?;
    }
    let worker = FrameWorker::spawn(slot.clone(), pipeline, |report| {
        for text in &report.spoken {
            log::debug!("frame {} alert: {}", report.sequence, text);
        }
    })?;

    let frame_interval = Duration::from_millis(1000 / cfg.source.target_fps as u64);
    let mut pending_taps: Vec<u64> = args.taps;
    pending_taps.sort_unstable();
    pending_taps.reverse();
    let mut last_health_log = Instant::now();
    let mut published = 0u64;
    let mut consecutive_errors = 0u32;
    let mut exit_requested = false;

    log::info!(
        "hazard_watch running: source={} alert_mode={}",
        cfg.source.url,
        cfg.alerts.alert_mode
    );

    while !slot.is_closed() {
        let now_ms = session.now_ms();
        while pending_taps.last().is_some_and(|&t| t <= now_ms) {
            let tap_ms = pending_taps.pop().unwrap_or(now_ms);
            if session.on_tap(tap_ms, sink.as_ref())? == TapAction::Exit {
                exit_requested = true;
            }
        }
        if exit_requested {
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => {
                consecutive_errors = 0;
                frame
            }
            Ok(None) => {
                log::info!("frame source ended after {} frames", published);
                break;
            }
            Err(e) => {
                consecutive_errors += 1;
                log::warn!("skipping frame: {:#}", e);
                if consecutive_errors >= MAX_CONSECUTIVE_FRAME_ERRORS {
                    log::error!(
                        "frame source failed {} frames in a row; stopping",
                        consecutive_errors
                    );
                    break;
                }
                std::thread::sleep(frame_interval);
                continue;
            }
        };
        if slot.publish(frame).is_err() {
            break;
        }
        published += 1;
        if args.frames > 0 && published >= args.frames {
            break;
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = source.stats();
            let slot_stats = slot.stats();
            log::info!(
                "source health={} frames={} failed={} dropped={} url={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.frames_failed,
                slot_stats.dropped,
                stats.url
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(frame_interval);
    }

    slot.close();
    let stats = worker.join()?;
    let snapshot = session.snapshot()?;
    log::info!(
        "processed={} skipped={} failed={} dropped={} alerts={} alert_mode={} torch={}",
        stats.frames_processed,
        stats.frames_skipped,
        stats.frames_failed,
        slot.stats().dropped,
        stats.alerts_spoken,
        snapshot.alert_mode,
        snapshot.flash_on
    );

    if exit_requested {
        std::process::exit(0);
    }
    Ok(())
}
