//! Frame sources.
//!
//! - Synthetic `stub://` scenes (tests, demos)
//! - Local image directories: still images decoded in file name order
//!
//! A live camera driver is not part of this crate; anything that can produce
//! `RgbFrame`s can publish into the `FrameSlot` directly.
//!
//! Sources are pull-based: `next_frame` returns `Ok(None)` when the stream ends.

pub mod file;
pub mod synthetic;

use anyhow::{anyhow, Result};

use crate::frame::RgbFrame;
use file::ImageDirSource;
use synthetic::SyntheticSource;

/// Largest accepted width or height for generated frames.
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Configuration for a frame source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    /// `stub://<scene>` or a local directory path.
    pub url: String,
    /// Target frame rate (frames per second). Used to pace publishing.
    pub target_fps: u32,
    /// Frame width for synthetic scenes.
    pub width: u32,
    /// Frame height for synthetic scenes.
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "stub://street".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    /// Frames that could not be produced (decode errors); the stream continues.
    pub frames_failed: u64,
    pub url: String,
}

/// Frame source selected from the configured URL.
pub struct FrameSource {
    backend: SourceBackend,
    frames_failed: u64,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    ImageDir(ImageDirSource),
}

impl FrameSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(anyhow!("frame source url is empty"));
        }
        if config.url.starts_with("stub://") {
            Ok(Self {
                backend: SourceBackend::Synthetic(SyntheticSource::new(config)?),
                frames_failed: 0,
            })
        } else if config.url.contains("://") {
            Err(anyhow!(
                "unsupported frame source {} (use stub:// or a local directory)",
                config.url
            ))
        } else {
            Ok(Self {
                backend: SourceBackend::ImageDir(ImageDirSource::new(config)),
                frames_failed: 0,
            })
        }
    }

    /// Open the source. Failure here is reported to the user, not retried.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.connect(),
            SourceBackend::ImageDir(source) => source.connect(),
        }
    }

    /// Next frame, or `None` at end of stream.
    ///
    /// An error covers this frame only: the source has already moved past it, so the
    /// caller may skip the cycle and ask again.
    pub fn next_frame(&mut self) -> Result<Option<RgbFrame>> {
        let frame = match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame().map(Some),
            SourceBackend::ImageDir(source) => source.next_frame(),
        };
        if frame.is_err() {
            self.frames_failed += 1;
        }
        frame
    }

    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            SourceBackend::Synthetic(source) => source.is_healthy(),
            SourceBackend::ImageDir(source) => source.is_healthy(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        let mut stats = match &self.backend {
            SourceBackend::Synthetic(source) => source.stats(),
            SourceBackend::ImageDir(source) => source.stats(),
        };
        stats.frames_failed = self.frames_failed;
        stats
    }
}
