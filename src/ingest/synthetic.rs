//! Synthetic frame source for `stub://` URLs.
//!
//! Scenes:
//! - `stub://dark`: black frames (exercises the torch heuristic)
//! - `stub://bright`: white frames
//! - anything else: a moving gradient with a little sensor noise

use anyhow::{anyhow, Result};
use rand::Rng;

use super::{SourceConfig, SourceStats, MAX_FRAME_DIMENSION};
use crate::frame::RgbFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scene {
    Dark,
    Bright,
    Street,
}

pub(crate) struct SyntheticSource {
    config: SourceConfig,
    scene: Scene,
    frame_count: u64,
    connected: bool,
}

impl SyntheticSource {
    pub(crate) fn new(config: SourceConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!(
                "synthetic source needs a non-zero frame size, got {}x{}",
                config.width,
                config.height
            ));
        }
        if config.width > MAX_FRAME_DIMENSION || config.height > MAX_FRAME_DIMENSION {
            return Err(anyhow!(
                "synthetic frame size {}x{} exceeds {} pixels per side",
                config.width,
                config.height,
                MAX_FRAME_DIMENSION
            ));
        }
        let scene = match config.url.trim_start_matches("stub://") {
            "dark" => Scene::Dark,
            "bright" => Scene::Bright,
            _ => Scene::Street,
        };
        Ok(Self {
            config,
            scene,
            frame_count: 0,
            connected: false,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!(
            "FrameSource: connected to {} (synthetic {:?}, {}x{})",
            self.config.url,
            self.scene,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<RgbFrame> {
        if !self.connected {
            return Err(anyhow!("synthetic source {} not connected", self.config.url));
        }
        self.frame_count += 1;
        let (width, height) = (self.config.width, self.config.height);
        let frame = match self.scene {
            Scene::Dark => RgbFrame::filled(width, height, [0, 0, 0]),
            Scene::Bright => RgbFrame::filled(width, height, [255, 255, 255]),
            Scene::Street => RgbFrame::new(self.street_pixels(), width, height)?,
        };
        Ok(frame.with_sequence(self.frame_count))
    }

    fn street_pixels(&self) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let width = self.config.width as u64;
        let pixel_count = self.config.width as u64 * self.config.height as u64;
        let mut pixels = Vec::with_capacity(pixel_count as usize * 3);
        for i in 0..pixel_count {
            let x = i % width;
            let y = i / width;
            let base = ((x + y + self.frame_count) % 200) as u8 + 40;
            let noise: u8 = rng.gen_range(0..8);
            pixels.extend_from_slice(&[base.saturating_add(noise), base, base / 2]);
        }
        pixels
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.connected
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            frames_failed: 0,
            url: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::average_brightness;

    fn source(url: &str) -> Result<SyntheticSource> {
        let mut source = SyntheticSource::new(SourceConfig {
            url: url.to_string(),
            target_fps: 10,
            width: 16,
            height: 8,
        })?;
        source.connect()?;
        Ok(source)
    }

    #[test]
    fn dark_scene_is_below_light_threshold() -> Result<()> {
        let frame = source("stub://dark")?.next_frame()?;
        assert_eq!(average_brightness(&frame), Some(0));
        Ok(())
    }

    #[test]
    fn street_scene_is_lit() -> Result<()> {
        let frame = source("stub://street")?.next_frame()?;
        assert!(average_brightness(&frame).unwrap_or(0) >= 20);
        Ok(())
    }

    #[test]
    fn frames_require_connect() -> Result<()> {
        let mut source = SyntheticSource::new(SourceConfig::default())?;
        assert!(source.next_frame().is_err());
        assert!(!source.is_healthy());
        Ok(())
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let config = SourceConfig {
            width: 70_000,
            height: 70_000,
            ..SourceConfig::default()
        };
        let err = SyntheticSource::new(config).err().expect("oversized frame rejected");
        assert!(err.to_string().contains("exceeds"));

        let widest = SourceConfig {
            width: MAX_FRAME_DIMENSION,
            height: 1,
            ..SourceConfig::default()
        };
        assert!(SyntheticSource::new(widest).is_ok());
    }

    #[test]
    fn zero_size_is_rejected() {
        let config = SourceConfig {
            width: 0,
            ..SourceConfig::default()
        };
        assert!(SyntheticSource::new(config).is_err());
    }
}
