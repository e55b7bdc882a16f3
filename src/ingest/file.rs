//! Local image directory source.
//!
//! Replays still images (`.jpg`, `.jpeg`, `.png`) from a local directory in file name
//! order, decoding each into an `RgbFrame`. Useful for running the pipeline over
//! captured footage without a camera.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use super::{SourceConfig, SourceStats};
use crate::frame::RgbFrame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub(crate) struct ImageDirSource {
    config: SourceConfig,
    files: Vec<PathBuf>,
    next_index: usize,
    frame_count: u64,
    connected: bool,
}

impl ImageDirSource {
    pub(crate) fn new(config: SourceConfig) -> Self {
        Self {
            config,
            files: Vec::new(),
            next_index: 0,
            frame_count: 0,
            connected: false,
        }
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        let dir = Path::new(&self.config.url);
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to open image directory {}", dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(anyhow!("no images found in {}", dir.display()));
        }
        files.sort();
        log::info!(
            "FrameSource: connected to {} ({} images)",
            dir.display(),
            files.len()
        );
        self.files = files;
        self.next_index = 0;
        self.connected = true;
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<RgbFrame>> {
        if !self.connected {
            return Err(anyhow!("image directory {} not connected", self.config.url));
        }
        let Some(path) = self.files.get(self.next_index) else {
            return Ok(None);
        };
        self.next_index += 1;
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        self.frame_count += 1;
        let frame = RgbFrame::new(image.into_raw(), width, height)?;
        Ok(Some(frame.with_sequence(self.frame_count)))
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

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn source_for(dir: &Path) -> ImageDirSource {
        ImageDirSource::new(SourceConfig {
            url: dir.display().to_string(),
            ..SourceConfig::default()
        })
    }

    #[test]
    fn replays_images_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::from_pixel(4, 3, Rgb([200, 0, 0])).save(dir.path().join("b.png"))?;
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 200])).save(dir.path().join("a.png"))?;
        std::fs::write(dir.path().join("notes.txt"), "not an image")?;

        let mut source = source_for(dir.path());
        source.connect()?;

        let first = source.next_frame()?.expect("first image");
        assert_eq!((first.width, first.height), (2, 2));
        assert_eq!(first.pixel(0, 0), Some([0, 0, 200]));

        let second = source.next_frame()?.expect("second image");
        assert_eq!((second.width, second.height), (4, 3));
        assert_eq!(second.sequence, 2);

        assert!(source.next_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn empty_directory_fails_to_connect() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut source = source_for(dir.path());
        assert!(source.connect().is_err());
        assert!(!source.is_healthy());
        Ok(())
    }
}
