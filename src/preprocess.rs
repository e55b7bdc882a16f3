//! Frame preprocessing for the two models.
//!
//! The detector takes a 300x300 RGB u8 image; the traffic light classifier takes a
//! 64x64 RGB image as floats normalized to [0, 1], channels interleaved per pixel.
//! Both are produced with bilinear resampling.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::frame::RgbFrame;

pub const DETECTOR_INPUT_SIZE: u32 = 300;
pub const CLASSIFIER_INPUT_SIZE: u32 = 64;

/// Detector tensor: packed RGB u8, NHWC with N = 1.
#[derive(Clone, Debug)]
pub struct DetectorInput {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl DetectorInput {
    /// All-black input of the detector shape, used to warm a backend up.
    pub fn blank() -> Self {
        let side = DETECTOR_INPUT_SIZE as usize;
        Self {
            width: DETECTOR_INPUT_SIZE,
            height: DETECTOR_INPUT_SIZE,
            data: vec![0; side * side * 3],
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// Classifier tensor: `size * size * 3` floats in [0, 1].
#[derive(Clone, Debug)]
pub struct ClassifierInput {
    pub size: u32,
    data: Vec<f32>,
}

impl ClassifierInput {
    pub fn values(&self) -> &[f32] {
        &self.data
    }
}

/// Resize a full frame to the detector input shape.
pub fn detector_input(frame: &RgbFrame) -> Result<DetectorInput> {
    let resized = resize_bilinear(frame, DETECTOR_INPUT_SIZE, DETECTOR_INPUT_SIZE)?;
    Ok(DetectorInput {
        width: DETECTOR_INPUT_SIZE,
        height: DETECTOR_INPUT_SIZE,
        data: resized.into_raw(),
    })
}

/// Resize a traffic light crop to the classifier input shape and normalize it.
pub fn classifier_input(crop: &RgbFrame) -> Result<ClassifierInput> {
    let resized = resize_bilinear(crop, CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE)?;
    let data = resized
        .as_raw()
        .iter()
        .map(|&channel| channel as f32 / 255.0)
        .collect();
    Ok(ClassifierInput {
        size: CLASSIFIER_INPUT_SIZE,
        data,
    })
}

fn resize_bilinear(frame: &RgbFrame, width: u32, height: u32) -> Result<RgbImage> {
    if frame.is_empty() {
        return Err(anyhow!("cannot resize an empty frame"));
    }
    let source = RgbImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
    if source.dimensions() == (width, height) {
        return Ok(source);
    }
    Ok(imageops::resize(&source, width, height, FilterType::Triangle))
}
