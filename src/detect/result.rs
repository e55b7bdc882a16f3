use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::frame::PixelRect;

/// Raw detector output: three parallel arrays over `N` candidate slots.
///
/// - `locations`: 4 floats per slot (top, left, bottom, right) as fractions of the frame
/// - `classes`: float-encoded class index per slot
/// - `scores`: confidence per slot
///
/// No ordering across slots is assumed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorOutput {
    pub locations: Vec<f32>,
    pub classes: Vec<f32>,
    pub scores: Vec<f32>,
}

impl DetectorOutput {
    /// Number of candidate slots.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let slots = self.scores.len();
        if self.classes.len() != slots {
            return Err(anyhow!(
                "detector output mismatch: {} scores, {} classes",
                slots,
                self.classes.len()
            ));
        }
        if self.locations.len() != slots * 4 {
            return Err(anyhow!(
                "detector output mismatch: {} scores, {} location values (want {})",
                slots,
                self.locations.len(),
                slots * 4
            ));
        }
        Ok(())
    }

    /// Per-slot view of the parallel arrays.
    pub fn detections(&self) -> Result<Vec<Detection>> {
        self.validate()?;
        Ok(self
            .scores
            .iter()
            .zip(&self.classes)
            .zip(self.locations.chunks_exact(4))
            .enumerate()
            .map(|(slot, ((&score, &class_index), loc))| Detection {
                slot,
                bbox: BoundingBox {
                    top: loc[0],
                    left: loc[1],
                    bottom: loc[2],
                    right: loc[3],
                },
                class_index,
                score,
            })
            .collect())
    }
}

/// One candidate slot of a detector output. Lives for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Index into the detector's candidate arrays.
    pub slot: usize,
    pub bbox: BoundingBox,
    pub class_index: f32,
    pub score: f32,
}

/// Bounding box in fractions of the frame extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl BoundingBox {
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelBox {
        let w = width as f32;
        let h = height as f32;
        PixelBox {
            top: self.top * h,
            left: self.left * w,
            bottom: self.bottom * h,
            right: self.right * w,
        }
    }
}

/// Bounding box in absolute (fractional) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelBox {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl PixelBox {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Integer crop rectangle: origin and extent truncated toward zero, then clipped to
    /// the frame. `None` when nothing of the box remains.
    pub fn crop_rect(&self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        let (x, width) = clip_span(self.left, self.width(), frame_width)?;
        let (y, height) = clip_span(self.top, self.height(), frame_height)?;
        Some(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

fn clip_span(origin: f32, extent: f32, limit: u32) -> Option<(u32, u32)> {
    if !origin.is_finite() || !extent.is_finite() {
        return None;
    }
    let start = origin as i64;
    let end = start + extent as i64;
    let start = start.clamp(0, limit as i64);
    let end = end.clamp(0, limit as i64);
    if end <= start {
        return None;
    }
    Some((start as u32, (end - start) as u32))
}

/// Binary traffic light verdict. There is no yellow or unknown state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightColor {
    Red,
    Green,
}

impl LightColor {
    /// Classifier decision threshold on the sigmoid output.
    pub const RED_THRESHOLD: f32 = 0.5;

    pub fn from_score(score: f32) -> Self {
        if score > Self::RED_THRESHOLD {
            LightColor::Red
        } else {
            LightColor::Green
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LightColor::Red => "Red",
            LightColor::Green => "Green",
        }
    }
}
