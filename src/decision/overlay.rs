use ab_glyph::{FontRef, PxScale};
use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detect::PixelBox;
use crate::frame::RgbFrame;

/// DejaVu Sans, see `assets/fonts/LICENSE-DejaVu.txt`.
const CAPTION_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Fixed overlay palette, picked by candidate slot.
pub const PALETTE: [[u8; 3]; 10] = [
    [0x00, 0x00, 0xFF], // blue
    [0x00, 0xFF, 0x00], // green
    [0xFF, 0x00, 0x00], // red
    [0x00, 0xFF, 0xFF], // cyan
    [0x88, 0x88, 0x88], // gray
    [0x00, 0x00, 0x00], // black
    [0x44, 0x44, 0x44], // dark gray
    [0xFF, 0x00, 0xFF], // magenta
    [0xFF, 0xFF, 0x00], // yellow
    [0xFF, 0x00, 0x00], // red
];

/// One drawn detection: outline colour, box, and the caption anchored at its top-left.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayBox {
    pub slot: usize,
    pub label: String,
    pub bbox: PixelBox,
    pub color: [u8; 3],
    pub caption: String,
}

impl OverlayBox {
    pub fn new(slot: usize, label: &str, score: f32, bbox: PixelBox) -> Self {
        Self {
            slot,
            label: label.to_string(),
            bbox,
            color: palette_color(slot),
            caption: caption(label, score),
        }
    }
}

pub fn palette_color(slot: usize) -> [u8; 3] {
    PALETTE[slot % PALETTE.len()]
}

/// "{label} {score as whole percent}%".
pub fn caption(label: &str, score: f32) -> String {
    format!("{} {}%", label, (score * 100.0).round() as i32)
}

/// Outline thickness scales with frame height.
pub fn stroke_width(frame_height: u32) -> u32 {
    (frame_height / 85).max(1)
}

/// Caption glyph height in pixels, also scaled by frame height.
pub fn caption_scale(frame_height: u32) -> f32 {
    (frame_height as f32 / 15.0).max(1.0)
}

/// Draw each box outline with its caption above the top-left corner onto a copy of
/// `frame`.
pub fn render(frame: &RgbFrame, boxes: &[OverlayBox]) -> Result<RgbFrame> {
    let mut canvas = RgbImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
    let font = FontRef::try_from_slice(CAPTION_FONT)
        .map_err(|e| anyhow!("bundled caption font is invalid: {}", e))?;
    let stroke = stroke_width(frame.height) as i32;
    let scale = PxScale::from(caption_scale(frame.height));

    for overlay in boxes {
        let Some((left, top, right, bottom)) =
            outline_bounds(&overlay.bbox, frame.width, frame.height, stroke)
        else {
            continue;
        };
        let color = Rgb(overlay.color);

        let (_, text_height) = text_size(scale, &font, &overlay.caption);
        let caption_y = (top - text_height as i32).max(0);
        draw_text_mut(
            &mut canvas,
            color,
            left.max(0),
            caption_y,
            scale,
            &font,
            &overlay.caption,
        );

        for inset in 0..stroke {
            let width = right - left - 2 * inset;
            let height = bottom - top - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at(left + inset, top + inset).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    let rendered = RgbFrame::new(canvas.into_raw(), frame.width, frame.height)?;
    Ok(rendered.with_sequence(frame.sequence))
}

/// Whole-pixel box edges, clamped to just outside the frame so off-screen edges stay
/// off-screen. `None` for non-finite or inverted boxes.
fn outline_bounds(
    bbox: &PixelBox,
    frame_width: u32,
    frame_height: u32,
    stroke: i32,
) -> Option<(i32, i32, i32, i32)> {
    let edges = [bbox.left, bbox.top, bbox.right, bbox.bottom];
    if edges.iter().any(|edge| !edge.is_finite()) {
        return None;
    }
    let margin = stroke as i64;
    let clamp = |value: f32, extent: u32| (value as i64).clamp(-margin, extent as i64 + margin) as i32;
    let (left, right) = (clamp(bbox.left, frame_width), clamp(bbox.right, frame_width));
    let (top, bottom) = (clamp(bbox.top, frame_height), clamp(bbox.bottom, frame_height));
    (right > left && bottom > top).then_some((left, top, right, bottom))
}
