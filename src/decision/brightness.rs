use crate::frame::RgbFrame;

/// Frames darker than this (0-255 scale) ask for the torch.
pub const LOW_LIGHT_THRESHOLD: u32 = 20;

/// Average brightness over every pixel: mean of `(r + g + b) / 3`, integer arithmetic.
///
/// `None` for an empty frame.
pub fn average_brightness(frame: &RgbFrame) -> Option<u32> {
    if frame.is_empty() {
        return None;
    }
    let pixels = frame.pixels();
    let count = (pixels.len() / 3) as u64;
    let sum: u64 = pixels
        .chunks_exact(3)
        .map(|px| (px[0] as u64 + px[1] as u64 + px[2] as u64) / 3)
        .sum();
    Some((sum / count) as u32)
}

/// The heuristic only ever turns the torch on.
pub fn needs_torch(brightness: u32, torch_on: bool) -> bool {
    brightness < LOW_LIGHT_THRESHOLD && !torch_on
}
