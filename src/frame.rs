//! Frame containers.
//!
//! - `RgbFrame`: Owned RGB24 pixels with dimensions. Produced by ingestion, consumed by
//!   the frame worker, discarded after the overlay render.
//! - `PixelRect`: Integer crop rectangle in frame pixels.
//! - `FrameSlot`: Depth-1 mailbox between a frame source and the frame worker.
//!
//! The slot never queues. Publishing while a frame is still pending replaces it, so the
//! worker always picks up the most recent frame and stale frames are dropped.

use anyhow::{anyhow, Result};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

// ----------------------------------------------------------------------------
// RgbFrame
// ----------------------------------------------------------------------------

/// One camera frame as packed RGB24 (`width * height * 3` bytes, row-major).
#[derive(Clone)]
pub struct RgbFrame {
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Position in the source stream (1-based, 0 when unknown).
    pub sequence: u64,

    captured_at: Instant,
}

impl RgbFrame {
    /// Wrap packed RGB bytes. Fails when the buffer length does not match the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence: 0,
            captured_at: Instant::now(),
        })
    }

    /// Frame filled with a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixel_count * 3);
        for _ in 0..pixel_count {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// A frame with no usable pixels is treated as a missing frame by the pipeline.
    /// That includes a frame whose dimensions were changed after construction and no
    /// longer match its buffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0
            || self.height == 0
            || rgb_len(self.width, self.height).map_or(true, |len| len != self.data.len())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if let Some(offset) = self.offset(x, y) {
            self.data[offset..offset + 3].copy_from_slice(&rgb);
        }
    }

    /// Time since the frame was captured.
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    /// Copy out the pixels under `rect`. Returns `None` when the rectangle has no area
    /// or lies outside the frame.
    pub fn crop(&self, rect: PixelRect) -> Option<RgbFrame> {
        if rect.is_empty() || rect.right() > self.width || rect.bottom() > self.height {
            return None;
        }
        let row_bytes = rect.width as usize * 3;
        let mut data = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.bottom() {
            let start = self.offset(rect.x, y)?;
            data.extend_from_slice(self.data.get(start..start + row_bytes)?);
        }
        Some(RgbFrame {
            data,
            width: rect.width,
            height: rect.height,
            sequence: self.sequence,
            captured_at: self.captured_at,
        })
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?
            .checked_mul(3)?;
        (offset + 3 <= self.data.len()).then_some(offset)
    }
}

impl std::fmt::Debug for RgbFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("RGB frame dimensions overflow"))
}

// ----------------------------------------------------------------------------
// PixelRect
// ----------------------------------------------------------------------------

/// Axis-aligned rectangle in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ----------------------------------------------------------------------------
// FrameSlot: latest-frame-wins handoff
// ----------------------------------------------------------------------------

/// Counters kept by a `FrameSlot`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub published: u64,
    pub delivered: u64,
    /// Frames replaced before the worker took them.
    pub dropped: u64,
}

#[derive(Default)]
struct SlotState {
    pending: Option<RgbFrame>,
    closed: bool,
    stats: SlotStats,
}

/// Single-consumer mailbox of depth one.
///
/// Producers call `publish`, the frame worker blocks in `take`. Once closed, `take`
/// hands out the frame still pending (if any) and then returns `None`.
#[derive(Default)]
pub struct FrameSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a frame to the worker. Returns `true` when a pending frame was replaced.
    pub fn publish(&self, frame: RgbFrame) -> Result<bool> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(anyhow!("frame slot is closed"));
        }
        state.stats.published += 1;
        let replaced = state.pending.replace(frame).is_some();
        if replaced {
            state.stats.dropped += 1;
        }
        drop(state);
        self.ready.notify_one();
        Ok(replaced)
    }

    /// Block until a frame is available. `None` once the slot is closed and drained.
    pub fn take(&self) -> Result<Option<RgbFrame>> {
        let mut state = self.lock()?;
        loop {
            if let Some(frame) = state.pending.take() {
                state.stats.delivered += 1;
                return Ok(Some(frame));
            }
            if state.closed {
                return Ok(None);
            }
            state = self
                .ready
                .wait(state)
                .map_err(|_| anyhow!("frame slot lock poisoned"))?;
        }
    }

    /// Stop accepting frames and wake the worker.
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|state| state.closed).unwrap_or(true)
    }

    pub fn stats(&self) -> SlotStats {
        self.state
            .lock()
            .map(|state| state.stats)
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, SlotState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("frame slot lock poisoned"))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn numbered_frame(sequence: u64) -> RgbFrame {
        RgbFrame::filled(4, 4, [sequence as u8, 0, 0]).with_sequence(sequence)
    }

    #[test]
    fn new_rejects_length_mismatch() {
        assert!(RgbFrame::new(vec![0u8; 11], 2, 2).is_err());
        assert!(RgbFrame::new(vec![0u8; 12], 2, 2).is_ok());
    }

    #[test]
    fn crop_copies_rows() -> Result<()> {
        let mut data = Vec::new();
        for i in 0..16u8 {
            data.extend_from_slice(&[i, i, i]);
        }
        let frame = RgbFrame::new(data, 4, 4)?;
        let crop = frame
            .crop(PixelRect {
                x: 1,
                y: 2,
                width: 2,
                height: 2,
            })
            .expect("crop inside frame");

        assert_eq!(crop.width, 2);
        assert_eq!(crop.height, 2);
        assert_eq!(crop.pixel(0, 0), Some([9, 9, 9]));
        assert_eq!(crop.pixel(1, 1), Some([14, 14, 14]));
        Ok(())
    }

    #[test]
    fn crop_rejects_empty_or_outside() {
        let frame = RgbFrame::filled(4, 4, [1, 2, 3]);
        let empty = PixelRect {
            x: 0,
            y: 0,
            width: 0,
            height: 3,
        };
        let outside = PixelRect {
            x: 3,
            y: 0,
            width: 2,
            height: 2,
        };
        assert!(frame.crop(empty).is_none());
        assert!(frame.crop(outside).is_none());
    }

    #[test]
    fn resized_dimensions_do_not_index_past_buffer() {
        let mut frame = RgbFrame::filled(4, 4, [9, 9, 9]);
        frame.width = 40;
        frame.height = 40;

        assert!(frame.is_empty());
        assert_eq!(frame.pixel(30, 30), None);
        frame.put_pixel(30, 30, [1, 1, 1]);
        assert!(frame
            .crop(PixelRect {
                x: 20,
                y: 20,
                width: 10,
                height: 10,
            })
            .is_none());
        // Pixels still inside the real buffer stay readable.
        assert_eq!(frame.pixel(1, 0), Some([9, 9, 9]));
    }

    #[test]
    fn slot_keeps_only_latest_frame() -> Result<()> {
        let slot = FrameSlot::new();
        assert!(!slot.publish(numbered_frame(1))?);
        assert!(slot.publish(numbered_frame(2))?);
        assert!(slot.publish(numbered_frame(3))?);

        let frame = slot.take()?.expect("pending frame");
        assert_eq!(frame.sequence, 3);

        let stats = slot.stats();
        assert_eq!(stats.published, 3);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped, 2);
        Ok(())
    }

    #[test]
    fn closed_slot_drains_then_ends() -> Result<()> {
        let slot = FrameSlot::new();
        slot.publish(numbered_frame(7))?;
        slot.close();

        assert!(slot.publish(numbered_frame(8)).is_err());
        assert_eq!(slot.take()?.map(|f| f.sequence), Some(7));
        assert!(slot.take()?.is_none());
        Ok(())
    }

    #[test]
    fn take_wakes_on_publish_from_other_thread() -> Result<()> {
        let slot = Arc::new(FrameSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.publish(numbered_frame(5)))
        };
        let frame = slot.take()?.expect("frame from producer");
        assert_eq!(frame.sequence, 5);
        producer.join().expect("producer thread")?;
        Ok(())
    }
}
