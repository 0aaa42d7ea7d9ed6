//! Decoded frames and the single-slot handoff buffer
//!
//! The streaming thread offers frames; the render thread pulls them with a
//! zero timeout once per tick. The slot holds exactly one frame: an
//! unconsumed frame is displaced by the newest and counted as dropped.
//! Bounded latency beats completeness for UI-composed playback.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Pixel layout of a decoded frame, driving shader selection at upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Packed RGBA, one plane
    Rgba,
    /// Planar YUV 4:2:0, three planes (Y, U, V)
    I420,
    /// Semi-planar YUV 4:2:0, two planes (Y, interleaved UV)
    Nv12,
}

impl PixelLayout {
    /// Number of planes this layout carries.
    pub fn plane_count(self) -> usize {
        match self {
            PixelLayout::Rgba => 1,
            PixelLayout::I420 => 3,
            PixelLayout::Nv12 => 2,
        }
    }
}

/// One decoded video frame with per-plane data and strides
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Plane layout
    pub layout: PixelLayout,
    /// Plane data, `layout.plane_count()` entries
    pub planes: Vec<Vec<u8>>,
    /// Bytes per row for each plane
    pub strides: Vec<usize>,
    /// Presentation timestamp
    pub pts: Duration,
}

impl VideoFrame {
    /// Structural sanity check: plane and stride counts match the layout.
    pub fn is_well_formed(&self) -> bool {
        self.planes.len() == self.layout.plane_count()
            && self.strides.len() == self.layout.plane_count()
            && self.width > 0
            && self.height > 0
    }
}

/// Single-slot frame buffer between the decode worker and the main thread
#[derive(Default)]
pub struct FrameSlot {
    slot: Mutex<Option<VideoFrame>>,
    dropped: AtomicU64,
}

impl FrameSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a frame from the decode side. If the previous frame was never
    /// consumed it is displaced and counted as dropped.
    pub fn offer(&self, frame: VideoFrame) {
        let mut slot = self.slot.lock();
        if slot.replace(frame).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the newest frame, if any. Never blocks.
    pub fn take(&self) -> Option<VideoFrame> {
        self.slot.lock().take()
    }

    /// Discard anything pending (used by stop and flush-seeks).
    pub fn clear(&self) {
        self.slot.lock().take();
    }

    /// Number of frames displaced without being rendered.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pts_ms: u64) -> VideoFrame {
        VideoFrame {
            width: 2,
            height: 2,
            layout: PixelLayout::Rgba,
            planes: vec![vec![0u8; 16]],
            strides: vec![8],
            pts: Duration::from_millis(pts_ms),
        }
    }

    #[test]
    fn take_returns_newest_and_empties() {
        let slot = FrameSlot::new();
        slot.offer(frame(1));
        slot.offer(frame(2));
        let got = slot.take().unwrap();
        assert_eq!(got.pts, Duration::from_millis(2));
        assert!(slot.take().is_none());
    }

    #[test]
    fn displaced_frames_are_counted() {
        let slot = FrameSlot::new();
        slot.offer(frame(1));
        slot.offer(frame(2));
        slot.offer(frame(3));
        assert_eq!(slot.dropped(), 2);
        slot.take();
        slot.offer(frame(4));
        assert_eq!(slot.dropped(), 2);
    }

    #[test]
    fn clear_discards_pending() {
        let slot = FrameSlot::new();
        slot.offer(frame(1));
        slot.clear();
        assert!(slot.take().is_none());
    }

    #[test]
    fn layout_plane_counts() {
        assert_eq!(PixelLayout::Rgba.plane_count(), 1);
        assert_eq!(PixelLayout::Nv12.plane_count(), 2);
        assert_eq!(PixelLayout::I420.plane_count(), 3);
    }

    #[test]
    fn well_formedness_checks_plane_count() {
        let mut f = frame(0);
        assert!(f.is_well_formed());
        f.layout = PixelLayout::I420;
        assert!(!f.is_well_formed());
    }
}
