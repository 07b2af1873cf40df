// projection.rs — view state → blit instructions (pure geometry, no drawing)
//
// The source is treated as a horizontal strip that wraps around. One third of
// its width is visible at a time; yaw picks where that third starts. When the
// window crosses the right edge it is split into two blits that meet exactly
// at the seam.

use crate::hotspot::{Hotspot, HotspotCategory, Pulse};
use crate::view_state::ViewState;
use glam::DVec2;
use std::time::Duration;

/// The visible slice is this many times narrower than the source.
pub const FIELD_OF_VIEW_DIVISOR: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_vec(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub size: DVec2,
}

impl Rect {
    pub fn new(min: DVec2, size: DVec2) -> Self {
        Self { min, size }
    }

    pub fn max(&self) -> DVec2 {
        self.min + self.size
    }
}

/// Copy `src` (source pixels) into `dst` (output pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blit {
    pub src: Rect,
    pub dst: Rect,
}

/// A horizontal run of source columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceSegment {
    pub start: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotspotMarker {
    pub center: DVec2,
    pub radius: f64,
    pub label: String,
    pub category: HotspotCategory,
}

/// Start column and width of the visible slice.
pub fn slice_window(normalized_yaw: f64, source_width: f64) -> (f64, f64) {
    let width = source_width / FIELD_OF_VIEW_DIVISOR;
    let offset = (normalized_yaw / 360.0) * source_width;
    (offset, width)
}

/// Splits a window that may run past the right edge into at most two segments.
///
/// `offset` is reduced modulo `source_width`, so an offset of exactly the
/// width starts at column 0. The widths always sum to `slice_width`.
pub fn slice_segments(offset: f64, slice_width: f64, source_width: f64) -> Vec<SliceSegment> {
    if source_width <= 0.0 || slice_width <= 0.0 {
        return Vec::new();
    }
    let mut start = offset.rem_euclid(source_width);
    if start >= source_width {
        start = 0.0;
    }

    let end = start + slice_width;
    if end <= source_width {
        return vec![SliceSegment {
            start,
            width: slice_width,
        }];
    }

    let head = source_width - start;
    let overflow = slice_width - head;
    vec![
        SliceSegment { start, width: head },
        SliceSegment {
            start: 0.0,
            width: overflow,
        },
    ]
}

/// Computes the blits for one frame.
///
/// The full slice is stretched over the output rectangle scaled by zoom about
/// its midpoint. Pitch is not reprojected.
pub fn project(view: &ViewState, image: ImageSize, output: OutputSize) -> Vec<Blit> {
    if output.is_empty() || image.width == 0 || image.height == 0 {
        return Vec::new();
    }

    let source_width = image.width as f64;
    let source_height = image.height as f64;
    let (offset, slice_width) = slice_window(view.normalized_yaw(), source_width);

    let out = output.as_vec();
    let scaled = out * view.zoom();
    let dst_origin = (out - scaled) * 0.5;

    let mut blits = Vec::with_capacity(2);
    let mut cursor = 0.0;
    for seg in slice_segments(offset, slice_width, source_width) {
        let dst_width = scaled.x * (seg.width / slice_width);
        blits.push(Blit {
            src: Rect::new(DVec2::new(seg.start, 0.0), DVec2::new(seg.width, source_height)),
            dst: Rect::new(
                DVec2::new(dst_origin.x + cursor, dst_origin.y),
                DVec2::new(dst_width, scaled.y),
            ),
        });
        cursor += dst_width;
    }
    blits
}

/// Places hotspots on the output surface at time `t`. Zoom does not move them.
pub fn place_hotspots(
    hotspots: &[Hotspot],
    pulse: &Pulse,
    output: OutputSize,
    t: Duration,
) -> Vec<HotspotMarker> {
    if output.is_empty() {
        return Vec::new();
    }
    let out = output.as_vec();
    let radius = pulse.radius_at(t);
    hotspots
        .iter()
        .map(|h| HotspotMarker {
            center: DVec2::new(h.x, h.y) * out,
            radius,
            label: h.label.clone(),
            category: h.category,
        })
        .collect()
}
