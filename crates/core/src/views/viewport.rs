use serde::{Deserialize, Serialize};

/// The visible time window mapped onto a fixed pixel width.
///
/// Invariants, restored after every mutation: `end_us == start_us + span_us`
/// and `px_per_us == span_px / span_us`, with `span_us > 0`. Cloning takes an
/// independent snapshot; consumers that must stay time-stable across an
/// update boundary clone rather than hold a live reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    start_us: f64,
    span_us: f64,
    span_px: f64,
    px_per_us: f64,
}

impl Viewport {
    /// `span_us` must be positive.
    pub fn new(start_us: f64, span_us: f64, span_px: f64) -> Self {
        let mut viewport = Self {
            start_us,
            span_us,
            span_px,
            px_per_us: 0.0,
        };
        viewport.update();
        viewport
    }

    fn update(&mut self) {
        debug_assert!(self.span_us > 0.0);
        self.px_per_us = self.span_px / self.span_us;
    }

    pub fn set(&mut self, start_us: f64, span_us: f64) {
        self.start_us = start_us;
        self.span_us = span_us;
        self.update();
    }

    /// Move the window, keeping its span.
    pub fn set_start(&mut self, start_us: f64) {
        self.start_us = start_us;
    }

    /// Position the window so it ends at `end_us`, keeping its span.
    pub fn set_end(&mut self, end_us: f64) {
        self.start_us = end_us - self.span_us;
    }

    pub fn set_pixel_span(&mut self, span_px: f64) {
        self.span_px = span_px;
        self.update();
    }

    pub fn start_us(&self) -> f64 {
        self.start_us
    }

    pub fn end_us(&self) -> f64 {
        self.start_us + self.span_us
    }

    pub fn span_us(&self) -> f64 {
        self.span_us
    }

    pub fn span_px(&self) -> f64 {
        self.span_px
    }

    pub fn px_per_us(&self) -> f64 {
        self.px_per_us
    }

    /// Pixel column of an absolute time.
    pub fn pixel_offset(&self, time_us: f64) -> i64 {
        ((time_us - self.start_us) * self.px_per_us).floor() as i64
    }

    /// Width in pixels of a duration.
    pub fn pixel_size(&self, duration_us: f64) -> i64 {
        (duration_us * self.px_per_us).floor() as i64
    }

    /// Absolute time at a pixel column.
    pub fn time_at(&self, px: f64) -> f64 {
        self.start_us + px / self.px_per_us
    }

    /// Scale the window about an anchor time, so the time under the cursor
    /// stays under the cursor. `scale` must be positive; > 1 zooms out.
    pub fn zoom_at(&mut self, anchor_us: f64, scale: f64) {
        self.start_us = (self.start_us - anchor_us) * scale + anchor_us;
        self.span_us *= scale;
        self.update();
    }

    /// Shift the window by a pixel delta, converted through the current
    /// scale.
    pub fn pan_px(&mut self, delta_px: f64) {
        self.start_us += delta_px / self.px_per_us;
    }
}
