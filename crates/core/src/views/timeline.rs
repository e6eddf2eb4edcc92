use serde::{Deserialize, Serialize};

use crate::model::{Frame, FrameHistory};

use super::viewport::Viewport;

/// Pixel height of one depth row within a timeline track.
pub const ROW_PIXEL_HEIGHT: f64 = 16.0;

/// Depth rows shown per track unless the user adjusts it.
pub const DEFAULT_DEPTH_LIMIT: u32 = 4;

/// One sample within one visible frame, addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRef {
    pub frame_index: usize,
    pub sample_index: usize,
}

/// A picked sample: which row, which frame in its history, which sample,
/// at which display depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub row: String,
    pub frame_index: usize,
    pub sample_index: usize,
    pub depth: u32,
}

/// Windowing and hit-testing state for one timeline track (one thread or
/// processor).
///
/// The row never owns frame data; the session does. It keeps the thread key,
/// a rolling "first possibly visible frame" index, the display depth limit,
/// and a clone of the last time range it was windowed against, decoupled
/// from live viewport mutation so a row's visible set stays coherent until
/// the next windowing pass.
///
/// The rolling index is a lower bound on where the visible window can start,
/// maintained incrementally as the window slides, and clamped whenever the
/// history has shrunk or been trimmed underneath it.
#[derive(Debug)]
pub struct TimelineRow {
    name: String,
    first_visible: usize,
    visible_end: usize,
    depth_limit: u32,
    last_range: Option<Viewport>,
}

impl TimelineRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            first_visible: 0,
            visible_end: 0,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            last_range: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth_limit(&self) -> u32 {
        self.depth_limit
    }

    /// Display depth is at least 1; anything lower is clamped up.
    pub fn set_depth_limit(&mut self, limit: u32) {
        self.depth_limit = limit.max(1);
    }

    /// The time range of the last windowing pass.
    pub fn time_range(&self) -> Option<&Viewport> {
        self.last_range.as_ref()
    }

    /// Recompute which frames fall inside `range`.
    ///
    /// Slides the rolling index backward while the range starts before the
    /// candidate frame, forward past frames that end before the range, then
    /// extends the window over every frame starting no later than the range
    /// end.
    pub fn set_visible_frames(&mut self, range: &Viewport, history: &FrameHistory) {
        self.last_range = Some(range.clone());

        let len = history.len();
        if len == 0 {
            self.first_visible = 0;
            self.visible_end = 0;
            return;
        }

        let mut first = self.first_visible.min(len - 1);
        while first > 0 {
            let Some(frame) = history.get(first) else {
                break;
            };
            if range.start_us() >= frame.start_us {
                break;
            }
            first -= 1;
        }
        while let Some(frame) = history.get(first) {
            if frame.end_us >= range.start_us() {
                break;
            }
            first += 1;
        }
        self.first_visible = first;

        let mut end = first;
        while let Some(frame) = history.get(end) {
            if frame.start_us > range.end_us() {
                break;
            }
            end += 1;
        }
        self.visible_end = end;
    }

    /// Frames selected by the last windowing pass, clamped to the current
    /// history length.
    pub fn visible_frames<'h>(&self, history: &'h FrameHistory) -> &'h [Frame] {
        let len = history.len();
        let first = self.first_visible.min(len);
        let end = self.visible_end.min(len);
        &history.frames()[first..end.max(first)]
    }

    /// Visible samples bucketed by display depth: index 0 holds depth-1
    /// samples, up to the depth limit. Samples nested deeper than the limit
    /// are discarded.
    pub fn visible_samples_by_depth(&self, history: &FrameHistory) -> Vec<Vec<SampleRef>> {
        let mut rows: Vec<Vec<SampleRef>> = vec![Vec::new(); self.depth_limit as usize];
        let len = history.len();
        let first = self.first_visible.min(len);
        let end = self.visible_end.min(len);
        for frame_index in first..end {
            let Some(frame) = history.get(frame_index) else {
                break;
            };
            for (sample_index, sample) in frame.samples().iter().enumerate() {
                let depth = u32::from(sample.depth) + 1;
                if depth <= self.depth_limit {
                    rows[depth as usize - 1].push(SampleRef {
                        frame_index,
                        sample_index,
                    });
                }
            }
        }
        rows
    }

    /// Pick the sample under a cursor position.
    ///
    /// The target depth comes from the vertical position, clamped to the
    /// depth limit. Frame containment is closed on both ends, so a frame
    /// rendered at the minimum one-pixel width stays pickable; sample
    /// containment is half-open, so adjacent samples never both claim their
    /// shared boundary.
    pub fn sample_at_position(
        &self,
        history: &FrameHistory,
        time_us: f64,
        mouse_y: f64,
    ) -> Option<Selection> {
        let row = (mouse_y / ROW_PIXEL_HEIGHT).floor().max(0.0) as u32;
        let target_depth = (row + 1).min(self.depth_limit);

        let len = history.len();
        let first = self.first_visible.min(len);
        let end = self.visible_end.min(len);
        let frame_index = (first..end).find(|&i| {
            history
                .get(i)
                .is_some_and(|frame| frame.contains_us(time_us))
        })?;
        let frame = history.get(frame_index)?;

        for (sample_index, sample) in frame.samples().iter().enumerate() {
            if u32::from(sample.depth) + 1 != target_depth {
                continue;
            }
            if time_us >= sample.start_us() && time_us < sample.end_us() {
                return Some(Selection {
                    row: self.name.clone(),
                    frame_index,
                    sample_index,
                    depth: target_depth,
                });
            }
        }
        None
    }
}
