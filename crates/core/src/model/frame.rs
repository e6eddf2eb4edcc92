use serde::{Deserialize, Serialize};

use super::sample::{FLOATS_PER_SAMPLE, SampleRecord};

/// Default cap on retained frames per thread or processor.
pub const DEFAULT_FRAME_CAP: usize = 10_000;

/// Continuity bookkeeping carried by frames synthesized from processor
/// occupancy snapshots, so a later snapshot of the same thread can extend the
/// busy span in place instead of opening a new frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSpan {
    pub thread_id: u32,
    /// Index of the snapshot message that most recently touched this frame.
    pub message_index: u64,
    /// Time of that snapshot, µs. Elapsed time on the next contiguous
    /// snapshot is measured from here.
    pub last_start_us: u64,
}

/// One snapshot of a thread's (or processor's) samples from a single message.
///
/// Never empty: a message with zero samples produces no frame at all.
/// Timing derives from the samples at decode: start of the first, end of the
/// last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    samples: Vec<SampleRecord>,
    /// Incomplete tree, expected to be superseded by the next frame for the
    /// same thread.
    pub partial: bool,
    pub start_us: f64,
    pub end_us: f64,
    pub processor: Option<ProcessorSpan>,
}

impl Frame {
    pub fn new(samples: Vec<SampleRecord>, partial: bool, start_us: f64, end_us: f64) -> Self {
        debug_assert!(!samples.is_empty());
        Self {
            samples,
            partial,
            start_us,
            end_us,
            processor: None,
        }
    }

    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [SampleRecord] {
        &mut self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_us(&self) -> f64 {
        self.end_us - self.start_us
    }

    /// Closed-interval containment. Closed on both ends so that a frame
    /// rendered at the enforced minimum one-pixel width stays selectable even
    /// when its true duration underflows a pixel.
    pub fn contains_us(&self, time_us: f64) -> bool {
        time_us >= self.start_us && time_us <= self.end_us
    }

    /// Flat float buffer of every sample's converted fields, renderer-ready.
    pub fn float_buffer(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.samples.len() * FLOATS_PER_SAMPLE);
        for sample in &self.samples {
            out.extend_from_slice(&sample.floats());
        }
        out
    }
}

/// Bounded, time-ordered frame retention for one thread or processor.
///
/// Insertion follows the partial-tree rule: a frame arriving while the most
/// recent retained frame is flagged partial replaces it, otherwise it
/// appends. Overflow past the cap drops the oldest frames, preserving order.
#[derive(Debug)]
pub struct FrameHistory {
    frames: Vec<Frame>,
    cap: usize,
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_CAP)
    }
}

impl FrameHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            frames: Vec::new(),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, frame: Frame) {
        match self.frames.last_mut() {
            Some(last) if last.partial => *last = frame,
            _ => self.frames.push(frame),
        }
        let extra = self.frames.len().saturating_sub(self.cap);
        if extra > 0 {
            self.frames.drain(..extra);
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample::{SampleRecord, encode_wire_sample};
    use emberline_wire::Cursor;

    fn frame_at(start_us: f64, partial: bool) -> Frame {
        let bytes = encode_wire_sample(
            1,
            [0; 3],
            0,
            start_us * 1_000.0,
            1_000_000.0,
            0.0,
            0.0,
            1,
            0,
        );
        let (record, bounds) = SampleRecord::decode(&mut Cursor::new(&bytes)).unwrap();
        Frame::new(vec![record], partial, bounds.start_us, bounds.end_us)
    }

    #[test]
    fn partial_then_complete_replaces_not_appends() {
        let mut history = FrameHistory::default();
        history.push(frame_at(0.0, true));
        assert_eq!(history.len(), 1);

        history.push(frame_at(500.0, false));
        assert_eq!(history.len(), 1);
        assert!(!history.last().unwrap().partial);
        assert_eq!(history.last().unwrap().start_us, 500.0);

        // A complete last frame appends as normal.
        history.push(frame_at(2_000.0, false));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn overflow_drops_oldest_preserving_order() {
        let mut history = FrameHistory::new(3);
        for i in 0..5 {
            history.push(frame_at(f64::from(i) * 1_000.0, false));
        }
        assert_eq!(history.len(), 3);
        let starts: Vec<f64> = history.frames().iter().map(|f| f.start_us).collect();
        assert_eq!(starts, vec![2_000.0, 3_000.0, 4_000.0]);
    }

    #[test]
    fn closed_interval_containment() {
        let frame = frame_at(1_000.0, false);
        assert!(frame.contains_us(1_000.0));
        assert!(frame.contains_us(2_000.0));
        assert!(!frame.contains_us(2_000.1));
        assert!(!frame.contains_us(999.9));
    }

    #[test]
    fn float_buffer_concatenates_samples() {
        let frame = frame_at(0.0, false);
        assert_eq!(frame.float_buffer().len(), FLOATS_PER_SAMPLE);
    }
}
