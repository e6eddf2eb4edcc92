use std::collections::BTreeMap;

use crate::model::frame::DEFAULT_FRAME_CAP;
use crate::model::{Frame, FrameHistory, NameMap, PropertyStore};

/// Per-thread sample-tree frame retention, keyed by thread name.
#[derive(Debug)]
pub struct FrameStore {
    histories: BTreeMap<String, FrameHistory>,
    cap: usize,
}

impl FrameStore {
    pub fn new(cap: usize) -> Self {
        Self {
            histories: BTreeMap::new(),
            cap,
        }
    }

    pub fn push(&mut self, thread: &str, frame: Frame) {
        self.histories
            .entry(thread.to_string())
            .or_insert_with(|| FrameHistory::new(self.cap))
            .push(frame);
    }

    pub fn history(&self, thread: &str) -> Option<&FrameHistory> {
        self.histories.get(thread)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrameHistory)> {
        self.histories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn thread_count(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }
}

/// Frame retention per hardware processor, indexed by processor slot.
#[derive(Debug)]
pub struct ProcessorStore {
    slots: Vec<FrameHistory>,
    cap: usize,
}

impl ProcessorStore {
    pub fn new(cap: usize) -> Self {
        Self {
            slots: Vec::new(),
            cap,
        }
    }

    /// Grow to at least `count` slots. Processor count is fixed per peer, so
    /// this settles after the first occupancy message.
    pub fn ensure_slots(&mut self, count: usize) {
        while self.slots.len() < count {
            self.slots.push(FrameHistory::new(self.cap));
        }
    }

    pub fn history(&self, index: usize) -> Option<&FrameHistory> {
        self.slots.get(index)
    }

    pub(crate) fn history_mut(&mut self, index: usize) -> Option<&mut FrameHistory> {
        self.slots.get_mut(index)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Everything one profiling session owns: name registries, frame histories,
/// property snapshots, and the pause/live flags that gate ingest.
///
/// There is deliberately no global state anywhere in the engine; independent
/// sessions coexist freely, one per connection or replayed capture.
#[derive(Debug)]
pub struct Session {
    pub sample_names: NameMap,
    pub thread_names: NameMap,
    pub threads: FrameStore,
    pub processors: ProcessorStore,
    pub properties: PropertyStore,
    paused: bool,
    live: bool,
    name_requests: Vec<u32>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_frame_cap(DEFAULT_FRAME_CAP)
    }

    pub fn with_frame_cap(cap: usize) -> Self {
        Self {
            sample_names: NameMap::new(),
            thread_names: NameMap::new(),
            threads: FrameStore::new(cap),
            processors: ProcessorStore::new(cap),
            properties: PropertyStore::new(),
            paused: false,
            live: false,
            name_requests: Vec::new(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Whether arriving sample data should be dropped. Pausing freezes the
    /// inspected view only while a peer keeps streaming; replaying a capture
    /// has no live connection and is never suppressed.
    pub fn suppress_ingest(&self) -> bool {
        self.paused && self.live
    }

    /// A connection opened: start clean for the new run and resume updates.
    pub fn on_connected(&mut self) {
        self.live = true;
        self.clear();
        self.paused = false;
    }

    /// The connection dropped: keep the last trace on screen for inspection.
    pub fn on_disconnected(&mut self) {
        self.live = false;
        self.paused = true;
    }

    /// Queue an outgoing name-resolution request. Only meaningful while a
    /// connection is live; otherwise there is nobody to answer and the
    /// request is dropped.
    pub fn request_name(&mut self, hash: u32) {
        if self.live {
            self.name_requests.push(hash);
        }
    }

    /// Drain queued name-resolution requests for the transport to send.
    pub fn take_name_requests(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.name_requests)
    }

    pub fn clear(&mut self) {
        self.sample_names = NameMap::new();
        self.thread_names = NameMap::new();
        self.threads.clear();
        self.processors.clear();
        self.properties.clear();
        self.name_requests.clear();
    }
}
