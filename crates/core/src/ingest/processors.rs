use emberline_wire::{Cursor, DispatchError};

use crate::model::names::TextSlot;
use crate::model::{Frame, FrameHistory, ProcessorSpan, SampleRecord};
use crate::session::Session;

/// Sentinel thread id meaning "this processor is idle".
pub const IDLE_THREAD_ID: u32 = u32::MAX;

/// Decode a processor occupancy snapshot and merge it into the per-processor
/// histories.
///
/// Each message carries a monotonic index and one `(threadId, nameHash,
/// timeUs)` entry per processor slot. A snapshot that continues the same
/// thread from the immediately preceding message index extends the open busy
/// span in place; anything else starts a new zero-length span at the
/// snapshot time.
pub(super) fn on_processor_threads(
    session: &mut Session,
    cursor: &mut Cursor<'_>,
) -> Result<(), DispatchError> {
    if session.suppress_ingest() {
        return Ok(());
    }

    let count = cursor.read_u32()? as usize;
    let message_index = cursor.read_u64()?;
    session.processors.ensure_slots(count);

    for slot in 0..count {
        let thread_id = cursor.read_u32()?;
        let name_hash = cursor.read_u32()?;
        let sample_time_us = cursor.read_u64()?;

        if thread_id == IDLE_THREAD_ID {
            continue;
        }

        let extended = session
            .processors
            .history_mut(slot)
            .is_some_and(|history| try_extend(history, thread_id, message_index, sample_time_us));
        if extended {
            continue;
        }

        let name_slot = {
            let (_, name) = session.thread_names.get(name_hash);
            name.slot()
        };
        let frame = busy_frame(
            thread_id,
            name_hash,
            name_slot,
            message_index,
            sample_time_us,
        );
        if let Some(history) = session.processors.history_mut(slot) {
            history.push(frame);
        }
    }
    Ok(())
}

/// Extend the open busy span if `message_index` directly follows the one
/// that last touched it and the processor still runs the same thread.
fn try_extend(
    history: &mut FrameHistory,
    thread_id: u32,
    message_index: u64,
    sample_time_us: u64,
) -> bool {
    let Some(last) = history.last_mut() else {
        return false;
    };
    let Some(span) = last.processor else {
        return false;
    };
    if span.thread_id != thread_id || span.message_index + 1 != message_index {
        return false;
    }

    let elapsed_us = sample_time_us.saturating_sub(span.last_start_us);
    last.processor = Some(ProcessorSpan {
        thread_id,
        message_index,
        last_start_us: sample_time_us,
    });
    last.end_us += elapsed_us as f64;
    if let Some(root) = last.samples_mut().first_mut() {
        root.length_ms += elapsed_us as f32 / 1_000.0;
    }
    true
}

/// Single-sample frame representing "processor busy starting at time T".
fn busy_frame(
    thread_id: u32,
    name_hash: u32,
    name_slot: TextSlot,
    message_index: u64,
    sample_time_us: u64,
) -> Frame {
    // u64 µs → f64 is exact below 2^53, ~104 days of uptime.
    let start_us = sample_time_us as f64;
    let record = SampleRecord {
        name_hash,
        colour: pastel_colour(name_hash),
        depth: 0,
        name_slot,
        start_ms: (start_us / 1_000.0) as f32,
        length_ms: 0.0,
        self_ms: 0.0,
        gpu_to_cpu_ms: 0.0,
        calls: 1.0,
        recurse: 0.0,
    };
    let mut frame = Frame::new(vec![record], false, start_us, start_us);
    frame.processor = Some(ProcessorSpan {
        thread_id,
        message_index,
        last_start_us: sample_time_us,
    });
    frame
}

/// Deterministic pastel from a thread-name hash: each channel sits in
/// `127..=254`.
fn pastel_colour(hash: u32) -> [u8; 3] {
    let channel = |shift: u32| 127 + (((hash >> shift) & 0xFF) as u8) / 2;
    [channel(0), channel(4), channel(8)]
}
