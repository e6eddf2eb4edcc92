use emberline_wire::{Cursor, DispatchError};

use crate::model::sample::WIRE_SAMPLE_STRIDE;
use crate::model::{Frame, SampleRecord};
use crate::session::Session;

/// Decode a sample-tree message and insert the resulting frame into the
/// owning thread's history.
///
/// The payload is `threadName, sampleCount:u32, partialTree:u32`, then the
/// sample array aligned to the next 4-byte boundary (the thread name is
/// variable-length). Name hashes resolve against the session registry as
/// records decode, writing each name's display slot into its record; unseen
/// hashes queue a resolution request.
pub(super) fn on_sample_tree(
    session: &mut Session,
    cursor: &mut Cursor<'_>,
) -> Result<(), DispatchError> {
    if session.suppress_ingest() {
        return Ok(());
    }

    let thread_name = cursor.read_string()?;
    let sample_count = cursor.read_u32()? as usize;
    let partial = cursor.read_u32()? != 0;
    if sample_count == 0 {
        return Ok(());
    }
    cursor.align_to(4)?;

    let mut samples =
        Vec::with_capacity(sample_count.min(cursor.remaining() / WIRE_SAMPLE_STRIDE + 1));
    let mut start_us = 0.0;
    let mut end_us = 0.0;
    for index in 0..sample_count {
        let (mut record, bounds) = SampleRecord::decode(cursor)?;
        let (existed, name) = session.sample_names.get(record.name_hash);
        record.name_slot = name.slot();
        if !existed {
            session.request_name(record.name_hash);
        }
        if index == 0 {
            start_us = bounds.start_us;
        }
        end_us = bounds.end_us;
        samples.push(record);
    }

    session
        .threads
        .push(&thread_name, Frame::new(samples, partial, start_us, end_us));
    Ok(())
}
