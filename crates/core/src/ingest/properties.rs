use emberline_wire::{Cursor, DispatchError};

use crate::model::PropertySnapshot;
use crate::session::Session;

// nameHash + type + flags + value + prevValue + depth
const PROPERTY_WIRE_STRIDE: usize = 32;

/// Property snapshot set: `count:u32, propertyFrame:u32`, then records.
pub(super) fn on_property_snapshot(
    session: &mut Session,
    cursor: &mut Cursor<'_>,
) -> Result<(), DispatchError> {
    if session.suppress_ingest() {
        return Ok(());
    }

    let count = cursor.read_u32()? as usize;
    let property_frame = cursor.read_u32()?;

    let mut snapshots =
        Vec::with_capacity(count.min(cursor.remaining() / PROPERTY_WIRE_STRIDE + 1));
    for _ in 0..count {
        snapshots.push(PropertySnapshot::decode(cursor)?);
    }
    session.properties.replace(property_frame, snapshots);
    Ok(())
}
