use serde::{Deserialize, Serialize};

use emberline_wire::{Cursor, CursorError};

/// Cap on retained property snapshot sets.
pub const PROPERTY_HISTORY_CAP: usize = 1_024;

/// Typed property value, decoded from a type tag plus 8 raw bytes.
/// Unknown type tags keep their raw bits rather than failing the message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    U32(u32),
    S32(i32),
    F32(f32),
    U64(u64),
    S64(i64),
    F64(f64),
    Raw(u64),
}

impl PropertyValue {
    fn decode(type_tag: u32, bits: u64) -> Self {
        match type_tag {
            0 => Self::Bool(bits != 0),
            1 => Self::U32(bits as u32),
            2 => Self::S32(bits as u32 as i32),
            3 => Self::F32(f32::from_bits(bits as u32)),
            4 => Self::U64(bits),
            5 => Self::S64(bits as i64),
            6 => Self::F64(f64::from_bits(bits)),
            _ => Self::Raw(bits),
        }
    }
}

/// One property in a snapshot: current and previous value plus its position
/// in the property tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub name_hash: u32,
    pub flags: u32,
    pub value: PropertyValue,
    pub prev_value: PropertyValue,
    pub depth: u32,
}

impl PropertySnapshot {
    /// Fixed-stride record: nameHash, type, flags, value, prevValue, depth.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self, CursorError> {
        let name_hash = cursor.read_u32()?;
        let type_tag = cursor.read_u32()?;
        let flags = cursor.read_u32()?;
        let value_bits = cursor.read_u64()?;
        let prev_bits = cursor.read_u64()?;
        let depth = cursor.read_u32()?;
        Ok(Self {
            name_hash,
            flags,
            value: PropertyValue::decode(type_tag, value_bits),
            prev_value: PropertyValue::decode(type_tag, prev_bits),
            depth,
        })
    }
}

/// Latest property snapshot set plus a bounded history of previous sets.
#[derive(Debug, Default)]
pub struct PropertyStore {
    latest: Vec<PropertySnapshot>,
    property_frame: u32,
    history: Vec<(u32, Vec<PropertySnapshot>)>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, property_frame: u32, snapshots: Vec<PropertySnapshot>) {
        if !self.latest.is_empty() {
            self.history
                .push((self.property_frame, std::mem::take(&mut self.latest)));
            let extra = self.history.len().saturating_sub(PROPERTY_HISTORY_CAP);
            if extra > 0 {
                self.history.drain(..extra);
            }
        }
        self.property_frame = property_frame;
        self.latest = snapshots;
    }

    pub fn latest(&self) -> &[PropertySnapshot] {
        &self.latest
    }

    pub fn property_frame(&self) -> u32 {
        self.property_frame
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear(&mut self) {
        self.latest.clear();
        self.history.clear();
        self.property_frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(name_hash: u32, type_tag: u32, value: u64, prev: u64, depth: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&name_hash.to_le_bytes());
        out.extend_from_slice(&type_tag.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
        out.extend_from_slice(&prev.to_le_bytes());
        out.extend_from_slice(&depth.to_le_bytes());
        out
    }

    #[test]
    fn decodes_typed_values() {
        let bytes = record_bytes(42, 6, 2.5f64.to_bits(), 1.5f64.to_bits(), 3);
        let snap = PropertySnapshot::decode(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(snap.name_hash, 42);
        assert_eq!(snap.depth, 3);
        assert_eq!(snap.value, PropertyValue::F64(2.5));
        assert_eq!(snap.prev_value, PropertyValue::F64(1.5));
    }

    #[test]
    fn unknown_type_keeps_raw_bits() {
        let bytes = record_bytes(1, 99, 0xFEED, 0, 0);
        let snap = PropertySnapshot::decode(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(snap.value, PropertyValue::Raw(0xFEED));
    }

    #[test]
    fn replace_rolls_previous_set_into_history() {
        let mut store = PropertyStore::new();
        let snap = PropertySnapshot {
            name_hash: 1,
            flags: 0,
            value: PropertyValue::U32(1),
            prev_value: PropertyValue::U32(0),
            depth: 0,
        };
        store.replace(10, vec![snap]);
        assert_eq!(store.history_len(), 0);
        store.replace(11, vec![snap]);
        assert_eq!(store.history_len(), 1);
        assert_eq!(store.property_frame(), 11);
    }
}
