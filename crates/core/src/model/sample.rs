use serde::{Deserialize, Serialize};

use emberline_wire::{Cursor, CursorError};

use super::names::TextSlot;

/// On-wire stride of one sample record in an `SMPL` payload.
///
/// Fixed little-endian layout, byte-for-byte identical in capture files:
///
/// | offset | field | type |
/// |---|---|---|
/// | 0 | name hash | u32 |
/// | 4 | colour | 3×u8 |
/// | 7 | depth | u8 |
/// | 8 | start | f64 ns |
/// | 16 | length | f64 ns |
/// | 24 | self | f64 ns |
/// | 32 | gpu→cpu | f64 ns |
/// | 40 | calls | u32 |
/// | 44 | recurse | u32 |
pub const WIRE_SAMPLE_STRIDE: usize = 48;

/// Floats per sample in the flat float projection ([`SampleRecord::floats`]).
pub const FLOATS_PER_SAMPLE: usize = 6;

/// One timed span of executed code, decoded from its wire record.
///
/// Decoding is the single conversion point: the four duration fields arrive
/// as f64 nanoseconds and are stored as f32 milliseconds, and the two
/// counters arrive as u32 and are stored as f32. The conversion happens
/// exactly once, when the record is read; nothing converts back. Consumers
/// that want a flat float buffer instead of typed fields use the derived
/// [`floats`](Self::floats) projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub name_hash: u32,
    /// RGB colour assigned by the producer.
    pub colour: [u8; 3],
    /// Nesting depth in the call tree, 0 = root.
    pub depth: u8,
    /// Display-buffer slot of the resolved (or placeholder) name, written in
    /// during decode.
    pub name_slot: TextSlot,
    pub start_ms: f32,
    pub length_ms: f32,
    pub self_ms: f32,
    pub gpu_to_cpu_ms: f32,
    pub calls: f32,
    pub recurse: f32,
}

/// Full-precision µs bounds of a record, captured at decode before the f32
/// rounding of the stored fields. Frame timing uses these.
#[derive(Debug, Clone, Copy)]
pub struct SampleBounds {
    pub start_us: f64,
    pub end_us: f64,
}

impl SampleRecord {
    /// Decode one wire record, advancing the cursor by [`WIRE_SAMPLE_STRIDE`].
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<(Self, SampleBounds), CursorError> {
        let name_hash = cursor.read_u32()?;
        let colour = [cursor.read_u8()?, cursor.read_u8()?, cursor.read_u8()?];
        let depth = cursor.read_u8()?;
        let start_ns = cursor.read_f64()?;
        let length_ns = cursor.read_f64()?;
        let self_ns = cursor.read_f64()?;
        let gpu_to_cpu_ns = cursor.read_f64()?;
        let calls = cursor.read_u32()?;
        let recurse = cursor.read_u32()?;

        let record = Self {
            name_hash,
            colour,
            depth,
            name_slot: TextSlot::default(),
            start_ms: (start_ns / 1_000_000.0) as f32,
            length_ms: (length_ns / 1_000_000.0) as f32,
            self_ms: (self_ns / 1_000_000.0) as f32,
            gpu_to_cpu_ms: (gpu_to_cpu_ns / 1_000_000.0) as f32,
            calls: calls as f32,
            recurse: recurse as f32,
        };
        let bounds = SampleBounds {
            start_us: start_ns / 1_000.0,
            end_us: (start_ns + length_ns) / 1_000.0,
        };
        Ok((record, bounds))
    }

    pub fn start_us(&self) -> f64 {
        f64::from(self.start_ms) * 1_000.0
    }

    pub fn end_us(&self) -> f64 {
        f64::from(self.start_ms + self.length_ms) * 1_000.0
    }

    /// Flat float projection of the converted fields, in record order.
    /// Renderers concatenate these per frame for upload.
    pub fn floats(&self) -> [f32; FLOATS_PER_SAMPLE] {
        [
            self.start_ms,
            self.length_ms,
            self.self_ms,
            self.gpu_to_cpu_ms,
            self.calls,
            self.recurse,
        ]
    }
}

/// Build the wire image of one sample record. Only capture writers and tests
/// need this; the engine itself never re-encodes.
pub fn encode_wire_sample(
    name_hash: u32,
    colour: [u8; 3],
    depth: u8,
    start_ns: f64,
    length_ns: f64,
    self_ns: f64,
    gpu_to_cpu_ns: f64,
    calls: u32,
    recurse: u32,
) -> [u8; WIRE_SAMPLE_STRIDE] {
    let mut out = [0u8; WIRE_SAMPLE_STRIDE];
    out[0..4].copy_from_slice(&name_hash.to_le_bytes());
    out[4..7].copy_from_slice(&colour);
    out[7] = depth;
    out[8..16].copy_from_slice(&start_ns.to_le_bytes());
    out[16..24].copy_from_slice(&length_ns.to_le_bytes());
    out[24..32].copy_from_slice(&self_ns.to_le_bytes());
    out[32..40].copy_from_slice(&gpu_to_cpu_ns.to_le_bytes());
    out[40..44].copy_from_slice(&calls.to_le_bytes());
    out[44..48].copy_from_slice(&recurse.to_le_bytes());
    out
}
