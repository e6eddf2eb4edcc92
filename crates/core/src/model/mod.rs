pub mod frame;
pub mod names;
pub mod properties;
pub mod sample;

pub use frame::{DEFAULT_FRAME_CAP, Frame, FrameHistory, ProcessorSpan};
pub use names::{Name, NameMap, TextSlot};
pub use properties::{PropertySnapshot, PropertyStore, PropertyValue};
pub use sample::{FLOATS_PER_SAMPLE, SampleRecord, WIRE_SAMPLE_STRIDE};
