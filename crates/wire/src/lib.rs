pub mod cursor;
pub mod dispatch;
pub mod framing;

pub use cursor::{Cursor, CursorError};
pub use dispatch::{DispatchError, Dispatcher};
pub use framing::{
    CAPTURE_MAGIC, FrameAccumulator, FramingError, HEADER_SIZE, MessageHeader, Tag, encode_message,
};
