pub mod timeline;
pub mod viewport;

pub use timeline::{DEFAULT_DEPTH_LIMIT, ROW_PIXEL_HEIGHT, SampleRef, Selection, TimelineRow};
pub use viewport::Viewport;
