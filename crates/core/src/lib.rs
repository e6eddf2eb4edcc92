pub mod ingest;
pub mod model;
pub mod replay;
pub mod session;
pub mod views;

pub use ingest::register_handlers;
pub use replay::{ReplayError, ReplayStats, replay_capture};
pub use session::Session;
