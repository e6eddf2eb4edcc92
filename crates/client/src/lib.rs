pub mod connection;
pub mod settings;

pub use connection::{Connection, ConnectionState, RECONNECT_INTERVAL};
pub use settings::{DEFAULT_ADDRESS, Settings};
