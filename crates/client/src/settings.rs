use std::io;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

/// Default peer address when nothing has been saved yet.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:17815";

/// Persisted viewer settings. The connection address is written back after
/// every successful connect, so the next launch dials the last good peer; an
/// explicitly supplied address always overrides the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub connection_address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection_address: DEFAULT_ADDRESS.to_string(),
        }
    }
}

impl Settings {
    /// Load from a JSON file. A missing or unreadable file yields the
    /// defaults; corrupt content is logged and replaced on the next save.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!("could not read {}: {err}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("ignoring corrupt settings in {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(settings.connection_address, DEFAULT_ADDRESS);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            connection_address: "10.0.0.5:17815".to_string(),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
