//! Settings persistence
//!
//! A single JSON document, loaded at startup and rewritten whenever the
//! operator toggles something. Writes go through a temp file in the same
//! directory followed by a rename, so the admin's poll watcher (and a power
//! cut) only ever observes complete documents.

use crate::error::{IoError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tubebox_core::Settings;

/// Loads and saves the settings document
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store over `path`. Nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. An absent file yields defaults; a corrupt file is
    /// logged and also yields defaults so the appliance always boots.
    pub fn load(&self) -> Settings {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<Settings>(&text) {
                Ok(settings) => settings.sanitized(),
                Err(e) => {
                    warn!("Settings file {:?} corrupt ({}), using defaults", self.path, e);
                    Settings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {:?}, using defaults", self.path);
                Settings::default()
            }
            Err(e) => {
                warn!("Settings file {:?} unreadable ({}), using defaults", self.path, e);
                Settings::default()
            }
        }
    }

    /// Write the document atomically (temp file + rename).
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| IoError::SettingsSerialize(e.to_string()))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|source| IoError::Fs {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| IoError::Fs {
            path: dir.to_path_buf(),
            source,
        })?;
        tmp.write_all(json.as_bytes()).map_err(|source| IoError::Fs {
            path: tmp.path().to_path_buf(),
            source,
        })?;
        tmp.flush().map_err(|source| IoError::Fs {
            path: tmp.path().to_path_buf(),
            source,
        })?;
        tmp.persist(&self.path).map_err(|e| IoError::Fs {
            path: self.path.clone(),
            source: e.error,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubebox_core::{AudioOutput, DisplayMode};

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_then_load_is_semantically_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let mut settings = Settings::default();
        settings.display_mode = DisplayMode::CrtNative;
        settings.effects.scanlines = 0.5;
        settings.audio_output = AudioOutput::Hdmi;
        settings.master_volume = 42;

        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_replaces_not_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let mut settings = Settings::default();
        store.save(&settings).unwrap();
        settings.master_volume = 7;
        store.save(&settings).unwrap();

        assert_eq!(store.load().master_volume, 7);
        // Exactly one JSON document in the file.
        let text = std::fs::read_to_string(store.path()).unwrap();
        serde_json::from_str::<Settings>(&text).unwrap();
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(&path);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store.save(&Settings::default()).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "settings.json")
            .collect();
        assert!(leftovers.is_empty());
    }
}
