//! IO error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from file loading, watching and persistence
#[derive(Error, Debug)]
pub enum IoError {
    /// Underlying filesystem failure
    #[error("IO error on {path:?}: {source}")]
    Fs {
        /// Path being accessed
        path: PathBuf,
        /// The OS error
        #[source]
        source: std::io::Error,
    },

    /// Playlist YAML could not be parsed
    #[error("Failed to parse playlist {path:?}: {reason}")]
    PlaylistParse {
        /// The offending file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Playlist parsed but an item failed validation
    #[error("Invalid playlist {path:?}: {source}")]
    PlaylistInvalid {
        /// The offending file
        path: PathBuf,
        /// The validation failure
        #[source]
        source: tubebox_core::CoreError,
    },

    /// Settings document could not be parsed
    #[error("Failed to parse settings: {0}")]
    SettingsParse(String),

    /// Settings document could not be serialized
    #[error("Failed to serialize settings: {0}")]
    SettingsSerialize(String),

    /// The watcher backend failed
    #[error("Watcher error: {0}")]
    Watcher(String),
}

/// Result type for IO operations
pub type Result<T> = std::result::Result<T, IoError>;
