//! Tubebox IO - Files and Watching
//!
//! The file system is the appliance's only control interface: the web admin
//! writes playlist YAML and the settings document into watched directories,
//! and the engine picks the changes up by mtime polling. This crate owns:
//! - Playlist file parsing and validation
//! - The playlist library (directory scan + wholesale reload)
//! - The poll-based change watcher
//! - The settings store with atomic write-then-rename

#![warn(missing_docs)]

pub mod error;
pub mod library;
pub mod playlist_file;
pub mod settings_store;
pub mod watcher;

pub use error::{IoError, Result};
pub use library::{LibraryLoad, PlaylistLibrary};
pub use playlist_file::load_playlist_file;
pub use settings_store::SettingsStore;
pub use watcher::DirWatcher;
