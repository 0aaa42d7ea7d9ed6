//! Tubebox Core - Domain Model and State Machines
//!
//! This crate contains the core domain model for the kiosk engine, including:
//! - Playlist/Item hierarchy and categorization
//! - Playback state bookkeeping (cursor, auto-advance latches)
//! - The screen enum and the single fade record that drives all UI alpha
//! - Persisted display/audio settings
//! - Menu tree and virtual keyboard state
//!
//! Everything in here is pure state: no device handles, no IO, no GL.

#![warn(missing_docs)]

use thiserror::Error;

pub mod fade;
pub mod keyboard;
pub mod logging;
pub mod menu;
pub mod playback;
pub mod playlist;
pub mod screen;
pub mod settings;
pub mod ui_state;

pub use fade::Fade;
pub use keyboard::{KeyboardOutcome, VirtualKeyboard};
pub use logging::LogConfig;
pub use menu::{EffectKind, GameBrowser, MenuCommand, MenuEntry, MenuManager, MenuSection};
pub use playback::PlaybackState;
pub use playlist::{Playlist, PlaylistItem, PlaylistSet, SourceType};
pub use screen::Screen;
pub use settings::{AudioOutput, DisplayMode, EffectLevels, Settings};
pub use ui_state::{IntroState, UiState};

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// An item failed structural validation (missing path/url/core fields)
    #[error("Invalid playlist item '{title}': {reason}")]
    InvalidItem {
        /// Title of the offending item
        title: String,
        /// What was missing or contradictory
        reason: String,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
