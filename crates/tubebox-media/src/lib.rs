//! Tubebox Media - Playback Pipeline
//!
//! This crate produces timestamped decoded frames and synchronized audio for
//! a single item at a time, behind one `Player` interface:
//! - `GstPlayer` (default): streaming pipeline with hardware decoders
//!   preferred, raw YUV/RGBA delivered through an application sink
//! - `MpvPlayer` (feature `libmpv`): direct renderer for odd containers
//!
//! Decode workers never touch GL. Everything crossing back to the main
//! thread goes through atomics and a single-slot frame buffer.

#![allow(missing_docs)]

use thiserror::Error;

pub mod frame;
pub mod gst_player;
#[cfg(feature = "libmpv")]
pub mod mpv_player;
pub mod player;

pub use frame::{FrameSlot, PixelLayout, VideoFrame};
pub use gst_player::GstPlayer;
#[cfg(feature = "libmpv")]
pub use mpv_player::MpvPlayer;
pub use player::{LoadRequest, Player};

/// Media errors
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("No usable decoder for: {0}")]
    DecoderUnavailable(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Construct the default player implementation.
pub fn default_player(audio: tubebox_core::AudioOutput) -> Box<dyn Player> {
    Box::new(GstPlayer::new(audio))
}
