//! Tubebox Render - Display Ownership and GL Drawing
//!
//! This crate owns the physical display and everything drawn on it:
//! - `Surface`: DRM connector/CRTC/mode, GBM buffers, EGL/GLES 3.0 context,
//!   page-flipped presentation, and the master drop/claim handshake for the
//!   emulator handoff
//! - `Draw2d`: the single textured-quad pipeline the whole UI is built from
//! - `FontAtlas`: lazy per-(codepoint, size) glyph rasterization
//! - `CrtPass`: the seven-effect full-screen post-process
//! - `VideoTextures`: decoded-frame upload and YUV/RGBA shader selection
//!
//! ## The reset protocol
//!
//! Every GL-owning type exposes `reset_gl()`. It FORGETS object IDs without
//! touching GL: the context those IDs belonged to is gone by the time a
//! reset happens (handoff tears it down), and everything is lazily re-created
//! against the new context on the next frame. Nothing in this crate caches a
//! GL handle anywhere else.

#![allow(missing_docs)]

use thiserror::Error;

pub mod crt;
pub mod draw2d;
pub mod font;
pub mod surface;
pub mod texture;
pub mod video;

pub use crt::CrtPass;
pub use draw2d::{Color, Draw2d};
pub use font::{FontAtlas, FontFace};
pub use surface::{Surface, Viewport};
pub use texture::upload_rgba_texture;
pub use video::VideoTextures;

/// Render errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No connected display found")]
    DisplayUnavailable,

    #[error("Mode set failed: {0}")]
    ModeSetFailed(String),

    #[error("Display lost: {0}")]
    DisplayLost(String),

    #[error("EGL error: {0}")]
    Egl(String),

    #[error("GL error: {0}")]
    Gl(String),

    #[error("Font error: {0}")]
    Font(String),
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
