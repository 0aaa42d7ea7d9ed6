//! Tubebox UI - Screen Composition
//!
//! Everything the operator sees is assembled here from the one quad
//! primitive: the playlist menu, the settings overlay, the status line,
//! volume overlay, loading spinner and the QR info pane. This crate holds
//! no GL resources of its own (the QR pane caches a matrix of booleans, not
//! a texture) and reads state without mutating it.

#![allow(missing_docs)]

pub mod qr;
pub mod screens;
pub mod theme;

pub use qr::QrPane;
pub use screens::UiFrame;
