//! Tubebox Input - Devices to Abstract Actions
//!
//! Raw evdev events (and optionally GPIO line events) are translated into a
//! small alphabet of navigation actions. Reader threads block on the device
//! nodes and push raw key transitions into a channel; the main loop drains
//! the channel once per frame, resolves tap vs long-press, and gets back
//! actions in arrival order. Unknown codes are dropped silently.

#![warn(missing_docs)]

use thiserror::Error;

pub mod action;
#[cfg(feature = "gpio")]
pub mod gpio;
pub mod keymap;
pub mod source;

pub use action::InputAction;
pub use keymap::{Binding, Keymap};
pub use source::{InputSource, RawKeyEvent, LONG_PRESS_THRESHOLD};

/// Input errors
#[derive(Error, Debug)]
pub enum InputError {
    /// No usable input device was found at startup
    #[error("No input devices found")]
    NoDevices,

    /// Device enumeration or read failure
    #[error("Device error: {0}")]
    Device(String),

    /// GPIO chip/line access failure
    #[cfg(feature = "gpio")]
    #[error("GPIO error: {0}")]
    Gpio(String),
}

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;
