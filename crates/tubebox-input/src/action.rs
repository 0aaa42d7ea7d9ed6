//! The abstract action alphabet

/// Everything the rest of the engine can receive from an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Move the cursor backward (playlist / menu / keyboard grid)
    NavPrev,
    /// Move the cursor forward
    NavNext,
    /// Activate the current entry
    Select,
    /// Leave the current level / cancel the modal
    Back,
    /// Pause or resume playback
    PlayToggle,
    /// Seek backward; `long` selects the coarse step
    SeekBack {
        /// Held past the long-press threshold
        long: bool,
    },
    /// Seek forward; `long` selects the coarse step
    SeekFwd {
        /// Held past the long-press threshold
        long: bool,
    },
    /// Open the settings overlay
    Settings,
    /// Enter sample mode (held settings button)
    SampleMode,
    /// Master volume up one step
    VolumeUp,
    /// Master volume down one step
    VolumeDown,
    /// Clean shutdown
    Quit,
}
