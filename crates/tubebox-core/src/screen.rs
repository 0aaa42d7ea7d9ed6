//! Top-level screen states
//!
//! Exactly one screen is current on every tick. The settings panel is an
//! overlay flag on the UI state rather than a screen of its own, because it
//! can sit on top of any screen except the intro.

use serde::{Deserialize, Serialize};

/// What the engine is showing this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    /// Cold-start intro video, UI hidden
    Intro,
    /// Intro finished, black overlay ramping in
    IntroFadeOut,
    /// UI only, theme-color background
    Menu,
    /// Item selected, waiting for the pipeline to come up
    Load,
    /// Video under a darkener under the UI
    PlayUi,
    /// Video only, UI faded out
    PlayClean,
    /// Display ceded to the emulator process
    Handoff,
    /// Back from handoff, rebuilding GL before re-entering the menu
    Recovery,
}

impl Screen {
    /// True for the two screens that composite a video frame under the UI.
    pub fn shows_video(self) -> bool {
        matches!(self, Screen::PlayUi | Screen::PlayClean | Screen::Load)
    }

    /// True while the intro sequence owns the display.
    pub fn in_intro(self) -> bool {
        matches!(self, Screen::Intro | Screen::IntroFadeOut)
    }

    /// Whether normal navigation input is accepted on this screen.
    pub fn accepts_input(self) -> bool {
        !matches!(self, Screen::Intro | Screen::IntroFadeOut | Screen::Handoff | Screen::Recovery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_blocks_input() {
        assert!(!Screen::Intro.accepts_input());
        assert!(!Screen::IntroFadeOut.accepts_input());
        assert!(Screen::Menu.accepts_input());
        assert!(Screen::PlayClean.accepts_input());
    }

    #[test]
    fn video_screens() {
        assert!(Screen::PlayUi.shows_video());
        assert!(Screen::PlayClean.shows_video());
        assert!(!Screen::Menu.shows_video());
    }
}
