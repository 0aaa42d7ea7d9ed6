//! Everything the renderer reads
//!
//! A small deterministic store mutated only from the main loop. Timers are
//! kept as engine-clock seconds (the same monotonic value the fade uses) so
//! the whole store is testable without sleeping.

use crate::fade::Fade;
use serde::{Deserialize, Serialize};

/// How long the volume overlay stays up after a change, seconds
pub const VOLUME_OVERLAY_SECS: f64 = 1.5;

/// How long a status-line message stays up, seconds
pub const STATUS_LINE_SECS: f64 = 4.0;

/// Intro sequence progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroState {
    /// The intro video is (supposed to be) on screen
    pub showing: bool,
    /// First frame has arrived; before this the screen stays black
    pub ready: bool,
    /// EOS reached, black overlay ramping in
    pub fading_out: bool,
    /// Intro finished (or was absent); menu may be entered
    pub complete: bool,
}

/// UI-side state for the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// Cursor over the media playlists
    pub selected_playlist_index: usize,
    /// Whether the UI layer is composed over playing video
    pub ui_visible_when_playing: bool,
    /// The single fade record driving all UI alpha
    pub fade: Fade,
    /// Intro progress
    pub intro: IntroState,
    /// A game is being launched (spinner)
    pub is_loading_game: bool,
    /// Engine time until which the volume overlay is drawn
    pub volume_overlay_until: Option<f64>,
    /// Master volume 0-100 (mirrors settings, mutated by volume keys)
    pub master_volume: u8,
    /// Transient status message and its expiry time
    pub status_line: Option<(String, f64)>,
    /// The settings panel is overlaid on the current screen
    pub settings_open: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selected_playlist_index: 0,
            ui_visible_when_playing: true,
            fade: Fade::default(),
            intro: IntroState::default(),
            is_loading_game: false,
            volume_overlay_until: None,
            master_volume: 80,
            status_line: None,
            settings_open: false,
        }
    }
}

impl UiState {
    /// Move the playlist cursor, clamped to `count` entries.
    pub fn select_playlist(&mut self, delta: i32, count: usize) {
        if count == 0 {
            self.selected_playlist_index = 0;
            return;
        }
        let cur = self.selected_playlist_index as i32;
        let next = (cur + delta).rem_euclid(count as i32);
        self.selected_playlist_index = next as usize;
    }

    /// Clamp the cursor after a playlist reload changed the set size.
    pub fn clamp_selection(&mut self, count: usize) {
        if count == 0 {
            self.selected_playlist_index = 0;
        } else if self.selected_playlist_index >= count {
            self.selected_playlist_index = count - 1;
        }
    }

    /// Nudge master volume and arm the overlay.
    pub fn adjust_volume(&mut self, delta: i32, now: f64) -> u8 {
        let v = (self.master_volume as i32 + delta).clamp(0, 100) as u8;
        self.master_volume = v;
        self.volume_overlay_until = Some(now + VOLUME_OVERLAY_SECS);
        v
    }

    /// Whether the volume overlay should draw this frame.
    pub fn volume_overlay_visible(&self, now: f64) -> bool {
        self.volume_overlay_until.map(|t| now < t).unwrap_or(false)
    }

    /// Post a transient status-line message.
    pub fn set_status(&mut self, message: impl Into<String>, now: f64) {
        self.status_line = Some((message.into(), now + STATUS_LINE_SECS));
    }

    /// Status text for this frame, dropping it once expired.
    pub fn status_text(&mut self, now: f64) -> Option<&str> {
        if let Some((_, until)) = self.status_line {
            if now >= until {
                self.status_line = None;
            }
        }
        self.status_line.as_ref().map(|(s, _)| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_selection_wraps() {
        let mut ui = UiState::default();
        ui.select_playlist(-1, 3);
        assert_eq!(ui.selected_playlist_index, 2);
        ui.select_playlist(1, 3);
        assert_eq!(ui.selected_playlist_index, 0);
    }

    #[test]
    fn selection_with_no_playlists_stays_zero() {
        let mut ui = UiState::default();
        ui.select_playlist(1, 0);
        assert_eq!(ui.selected_playlist_index, 0);
    }

    #[test]
    fn clamp_after_reload() {
        let mut ui = UiState::default();
        ui.selected_playlist_index = 5;
        ui.clamp_selection(2);
        assert_eq!(ui.selected_playlist_index, 1);
        ui.clamp_selection(0);
        assert_eq!(ui.selected_playlist_index, 0);
    }

    #[test]
    fn volume_clamps_and_arms_overlay() {
        let mut ui = UiState::default();
        ui.master_volume = 98;
        assert_eq!(ui.adjust_volume(5, 10.0), 100);
        assert!(ui.volume_overlay_visible(10.5));
        assert!(!ui.volume_overlay_visible(12.0));
        assert_eq!(ui.adjust_volume(-200, 12.0), 0);
    }

    #[test]
    fn status_line_expires() {
        let mut ui = UiState::default();
        ui.set_status("Skipped broken item", 0.0);
        assert_eq!(ui.status_text(1.0), Some("Skipped broken item"));
        assert_eq!(ui.status_text(STATUS_LINE_SECS + 0.1), None);
        assert!(ui.status_line.is_none());
    }
}
