//! Playback state bookkeeping
//!
//! This is the application-side mirror of the pipeline: the playlist cursor,
//! the last observed position/duration, and the latches that make
//! auto-advance fire exactly once per item.

use serde::{Deserialize, Serialize};

/// How close to the end (seconds) an item must be before auto-advance fires
pub const ADVANCE_THRESHOLD_SECS: f64 = 0.5;

/// Current playback position within the playlist set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Index of the playlist currently playing from
    pub current_playlist_index: usize,
    /// Index of the item playing, or -1 when nothing is loaded
    pub current_item_index: i32,
    /// Last observed position, seconds
    pub position_seconds: f64,
    /// Last observed duration, seconds; 0 until the pipeline reports one
    pub duration_seconds: f64,
    /// Paused by the operator
    pub paused: bool,
    /// The pipeline has a real stream up (duration known, frames flowing)
    pub video_active: bool,
    /// Volume captured at MENU->PLAY, restored when the session ends
    pub original_volume: Option<f64>,
    /// Item index for which auto-advance already fired
    pub last_advanced_item_index: i32,
    /// Duration observed when auto-advance last fired; a new duration for the
    /// same index means a new load and re-arms the latch
    pub last_advanced_duration: f64,
    /// Latched while an item swap is in flight so a transient
    /// `video_active=false` does not bounce the UI back to the menu
    pub is_switching_playlist: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_playlist_index: 0,
            current_item_index: -1,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            paused: false,
            video_active: false,
            original_volume: None,
            last_advanced_item_index: -1,
            last_advanced_duration: 0.0,
            is_switching_playlist: false,
        }
    }
}

impl PlaybackState {
    /// Record the position/duration the pipeline reported this tick.
    ///
    /// Observing a fresh duration for the current item re-arms the
    /// auto-advance latch.
    pub fn observe(&mut self, position: f64, duration: f64) {
        if duration > 0.0
            && self.current_item_index == self.last_advanced_item_index
            && (duration - self.last_advanced_duration).abs() > f64::EPSILON
        {
            self.last_advanced_item_index = -1;
            self.last_advanced_duration = 0.0;
        }
        self.position_seconds = position;
        self.duration_seconds = duration;
        self.video_active = duration > 0.0;
    }

    /// True when this tick should advance to the next item: the stream is
    /// near its end and this (item, duration) pair has not advanced yet.
    pub fn should_auto_advance(&self) -> bool {
        self.video_active
            && self.current_item_index >= 0
            && self.duration_seconds > 0.0
            && self.position_seconds >= self.duration_seconds - ADVANCE_THRESHOLD_SECS
            && !(self.last_advanced_item_index == self.current_item_index
                && (self.last_advanced_duration - self.duration_seconds).abs() < f64::EPSILON)
    }

    /// Latch the advance for the current (item, duration) pair.
    pub fn mark_advanced(&mut self) {
        self.last_advanced_item_index = self.current_item_index;
        self.last_advanced_duration = self.duration_seconds;
    }

    /// Reset to the no-item-loaded state (used by stop and playlist end).
    pub fn clear(&mut self) {
        self.current_item_index = -1;
        self.position_seconds = 0.0;
        self.duration_seconds = 0.0;
        self.paused = false;
        self.video_active = false;
        self.original_volume = None;
        self.is_switching_playlist = false;
    }

    /// Begin playing `item_index`; clears latches and observed timing.
    pub fn begin_item(&mut self, playlist_index: usize, item_index: usize) {
        self.current_playlist_index = playlist_index;
        self.current_item_index = item_index as i32;
        self.position_seconds = 0.0;
        self.duration_seconds = 0.0;
        self.paused = false;
        self.video_active = false;
        self.is_switching_playlist = true;
    }

    /// The swap completed: the new item's stream is up.
    pub fn swap_settled(&mut self) {
        self.is_switching_playlist = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_invariants() {
        let s = PlaybackState::default();
        assert_eq!(s.current_item_index, -1);
        assert!(!s.video_active);
        assert_eq!(s.duration_seconds, 0.0);
    }

    #[test]
    fn advance_fires_once_per_item_duration_pair() {
        let mut s = PlaybackState::default();
        s.begin_item(0, 0);
        s.observe(29.7, 30.0);
        assert!(s.should_auto_advance());
        s.mark_advanced();

        // Same pair: must not fire again even if position keeps reporting.
        s.observe(29.9, 30.0);
        assert!(!s.should_auto_advance());
    }

    #[test]
    fn new_duration_rearms_the_latch() {
        let mut s = PlaybackState::default();
        s.begin_item(0, 0);
        s.observe(29.8, 30.0);
        s.mark_advanced();

        // Same index reloaded with a different duration (e.g. seek window).
        s.observe(44.9, 45.0);
        assert!(s.should_auto_advance());
    }

    #[test]
    fn advance_requires_active_video() {
        let mut s = PlaybackState::default();
        s.begin_item(0, 1);
        // No duration observed yet.
        assert!(!s.should_auto_advance());
    }

    #[test]
    fn begin_item_latches_switch_flag() {
        let mut s = PlaybackState::default();
        s.begin_item(2, 3);
        assert!(s.is_switching_playlist);
        assert_eq!(s.current_playlist_index, 2);
        assert_eq!(s.current_item_index, 3);
        s.swap_settled();
        assert!(!s.is_switching_playlist);
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut s = PlaybackState::default();
        s.begin_item(0, 0);
        s.observe(1.0, 30.0);
        s.original_volume = Some(80.0);
        s.clear();
        assert_eq!(s.current_item_index, -1);
        assert!(!s.video_active);
        assert_eq!(s.original_volume, None);
    }

    #[test]
    fn observe_updates_video_active() {
        let mut s = PlaybackState::default();
        s.begin_item(0, 0);
        s.observe(0.1, 0.0);
        assert!(!s.video_active);
        s.observe(0.2, 12.0);
        assert!(s.video_active);
    }
}
