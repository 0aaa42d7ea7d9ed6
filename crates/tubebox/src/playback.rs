//! Playback controller
//!
//! Mediates between UI intents and the media pipeline and owns the playlist
//! cursor. All pipeline readings funnel through `update` once per tick; the
//! auto-advance decision, the broken-item skip policy and the load timeout
//! all live here, never in decoder callbacks.

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tubebox_core::{PlaybackState, PlaylistItem, PlaylistSet, SourceType};
use tubebox_media::{LoadRequest, Player};

/// A load that returned true must show a duration within this window.
const LOAD_TIMEOUT_SECS: f64 = 2.0;

/// How long each item plays in sample mode before advancing.
const SAMPLE_MODE_SECS: f64 = 12.0;

/// What `update` observed this tick, for the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The pending item's stream came up
    VideoUp,
    /// Playback ended (playlist done, stop, or repeated failure)
    ReturnedToMenu,
    /// Text for the status line
    Status(String),
}

/// Drives one `Player` through a playlist
pub struct PlaybackController {
    player: Box<dyn Player>,
    /// Cursor and observed-timing state, read by the whole engine
    pub state: PlaybackState,
    /// Base volume in percent; per-screen dips multiply this
    base_volume: f64,
    consecutive_failures: u32,
    load_deadline: Option<f64>,
    /// Sample mode: advance after a short taste of each item
    pub sample_mode: bool,
}

impl PlaybackController {
    /// Wrap a player. `base_volume` is the master volume in percent.
    pub fn new(player: Box<dyn Player>, base_volume: f64) -> Self {
        Self {
            player,
            state: PlaybackState::default(),
            base_volume,
            consecutive_failures: 0,
            load_deadline: None,
            sample_mode: false,
        }
    }

    /// Begin playing `item_index` of `playlist_index`. On a load failure the
    /// broken item is skipped once; a second consecutive failure stops and
    /// returns to menu. Game items are refused (the handoff path owns them).
    pub fn play(
        &mut self,
        playlists: &PlaylistSet,
        playlist_index: usize,
        item_index: usize,
        base_dir: &Path,
        now: f64,
    ) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        self.try_load(playlists, playlist_index, item_index, base_dir, now, &mut events);
        events
    }

    fn try_load(
        &mut self,
        playlists: &PlaylistSet,
        playlist_index: usize,
        item_index: usize,
        base_dir: &Path,
        now: f64,
        events: &mut Vec<PlaybackEvent>,
    ) {
        let Some(playlist) = playlists.get(playlist_index) else {
            events.push(PlaybackEvent::ReturnedToMenu);
            return;
        };
        if playlist.is_empty() {
            // SELECT on an empty playlist is a no-op.
            return;
        }
        let Some(item) = playlist.item(item_index) else {
            self.stop_to_menu(events);
            return;
        };
        if item.source_type == SourceType::EmulatedGame {
            warn!("Game item '{}' routed to the player; ignoring", item.title);
            return;
        }

        self.state.begin_item(playlist_index, item_index);
        let request = request_for(item, base_dir, self.base_volume);

        if self.player.load(&request) {
            info!(
                "Playing [{}:{}] '{}'",
                playlist_index, item_index, item.title
            );
            self.load_deadline = Some(now + LOAD_TIMEOUT_SECS);
        } else {
            let reason = self
                .player
                .last_error()
                .unwrap_or("unknown load error")
                .to_string();
            self.on_load_failure(playlists, base_dir, now, reason, events);
        }
    }

    fn on_load_failure(
        &mut self,
        playlists: &PlaylistSet,
        base_dir: &Path,
        now: f64,
        reason: String,
        events: &mut Vec<PlaybackEvent>,
    ) {
        self.consecutive_failures += 1;
        let title = self
            .current_item(playlists)
            .map(|i| i.title.clone())
            .unwrap_or_default();
        warn!(
            "Load failure #{} on '{}': {}",
            self.consecutive_failures, title, reason
        );

        if self.consecutive_failures >= 2 {
            events.push(PlaybackEvent::Status(format!("Playback failed: {reason}")));
            self.stop_to_menu(events);
            return;
        }

        events.push(PlaybackEvent::Status(format!("Skipping '{title}'")));
        self.advance(playlists, base_dir, now, events);
    }

    /// Move to the next item, honoring the playlist loop flag.
    pub fn next_item(
        &mut self,
        playlists: &PlaylistSet,
        base_dir: &Path,
        now: f64,
    ) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        self.advance(playlists, base_dir, now, &mut events);
        events
    }

    /// Move to the previous item, clamping at the first.
    pub fn previous_item(
        &mut self,
        playlists: &PlaylistSet,
        base_dir: &Path,
        now: f64,
    ) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let prev = (self.state.current_item_index - 1).max(0) as usize;
        self.try_load(
            playlists,
            self.state.current_playlist_index,
            prev,
            base_dir,
            now,
            &mut events,
        );
        events
    }

    fn advance(
        &mut self,
        playlists: &PlaylistSet,
        base_dir: &Path,
        now: f64,
        events: &mut Vec<PlaybackEvent>,
    ) {
        let playlist_index = self.state.current_playlist_index;
        let Some(playlist) = playlists.get(playlist_index) else {
            self.stop_to_menu(events);
            return;
        };

        let next = self.state.current_item_index + 1;
        if (next as usize) < playlist.len() {
            self.try_load(playlists, playlist_index, next as usize, base_dir, now, events);
        } else if playlist.loop_playback && !playlist.is_empty() {
            self.try_load(playlists, playlist_index, 0, base_dir, now, events);
        } else {
            info!("Playlist finished");
            self.stop_to_menu(events);
        }
    }

    /// Stop everything and report the menu return.
    pub fn stop(&mut self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        self.stop_to_menu(&mut events);
        events
    }

    fn stop_to_menu(&mut self, events: &mut Vec<PlaybackEvent>) {
        self.player.stop();
        self.state.clear();
        self.load_deadline = None;
        self.consecutive_failures = 0;
        events.push(PlaybackEvent::ReturnedToMenu);
    }

    /// Toggle pause; returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.player.set_paused(!self.player.is_paused());
        self.state.paused = paused;
        paused
    }

    /// Seek by `delta` seconds.
    pub fn seek(&mut self, delta: f64) {
        self.player.seek_relative(delta);
    }

    /// Change the base volume (master volume in percent) and apply it.
    pub fn set_base_volume(&mut self, percent: f64) {
        self.base_volume = percent.clamp(0.0, 100.0);
        self.player.set_volume(self.base_volume);
    }

    /// Apply a per-screen dip on top of the base volume, capturing the
    /// original once per playback session.
    pub fn apply_volume_factor(&mut self, factor: f64) {
        if self.state.original_volume.is_none() {
            self.state.original_volume = Some(self.base_volume);
        }
        let base = self.state.original_volume.unwrap_or(self.base_volume);
        self.player.set_volume(base * factor);
    }

    /// Current base volume in percent.
    pub fn base_volume(&self) -> f64 {
        self.base_volume
    }

    /// The item the cursor points at, if any.
    pub fn current_item<'a>(&self, playlists: &'a PlaylistSet) -> Option<&'a PlaylistItem> {
        if self.state.current_item_index < 0 {
            return None;
        }
        playlists
            .get(self.state.current_playlist_index)?
            .item(self.state.current_item_index as usize)
    }

    /// Newest decoded frame, if one arrived since last tick.
    pub fn poll_frame(&mut self) -> Option<tubebox_media::VideoFrame> {
        self.player.poll_frame()
    }

    /// Pump the pipeline and apply the per-tick policies. Called exactly
    /// once per frame.
    pub fn update(
        &mut self,
        playlists: &PlaylistSet,
        base_dir: &Path,
        now: f64,
    ) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        self.player.update();

        // Background pipeline errors surface here, on the main thread.
        if let Some(error) = self.player.take_error() {
            self.on_load_failure(playlists, base_dir, now, error, &mut events);
            return events;
        }

        self.state
            .observe(self.player.position(), self.player.duration());
        self.state.paused = self.player.is_paused();

        if self.state.is_switching_playlist && self.state.video_active {
            self.state.swap_settled();
            self.consecutive_failures = 0;
            self.load_deadline = None;
            events.push(PlaybackEvent::VideoUp);
        }

        // A load that said yes but never produced a stream is a failure too.
        if let Some(deadline) = self.load_deadline {
            if !self.state.video_active && now >= deadline {
                self.load_deadline = None;
                self.on_load_failure(
                    playlists,
                    base_dir,
                    now,
                    "no stream within timeout".to_string(),
                    &mut events,
                );
                return events;
            }
        }

        let sample_elapsed = self.sample_mode
            && self.state.video_active
            && self.state.position_seconds >= SAMPLE_MODE_SECS;

        if self.state.should_auto_advance() || sample_elapsed {
            self.state.mark_advanced();
            self.advance(playlists, base_dir, now, &mut events);
        }

        events
    }
}

/// Build the pipeline request for an item, resolving relative paths against
/// the playlist directory.
fn request_for(item: &PlaylistItem, base_dir: &Path, volume: f64) -> LoadRequest {
    let path = item.path.as_ref().map(|p| resolve_path(p, base_dir));
    LoadRequest {
        path,
        url: item.url.clone(),
        start: item.start,
        end: item.end,
        looping: false,
        volume,
    }
}

fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tubebox_media::VideoFrame;

    /// Scripted player: loads fail when the path contains "broken"; tests
    /// drive position/duration through the shared handle.
    #[derive(Default)]
    pub(crate) struct FakeInner {
        pub(crate) position: f64,
        pub(crate) duration: f64,
        pub(crate) paused: bool,
        pub(crate) playing: bool,
        pub(crate) eos: bool,
        pub(crate) loads: Vec<String>,
        pub(crate) stops: u32,
        pub(crate) volume: f64,
        pub(crate) error: Option<String>,
    }

    pub(crate) struct FakePlayer {
        inner: Arc<Mutex<FakeInner>>,
        last_error: Option<String>,
    }

    impl FakePlayer {
        pub(crate) fn new() -> (Self, Arc<Mutex<FakeInner>>) {
            let inner = Arc::new(Mutex::new(FakeInner::default()));
            (
                Self {
                    inner: inner.clone(),
                    last_error: None,
                },
                inner,
            )
        }
    }

    impl Player for FakePlayer {
        fn load(&mut self, request: &LoadRequest) -> bool {
            let mut inner = self.inner.lock().unwrap();
            let uri = request.uri().unwrap_or_default();
            if uri.contains("broken") {
                self.last_error = Some("file not found".to_string());
                return false;
            }
            inner.loads.push(uri);
            inner.playing = true;
            inner.position = 0.0;
            inner.duration = 0.0;
            inner.eos = false;
            inner.volume = request.volume;
            true
        }

        fn last_error(&self) -> Option<&str> {
            self.last_error.as_deref()
        }

        fn stop(&mut self) {
            let mut inner = self.inner.lock().unwrap();
            inner.stops += 1;
            inner.playing = false;
            inner.position = 0.0;
            inner.duration = 0.0;
        }

        fn set_paused(&mut self, paused: bool) -> bool {
            self.inner.lock().unwrap().paused = paused;
            paused
        }

        fn is_paused(&self) -> bool {
            self.inner.lock().unwrap().paused
        }

        fn seek_absolute(&mut self, seconds: f64) {
            self.inner.lock().unwrap().position = seconds;
        }

        fn set_volume(&mut self, percent: f64) {
            self.inner.lock().unwrap().volume = percent;
        }

        fn position(&self) -> f64 {
            self.inner.lock().unwrap().position
        }

        fn duration(&self) -> f64 {
            self.inner.lock().unwrap().duration
        }

        fn is_playing(&self) -> bool {
            self.inner.lock().unwrap().playing
        }

        fn is_eos(&self) -> bool {
            self.inner.lock().unwrap().eos
        }

        fn take_error(&mut self) -> Option<String> {
            self.inner.lock().unwrap().error.take()
        }

        fn poll_frame(&mut self) -> Option<VideoFrame> {
            None
        }

        fn update(&mut self) {}
    }

    pub(crate) fn media_item(title: &str, path: &str) -> PlaylistItem {
        PlaylistItem {
            title: title.to_string(),
            artist: String::new(),
            source_type: SourceType::Local,
            path: Some(PathBuf::from(path)),
            url: None,
            start: None,
            end: None,
            tags: None,
            emulator_core: None,
            emulator_system: None,
        }
    }

    pub(crate) fn set_with(items: Vec<PlaylistItem>, loop_playback: bool) -> PlaylistSet {
        PlaylistSet::new(vec![tubebox_core::Playlist {
            title: "T".to_string(),
            curator: "C".to_string(),
            description: None,
            loop_playback,
            items,
        }])
    }

    pub(crate) fn controller() -> (PlaybackController, Arc<Mutex<FakeInner>>) {
        let (player, inner) = FakePlayer::new();
        (PlaybackController::new(Box::new(player), 80.0), inner)
    }

    /// A controller mid-session, for orchestrator tests.
    pub(crate) fn controller_at_play() -> (PlaybackController, Arc<Mutex<FakeInner>>) {
        let (mut ctl, inner) = controller();
        let set = set_with(vec![media_item("a", "a.mp4")], false);
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);
        inner.lock().unwrap().duration = 30.0;
        inner.lock().unwrap().position = 0.1;
        ctl.update(&set, Path::new("/m"), 0.2);
        (ctl, inner)
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::*;
    use super::*;

    #[test]
    fn play_loads_and_settles() {
        let set = set_with(vec![media_item("a", "a.mp4")], false);
        let (mut ctl, inner) = controller();

        let events = ctl.play(&set, 0, 0, Path::new("/media"), 0.0);
        assert!(events.is_empty());
        assert!(ctl.state.is_switching_playlist);

        inner.lock().unwrap().duration = 30.0;
        inner.lock().unwrap().position = 0.2;
        let events = ctl.update(&set, Path::new("/media"), 0.5);
        assert_eq!(events, vec![PlaybackEvent::VideoUp]);
        assert!(!ctl.state.is_switching_playlist);
        assert!(ctl.state.video_active);
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let set = set_with(vec![media_item("a", "clips/a.mp4")], false);
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/media/playlists"), 0.0);
        assert_eq!(
            inner.lock().unwrap().loads[0],
            "file:///media/playlists/clips/a.mp4"
        );
    }

    #[test]
    fn auto_advance_fires_once_and_moves_on() {
        let set = set_with(
            vec![media_item("a", "a.mp4"), media_item("b", "b.mp4")],
            false,
        );
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        inner.lock().unwrap().duration = 30.0;
        inner.lock().unwrap().position = 29.8;
        ctl.update(&set, Path::new("/m"), 1.0);

        // The advance loaded item b.
        assert_eq!(ctl.state.current_item_index, 1);
        assert_eq!(inner.lock().unwrap().loads.len(), 2);
    }

    #[test]
    fn playlist_end_without_loop_returns_to_menu() {
        let set = set_with(vec![media_item("a", "a.mp4")], false);
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        inner.lock().unwrap().duration = 10.0;
        inner.lock().unwrap().position = 9.8;
        let events = ctl.update(&set, Path::new("/m"), 1.0);
        assert!(events.contains(&PlaybackEvent::ReturnedToMenu));
        assert_eq!(ctl.state.current_item_index, -1);
    }

    #[test]
    fn single_item_looping_playlist_wraps() {
        let set = set_with(vec![media_item("a", "a.mp4")], true);
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        inner.lock().unwrap().duration = 10.0;
        inner.lock().unwrap().position = 9.9;
        let events = ctl.update(&set, Path::new("/m"), 1.0);
        assert!(!events.contains(&PlaybackEvent::ReturnedToMenu));
        assert_eq!(ctl.state.current_item_index, 0);
        // Item 0 was loaded twice.
        assert_eq!(inner.lock().unwrap().loads.len(), 2);
    }

    #[test]
    fn broken_item_is_skipped_once() {
        let set = set_with(
            vec![
                media_item("a", "a.mp4"),
                media_item("bad", "broken.mp4"),
                media_item("c", "c.mp4"),
            ],
            false,
        );
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        // End of item 0 advances into the broken item, which skips to c.
        inner.lock().unwrap().duration = 10.0;
        inner.lock().unwrap().position = 9.8;
        let events = ctl.update(&set, Path::new("/m"), 1.0);

        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Status(msg) if msg.contains("Skipping"))));
        assert_eq!(ctl.state.current_item_index, 2);
    }

    #[test]
    fn two_consecutive_failures_stop_playback() {
        let set = set_with(
            vec![media_item("bad1", "broken1.mp4"), media_item("bad2", "broken2.mp4")],
            false,
        );
        let (mut ctl, inner) = controller();
        let events = ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        assert!(events.contains(&PlaybackEvent::ReturnedToMenu));
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Status(msg) if msg.contains("failed"))));
        assert_eq!(ctl.state.current_item_index, -1);
        assert!(inner.lock().unwrap().stops >= 1);
    }

    #[test]
    fn select_on_empty_playlist_is_a_no_op() {
        let set = set_with(vec![], false);
        let (mut ctl, inner) = controller();
        let events = ctl.play(&set, 0, 0, Path::new("/m"), 0.0);
        assert!(events.is_empty());
        assert!(inner.lock().unwrap().loads.is_empty());
    }

    #[test]
    fn stalled_load_times_out_into_skip() {
        let set = set_with(
            vec![media_item("a", "a.mp4"), media_item("b", "b.mp4")],
            false,
        );
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        // Stream never comes up; past the deadline the controller skips.
        let events = ctl.update(&set, Path::new("/m"), 2.5);
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Status(_))));
        assert_eq!(ctl.state.current_item_index, 1);
        assert_eq!(inner.lock().unwrap().loads.len(), 2);
    }

    #[test]
    fn volume_dip_captures_original_once() {
        let set = set_with(vec![media_item("a", "a.mp4")], false);
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        ctl.apply_volume_factor(0.75);
        assert_eq!(ctl.state.original_volume, Some(80.0));
        assert!((inner.lock().unwrap().volume - 60.0).abs() < 1e-9);

        // Second application does not re-capture a dipped value.
        ctl.apply_volume_factor(1.0);
        assert_eq!(ctl.state.original_volume, Some(80.0));
        assert!((inner.lock().unwrap().volume - 80.0).abs() < 1e-9);
    }

    #[test]
    fn background_error_skips_like_a_load_failure() {
        let set = set_with(
            vec![media_item("a", "a.mp4"), media_item("b", "b.mp4")],
            false,
        );
        let (mut ctl, inner) = controller();
        ctl.play(&set, 0, 0, Path::new("/m"), 0.0);

        inner.lock().unwrap().error = Some("decoder blew up".to_string());
        let events = ctl.update(&set, Path::new("/m"), 0.5);
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Status(_))));
        assert_eq!(ctl.state.current_item_index, 1);
    }
}
