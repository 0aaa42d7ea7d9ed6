//! Transition and fade orchestrator
//!
//! The state machine that decides what is drawn each frame. It owns no
//! resources: it mutates the screen enum, the single fade record, and the
//! player volume through the controller. Exactly one screen is current per
//! tick; the settings panel and virtual keyboard are overlays, not screens.

use crate::playback::{PlaybackController, PlaybackEvent};
use tracing::{debug, info};
use tubebox_core::fade::UI_ALPHA_EPSILON;
use tubebox_core::{Screen, UiState};

/// Default UI fade length, seconds
pub const FADE_DURATION: f32 = 1.0;

/// Intro fade-out length, seconds
pub const INTRO_FADE_SECS: f64 = 0.3;

/// Volume factor while the UI is composed over running video
pub const UI_VOLUME_FACTOR: f64 = 0.75;

/// Drives screen transitions and the fade/volume contracts
pub struct Orchestrator {
    /// The screen drawn this frame
    pub screen: Screen,
    fade_duration: f32,
    intro_fade_started: Option<f64>,
}

impl Orchestrator {
    /// Start in the intro (the engine downgrades to Menu when no intro
    /// file exists).
    pub fn new() -> Self {
        Self {
            screen: Screen::Intro,
            fade_duration: FADE_DURATION,
            intro_fade_started: None,
        }
    }

    /// Skip the intro entirely (no intro file present).
    pub fn skip_intro(&mut self, ui: &mut UiState) {
        ui.intro.complete = true;
        self.screen = Screen::Menu;
        ui.fade.set_immediate(true);
    }

    /// The intro pipeline delivered its first frame.
    pub fn intro_ready(&self, ui: &mut UiState) {
        if !ui.intro.ready {
            debug!("Intro first frame");
        }
        ui.intro.showing = true;
        ui.intro.ready = true;
    }

    /// The intro hit EOS; begin the black ramp.
    pub fn intro_finished(&mut self, now: f64, ui: &mut UiState) {
        if self.screen == Screen::Intro {
            ui.intro.fading_out = true;
            self.intro_fade_started = Some(now);
            self.screen = Screen::IntroFadeOut;
        }
    }

    /// Alpha of the black overlay during the intro fade-out.
    pub fn intro_overlay_alpha(&self, now: f64) -> f32 {
        match self.intro_fade_started {
            Some(start) => (((now - start) / INTRO_FADE_SECS) as f32).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    /// Advance time-driven transitions; call once per tick.
    pub fn tick(&mut self, now: f64, ui: &mut UiState) {
        if self.screen == Screen::IntroFadeOut && self.intro_overlay_alpha(now) >= 1.0 {
            info!("Intro complete, entering menu");
            ui.intro.fading_out = false;
            ui.intro.showing = false;
            ui.intro.complete = true;
            self.intro_fade_started = None;
            self.screen = Screen::Menu;
            ui.fade.set_immediate(true);
        }
    }

    /// A media item was selected in the menu.
    pub fn begin_load(&mut self, ui: &mut UiState) {
        self.screen = Screen::Load;
        ui.fade.set_immediate(true);
        ui.ui_visible_when_playing = true;
    }

    /// Apply controller events to the screen machine.
    pub fn on_playback_events(
        &mut self,
        events: &[PlaybackEvent],
        now: f64,
        ui: &mut UiState,
        playback: &mut PlaybackController,
    ) {
        for event in events {
            match event {
                PlaybackEvent::VideoUp => {
                    if self.screen == Screen::Load || self.screen.shows_video() {
                        // First entry plays at full volume; the dip only
                        // applies when the UI is brought back over video.
                        playback.apply_volume_factor(1.0);
                        self.screen = if ui.ui_visible_when_playing {
                            Screen::PlayUi
                        } else {
                            Screen::PlayClean
                        };
                        ui.fade.set_immediate(ui.ui_visible_when_playing);
                    }
                }
                PlaybackEvent::ReturnedToMenu => {
                    // Do not bounce to menu while an item swap is settling.
                    if !playback.state.is_switching_playlist
                        && self.screen != Screen::Handoff
                        && self.screen != Screen::Recovery
                    {
                        self.screen = Screen::Menu;
                        ui.fade.set_immediate(true);
                        playback.set_base_volume(playback.base_volume());
                    }
                }
                PlaybackEvent::Status(message) => {
                    ui.set_status(message.clone(), now);
                }
            }
        }
    }

    /// SELECT while video is on screen toggles composed UI vs clean video.
    pub fn toggle_play_screen(
        &mut self,
        now: f64,
        ui: &mut UiState,
        playback: &mut PlaybackController,
    ) {
        match self.screen {
            Screen::PlayUi => {
                self.screen = Screen::PlayClean;
                ui.ui_visible_when_playing = false;
                ui.fade.start(now, self.fade_duration, false);
                playback.apply_volume_factor(1.0);
            }
            Screen::PlayClean => {
                self.screen = Screen::PlayUi;
                ui.ui_visible_when_playing = true;
                ui.fade.start(now, self.fade_duration, true);
                playback.apply_volume_factor(UI_VOLUME_FACTOR);
            }
            _ => {}
        }
    }

    /// The display is about to be handed to the emulator.
    pub fn begin_handoff(&mut self, ui: &mut UiState) {
        self.screen = Screen::Handoff;
        ui.is_loading_game = true;
    }

    /// Handoff returned; GL is being rebuilt.
    pub fn begin_recovery(&mut self) {
        self.screen = Screen::Recovery;
    }

    /// Recovery done, back to the menu.
    pub fn recovery_complete(&mut self, ui: &mut UiState) {
        ui.is_loading_game = false;
        self.screen = Screen::Menu;
        ui.fade.set_immediate(true);
    }

    /// The UI alpha for this frame. Fixed at 1 whenever no video is active
    /// (menus never fade); otherwise the single fade record decides.
    pub fn ui_alpha(&self, now: f64, ui: &mut UiState, video_active: bool) -> f32 {
        if !video_active {
            ui.fade.set_immediate(true);
            return 1.0;
        }
        ui.fade.alpha(now)
    }

    /// Whether the UI block can be skipped entirely this frame.
    pub fn ui_skipped(alpha: f32) -> bool {
        alpha < UI_ALPHA_EPSILON
    }

    /// Whether the loading spinner overlay is drawn.
    pub fn loading_visible(&self, ui: &UiState, playback: &PlaybackController) -> bool {
        ui.is_loading_game
            || self.screen == Screen::Load
            || (self.screen.shows_video() && playback.state.is_switching_playlist)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_sequence_reaches_menu() {
        let mut orch = Orchestrator::new();
        let mut ui = UiState::default();

        assert_eq!(orch.screen, Screen::Intro);
        orch.intro_ready(&mut ui);
        assert!(ui.intro.ready);

        orch.intro_finished(1.0, &mut ui);
        assert_eq!(orch.screen, Screen::IntroFadeOut);
        assert!(orch.intro_overlay_alpha(1.15) > 0.4);
        assert!(orch.intro_overlay_alpha(1.15) < 0.6);

        orch.tick(1.35, &mut ui);
        assert_eq!(orch.screen, Screen::Menu);
        assert!(ui.intro.complete);
    }

    #[test]
    fn skip_intro_goes_straight_to_menu() {
        let mut orch = Orchestrator::new();
        let mut ui = UiState::default();
        orch.skip_intro(&mut ui);
        assert_eq!(orch.screen, Screen::Menu);
        assert!(ui.intro.complete);
    }

    #[test]
    fn menu_alpha_is_always_one() {
        let orch = Orchestrator::new();
        let mut ui = UiState::default();
        ui.fade.start(0.0, 1.0, false);
        // No video: alpha pinned at 1 regardless of the fade record.
        assert_eq!(orch.ui_alpha(0.5, &mut ui, false), 1.0);
    }

    #[test]
    fn exactly_one_screen_is_current() {
        // The screen is a single enum value by construction; this guards
        // against the orchestrator ever "losing" it mid-transition.
        let mut orch = Orchestrator::new();
        let mut ui = UiState::default();
        orch.skip_intro(&mut ui);
        orch.begin_load(&mut ui);
        assert_eq!(orch.screen, Screen::Load);
        orch.begin_handoff(&mut ui);
        assert_eq!(orch.screen, Screen::Handoff);
        orch.begin_recovery();
        assert_eq!(orch.screen, Screen::Recovery);
        orch.recovery_complete(&mut ui);
        assert_eq!(orch.screen, Screen::Menu);
    }

    #[test]
    fn play_screen_toggle_drives_fade_and_volume() {
        use crate::playback::tests_support::controller_at_play;

        let (mut playback, inner) = controller_at_play();
        let mut orch = Orchestrator::new();
        let mut ui = UiState::default();
        orch.skip_intro(&mut ui);
        orch.screen = Screen::PlayUi;

        // Drop to clean: fade target invisible, volume back to original.
        orch.toggle_play_screen(10.0, &mut ui, &mut playback);
        assert_eq!(orch.screen, Screen::PlayClean);
        assert!(!ui.ui_visible_when_playing);
        let mid = ui.fade.alpha(10.5);
        assert!(mid > 0.4 && mid < 0.6);
        assert!((inner.lock().unwrap().volume - 80.0).abs() < 1e-9);

        // Bring it back: dip to 75% of the captured original.
        orch.toggle_play_screen(11.5, &mut ui, &mut playback);
        assert_eq!(orch.screen, Screen::PlayUi);
        assert!((inner.lock().unwrap().volume - 60.0).abs() < 1e-9);
    }

    #[test]
    fn retarget_mid_fade_takes_new_target() {
        use crate::playback::tests_support::controller_at_play;

        let (mut playback, _) = controller_at_play();
        let mut orch = Orchestrator::new();
        let mut ui = UiState::default();
        orch.screen = Screen::PlayUi;

        orch.toggle_play_screen(0.0, &mut ui, &mut playback);
        // Halfway down, toggle back up: progress resets toward visible.
        let _ = ui.fade.alpha(0.5);
        orch.toggle_play_screen(0.5, &mut ui, &mut playback);
        assert!(ui.fade.alpha(0.5) < 0.05);
        assert!(ui.fade.alpha(1.5) > 0.95);
    }

    #[test]
    fn ui_skip_threshold() {
        assert!(Orchestrator::ui_skipped(0.0));
        assert!(Orchestrator::ui_skipped(0.005));
        assert!(!Orchestrator::ui_skipped(0.05));
    }
}
