//! The engine: poll input, update state, render one frame, swap
//!
//! Single-threaded and cooperative. The only blocking points are the buffer
//! swap inside `Surface::present` (vsync) and the emulator wait inside the
//! handoff. Everything else in the loop is a non-blocking poll.

use crate::handoff::{self, EmulatorLaunch};
use crate::orchestrator::Orchestrator;
use crate::playback::{PlaybackController, PlaybackEvent};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};
use tubebox_core::{
    menu::{next_effect_step, MenuCommand},
    KeyboardOutcome, MenuManager, Screen, Settings, UiState, VirtualKeyboard,
};
use tubebox_input::{InputAction, InputSource, Keymap};
use tubebox_io::{DirWatcher, PlaylistLibrary, SettingsStore};
use tubebox_media::{GstPlayer, LoadRequest, Player};
use tubebox_render::{upload_rgba_texture, CrtPass, Draw2d, FontAtlas, Surface, VideoTextures};
use tubebox_ui::{screens, QrPane, UiFrame};

/// Seek step for a short press, seconds
const SEEK_SHORT: f64 = 10.0;
/// Seek step for a long press, seconds
const SEEK_LONG: f64 = 60.0;
/// Volume step per key press, percent
const VOLUME_STEP: i32 = 5;

/// Why the loop ended, mapped to the process exit code by main
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineExit {
    /// QUIT action
    Clean,
    /// Display could not be recovered
    DisplayLost,
}

/// Filesystem layout and identity, resolved once at startup
pub struct EngineConfig {
    pub playlist_dir: PathBuf,
    pub settings_path: PathBuf,
    pub display_font: PathBuf,
    pub body_font: PathBuf,
    pub intro_path: PathBuf,
    pub bezel_dir: PathBuf,
    pub admin_url: String,
}

impl EngineConfig {
    /// Defaults for the appliance image, each overridable by environment.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            playlist_dir: PathBuf::from(var("TUBEBOX_PLAYLISTS", "/media/playlists")),
            settings_path: PathBuf::from(var("TUBEBOX_SETTINGS", "/media/settings.json")),
            display_font: PathBuf::from(var(
                "TUBEBOX_DISPLAY_FONT",
                "/opt/tubebox/fonts/display.ttf",
            )),
            body_font: PathBuf::from(var("TUBEBOX_BODY_FONT", "/opt/tubebox/fonts/body.ttf")),
            intro_path: PathBuf::from(var("TUBEBOX_INTRO", "/media/intro.mp4")),
            bezel_dir: PathBuf::from(var("TUBEBOX_BEZELS", "/opt/tubebox/bezels")),
            admin_url: var("TUBEBOX_ADMIN_URL", "http://tubebox.local/"),
        }
    }
}

/// Bezel overlay images: decoded once, textures rebuilt lazily after resets
struct BezelOverlay {
    paths: Vec<PathBuf>,
    textures: HashMap<i32, glow::NativeTexture>,
}

impl BezelOverlay {
    fn scan(dir: &Path) -> Self {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| {
                        p.extension()
                            .and_then(|e| e.to_str())
                            .map(|e| matches!(e, "png" | "jpg" | "jpeg"))
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        info!("{} bezel images available", paths.len());
        Self {
            paths,
            textures: HashMap::new(),
        }
    }

    fn count(&self) -> i32 {
        self.paths.len() as i32
    }

    fn path(&self, index: i32) -> Option<&PathBuf> {
        if index < 0 {
            return None;
        }
        self.paths.get(index as usize)
    }

    fn reset_gl(&mut self) {
        self.textures.clear();
    }

    fn texture(&mut self, gl: &glow::Context, index: i32) -> Option<glow::NativeTexture> {
        if let Some(texture) = self.textures.get(&index) {
            return Some(*texture);
        }
        let path = self.path(index)?;
        let image = match image::open(path) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                warn!("Bezel {:?} unreadable: {}", path, e);
                return None;
            }
        };
        let (w, h) = image.dimensions();
        match upload_rgba_texture(gl, w, h, image.as_raw()) {
            Ok(texture) => {
                self.textures.insert(index, texture);
                Some(texture)
            }
            Err(e) => {
                warn!("Bezel upload failed: {}", e);
                None
            }
        }
    }
}

/// The whole appliance
pub struct Engine {
    config: EngineConfig,
    surface: Surface,
    draw: Draw2d,
    fonts: FontAtlas,
    crt: CrtPass,
    video: VideoTextures,
    bezel: BezelOverlay,
    input: InputSource,
    library: PlaylistLibrary,
    watcher: DirWatcher,
    settings_store: SettingsStore,
    settings: Settings,
    playback: PlaybackController,
    intro_player: Option<Box<dyn Player>>,
    orchestrator: Orchestrator,
    ui: UiState,
    menu: MenuManager,
    keyboard: VirtualKeyboard,
    qr: QrPane,
    admin_url: String,
    started: Instant,
    quit: Option<EngineExit>,
}

impl Engine {
    /// Bring up every subsystem. Any failure here is fatal (exit code 1).
    pub fn new(config: EngineConfig, settings_store: SettingsStore, settings: Settings) -> Result<Self> {
        let surface = Surface::open().context("display initialization failed")?;
        let fonts = FontAtlas::new(&config.display_font, &config.body_font)
            .context("font initialization failed")?;
        let input = InputSource::new(Keymap::default()).context("input initialization failed")?;

        let library =
            PlaylistLibrary::open(&config.playlist_dir).context("playlist scan failed")?;

        // Watch whatever actually exists; the settings file may not yet.
        let settings_dir = config
            .settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let mut watch_paths = vec![config.playlist_dir.as_path()];
        if settings_dir.exists() {
            watch_paths.push(settings_dir.as_path());
        }
        let watcher = DirWatcher::new(&watch_paths).context("file watcher failed")?;

        let player = tubebox_media::default_player(settings.audio_output);
        let playback = PlaybackController::new(player, settings.master_volume as f64);

        let bezel = BezelOverlay::scan(&config.bezel_dir);

        let ui = UiState {
            master_volume: settings.master_volume,
            ..Default::default()
        };

        let mut qr = QrPane::new();
        let admin_url = config.admin_url.clone();
        qr.set_url(&admin_url);

        Ok(Self {
            config,
            surface,
            draw: Draw2d::new(),
            fonts,
            crt: CrtPass::new(),
            video: VideoTextures::new(),
            bezel,
            input,
            library,
            watcher,
            settings_store,
            settings,
            playback,
            intro_player: None,
            orchestrator: Orchestrator::new(),
            ui,
            menu: MenuManager::new(),
            keyboard: VirtualKeyboard::default(),
            qr,
            admin_url,
            started: Instant::now(),
            quit: None,
        })
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// The input -> update -> render loop. Returns when QUIT arrives or the
    /// display is lost for good.
    pub fn run(&mut self) -> EngineExit {
        self.start_intro();

        loop {
            let now = self.now();

            for action in self.input.poll() {
                self.handle_action(action, now);
            }
            if let Some(exit) = self.quit {
                self.playback.stop();
                info!("Engine loop ending: {:?}", exit);
                return exit;
            }

            if self.watcher.changed() {
                self.reload_files();
            }

            self.update_intro(now);

            let events = self
                .playback
                .update(self.library.set(), &self.config.playlist_dir, now);
            if events.contains(&PlaybackEvent::ReturnedToMenu) {
                self.video.clear();
            }
            self.orchestrator
                .on_playback_events(&events, now, &mut self.ui, &mut self.playback);
            self.orchestrator.tick(now, &mut self.ui);

            if let Err(e) = self.render(now) {
                error!("Render error: {}", e);
            }
            match self.surface.present() {
                Ok(()) => {}
                Err(e) => {
                    error!("Present failed: {}", e);
                    return EngineExit::DisplayLost;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Intro
    // ------------------------------------------------------------------

    fn start_intro(&mut self) {
        if !self.config.intro_path.exists() {
            info!("No intro at {:?}, entering menu", self.config.intro_path);
            self.orchestrator.skip_intro(&mut self.ui);
            return;
        }

        let mut player: Box<dyn Player> = Box::new(GstPlayer::new(self.settings.audio_output));
        let request = LoadRequest {
            path: Some(self.config.intro_path.clone()),
            volume: self.settings.master_volume as f64,
            ..Default::default()
        };
        if player.load(&request) {
            self.ui.intro.showing = true;
            self.intro_player = Some(player);
        } else {
            warn!("Intro failed to load, entering menu");
            self.orchestrator.skip_intro(&mut self.ui);
        }
    }

    fn update_intro(&mut self, now: f64) {
        let Some(player) = self.intro_player.as_mut() else {
            return;
        };
        player.update();

        if let Some(frame) = player.poll_frame() {
            self.video.upload(self.surface.gl(), &frame);
            self.orchestrator.intro_ready(&mut self.ui);
        }

        let failed = player.take_error().is_some();
        if failed || player.is_eos() {
            self.orchestrator.intro_finished(now, &mut self.ui);
        }

        if self.ui.intro.complete {
            player.stop();
            self.intro_player = None;
            self.video.clear();
        }
    }

    // ------------------------------------------------------------------
    // Input handling
    // ------------------------------------------------------------------

    fn handle_action(&mut self, action: InputAction, now: f64) {
        // The intro blocks everything except QUIT.
        if !self.orchestrator.screen.accepts_input() {
            if action == InputAction::Quit {
                self.quit = Some(EngineExit::Clean);
            }
            return;
        }

        if self.keyboard.active {
            self.handle_keyboard_action(action);
            return;
        }

        match action {
            InputAction::Quit => {
                self.quit = Some(EngineExit::Clean);
            }
            InputAction::Settings => {
                self.ui.settings_open = !self.ui.settings_open;
                if self.ui.settings_open {
                    self.menu.reset();
                }
            }
            InputAction::SampleMode => {
                self.playback.sample_mode = !self.playback.sample_mode;
                let state = if self.playback.sample_mode { "on" } else { "off" };
                self.ui.set_status(format!("Sample mode {state}"), now);
            }
            InputAction::VolumeUp | InputAction::VolumeDown => {
                let delta = if action == InputAction::VolumeUp {
                    VOLUME_STEP
                } else {
                    -VOLUME_STEP
                };
                let volume = self.ui.adjust_volume(delta, now);
                self.playback.set_base_volume(volume as f64);
                self.settings.master_volume = volume;
                self.save_settings();
            }
            _ if self.ui.settings_open => self.handle_menu_action(action, now),
            _ => self.handle_screen_action(action, now),
        }
    }

    fn handle_keyboard_action(&mut self, action: InputAction) {
        let outcome = match action {
            InputAction::NavPrev => {
                self.keyboard.move_horizontal(-1);
                return;
            }
            InputAction::NavNext => {
                self.keyboard.move_horizontal(1);
                return;
            }
            InputAction::VolumeUp => {
                self.keyboard.move_vertical(-1);
                return;
            }
            InputAction::VolumeDown => {
                self.keyboard.move_vertical(1);
                return;
            }
            InputAction::Select => self.keyboard.select(),
            InputAction::Back => self.keyboard.cancel(),
            _ => return,
        };

        match outcome {
            KeyboardOutcome::Committed(text) => {
                info!("Admin URL set to {}", text);
                self.admin_url = text;
                self.qr.set_url(&self.admin_url);
            }
            KeyboardOutcome::Cancelled | KeyboardOutcome::Consumed => {}
        }
    }

    fn handle_menu_action(&mut self, action: InputAction, now: f64) {
        match action {
            InputAction::NavPrev => {
                self.menu.navigate(-1, &self.settings, self.library.set());
            }
            InputAction::NavNext => {
                self.menu.navigate(1, &self.settings, self.library.set());
            }
            InputAction::Back => {
                if !self.menu.back() {
                    self.ui.settings_open = false;
                    self.menu.reset();
                }
            }
            InputAction::Select => {
                if let Some(command) = self.menu.select(&self.settings, self.library.set()) {
                    self.run_menu_command(command, now);
                }
            }
            _ => {}
        }
    }

    fn run_menu_command(&mut self, command: MenuCommand, now: f64) {
        match command {
            MenuCommand::Close => {
                self.ui.settings_open = false;
                self.menu.reset();
            }
            MenuCommand::ToggleDisplayMode => {
                self.settings.display_mode = self.settings.display_mode.toggled();
                self.save_settings();
            }
            MenuCommand::CycleBezel => {
                let count = self.bezel.count();
                self.settings.bezel_index = if self.settings.bezel_index + 1 >= count {
                    -1
                } else {
                    self.settings.bezel_index + 1
                };
                self.save_settings();
            }
            MenuCommand::CycleEffect(kind) => {
                let current = kind.get(&self.settings.effects);
                kind.set(&mut self.settings.effects, next_effect_step(current));
                self.save_settings();
            }
            MenuCommand::CycleAudioOutput => {
                use tubebox_core::AudioOutput;
                self.settings.audio_output = match self.settings.audio_output {
                    AudioOutput::Hdmi => AudioOutput::Headphone,
                    AudioOutput::Headphone => AudioOutput::Auto,
                    AudioOutput::Auto => AudioOutput::Hdmi,
                };
                // Output changes require a stopped pipeline; the next load
                // picks up the new sink.
                let events = self.playback.stop();
                self.video.clear();
                self.orchestrator
                    .on_playback_events(&events, now, &mut self.ui, &mut self.playback);
                self.playback.set_audio_output(self.settings.audio_output);
                self.save_settings();
            }
            MenuCommand::AdjustGameVolume(step) => {
                let mut db = self.settings.game_volume_db + step;
                if db > 12.0 {
                    db = -12.0;
                }
                self.settings.game_volume_db = db;
                self.save_settings();
            }
            MenuCommand::EditAdminUrl => {
                self.keyboard.open("Admin URL", self.admin_url.clone());
            }
            MenuCommand::LaunchGame {
                playlist_index,
                item_index,
            } => {
                self.launch_game(playlist_index, item_index);
            }
            MenuCommand::Enter(_) => {
                // Section navigation is resolved inside the menu manager.
            }
        }
    }

    fn handle_screen_action(&mut self, action: InputAction, now: f64) {
        match self.orchestrator.screen {
            Screen::Menu => match action {
                InputAction::NavPrev => {
                    self.ui.select_playlist(-1, self.library.set().media_count());
                }
                InputAction::NavNext => {
                    self.ui.select_playlist(1, self.library.set().media_count());
                }
                InputAction::Select | InputAction::PlayToggle => {
                    self.select_current_playlist(now);
                }
                _ => {}
            },
            Screen::PlayUi | Screen::PlayClean => match action {
                InputAction::Select => {
                    self.orchestrator
                        .toggle_play_screen(now, &mut self.ui, &mut self.playback);
                }
                InputAction::PlayToggle => {
                    self.playback.toggle_pause();
                }
                InputAction::SeekBack { long } => {
                    self.playback.seek(-seek_step(long));
                }
                InputAction::SeekFwd { long } => {
                    self.playback.seek(seek_step(long));
                }
                InputAction::NavNext => {
                    let events =
                        self.playback
                            .next_item(self.library.set(), &self.config.playlist_dir, now);
                    self.orchestrator
                        .on_playback_events(&events, now, &mut self.ui, &mut self.playback);
                }
                InputAction::NavPrev => {
                    let events = self.playback.previous_item(
                        self.library.set(),
                        &self.config.playlist_dir,
                        now,
                    );
                    self.orchestrator
                        .on_playback_events(&events, now, &mut self.ui, &mut self.playback);
                }
                InputAction::Back => {
                    let events = self.playback.stop();
                    self.video.clear();
                    self.orchestrator
                        .on_playback_events(&events, now, &mut self.ui, &mut self.playback);
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn select_current_playlist(&mut self, now: f64) {
        let Some((absolute_index, playlist)) = self
            .library
            .set()
            .media()
            .nth(self.ui.selected_playlist_index)
        else {
            return;
        };
        if playlist.is_empty() {
            return;
        }

        self.orchestrator.begin_load(&mut self.ui);
        let events = self
            .playback
            .play(self.library.set(), absolute_index, 0, &self.config.playlist_dir, now);
        self.orchestrator
            .on_playback_events(&events, now, &mut self.ui, &mut self.playback);
    }

    // ------------------------------------------------------------------
    // Game handoff
    // ------------------------------------------------------------------

    fn launch_game(&mut self, playlist_index: usize, item_index: usize) {
        let Some(item) = self
            .library
            .set()
            .get(playlist_index)
            .and_then(|p| p.item(item_index))
            .cloned()
        else {
            return;
        };

        let bezel_path = self.bezel.path(self.settings.bezel_index).cloned();
        let Some(launch) =
            EmulatorLaunch::for_item(&item, &self.config.playlist_dir, bezel_path)
        else {
            warn!("Game item '{}' is incomplete", item.title);
            return;
        };

        self.orchestrator.begin_handoff(&mut self.ui);
        self.playback.stop();
        self.video.clear();

        // One black frame so the operator never sees a stale menu while the
        // emulator boots.
        if let Err(e) = self.render(self.now()) {
            warn!("Pre-handoff frame failed: {}", e);
        }
        if let Err(e) = self.surface.present() {
            warn!("Pre-handoff present failed: {}", e);
        }

        match handoff::run(&mut self.surface, &launch) {
            Ok(status) => {
                info!("Back from emulator ({})", status);
            }
            Err(e) => {
                error!("Handoff unrecoverable: {}", e);
                self.quit = Some(EngineExit::DisplayLost);
                return;
            }
        }

        self.orchestrator.begin_recovery();
        // Every GL handle predating the handoff is dead; forget them all.
        self.draw.reset_gl();
        self.fonts.reset_gl();
        self.crt.reset_gl();
        self.video.reset_gl();
        self.bezel.reset_gl();
        self.surface.assert_baseline_gl_state();
        self.orchestrator.recovery_complete(&mut self.ui);
        self.ui.settings_open = false;
        self.menu.reset();
    }

    // ------------------------------------------------------------------
    // File watching
    // ------------------------------------------------------------------

    fn reload_files(&mut self) {
        let now = self.now();
        match self.library.reload() {
            Ok(skipped) => {
                self.ui.clamp_selection(self.library.set().media_count());
                if let Some((path, reason)) = skipped.first() {
                    warn!("Playlist skipped on reload: {:?}: {}", path, reason);
                    self.ui.set_status(
                        format!(
                            "Ignored {}",
                            path.file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_default()
                        ),
                        now,
                    );
                }
                // The playing playlist may be gone or reshaped; stop rather
                // than play into a stale cursor.
                if self.playback.state.current_item_index >= 0
                    && self
                        .library
                        .set()
                        .get(self.playback.state.current_playlist_index)
                        .map(|p| self.playback.state.current_item_index as usize >= p.len())
                        .unwrap_or(true)
                {
                    let events = self.playback.stop();
                    self.video.clear();
                    self.orchestrator.on_playback_events(
                        &events,
                        now,
                        &mut self.ui,
                        &mut self.playback,
                    );
                }
            }
            Err(e) => warn!("Playlist reload failed: {}", e),
        }

        let fresh = self.settings_store.load();
        if fresh != self.settings {
            info!("Settings changed on disk, adopting");
            self.settings = fresh;
            self.ui.master_volume = self.settings.master_volume;
            self.playback
                .set_base_volume(self.settings.master_volume as f64);
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings_store.save(&self.settings) {
            error!("Settings save failed: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn render(&mut self, now: f64) -> Result<()> {
        let (width, height) = self.surface.original_resolution();
        let viewport = self.surface.content_viewport();
        let gl = self.surface.gl();

        self.draw.begin_frame(gl, width, height)?;

        let video_active = self.playback.state.video_active;
        let alpha = self
            .orchestrator
            .ui_alpha(now, &mut self.ui, video_active);

        let screen = self.orchestrator.screen;
        match screen {
            Screen::Intro | Screen::IntroFadeOut => {
                self.draw.clear(gl, tubebox_render::Color::BLACK);
                if self.ui.intro.ready {
                    self.video.draw(gl, viewport, (width, height), 1.0)?;
                }
                let overlay = self.orchestrator.intro_overlay_alpha(now);
                if overlay > 0.0 {
                    let mut frame = UiFrame {
                        gl,
                        draw: &mut self.draw,
                        fonts: &mut self.fonts,
                        size: (width, height),
                        time: now,
                    };
                    screens::draw_black_overlay(&mut frame, overlay);
                }
            }
            Screen::Handoff | Screen::Recovery => {
                self.draw.clear(gl, tubebox_render::Color::BLACK);
            }
            Screen::Menu | Screen::Load => {
                self.draw.clear(gl, tubebox_ui::theme::BACKGROUND);
                let mut frame = UiFrame {
                    gl,
                    draw: &mut self.draw,
                    fonts: &mut self.fonts,
                    size: (width, height),
                    time: now,
                };
                screens::draw_menu(&mut frame, self.library.set(), &self.ui);
            }
            Screen::PlayUi | Screen::PlayClean => {
                self.draw.clear(gl, tubebox_render::Color::BLACK);

                if let Some(frame) = self.playback.poll_frame() {
                    self.video.upload(gl, &frame);
                }
                self.video.draw(gl, viewport, (width, height), 1.0)?;

                if let Some(texture) = self.bezel.texture(gl, self.settings.bezel_index) {
                    self.draw.textured_rect(
                        gl,
                        texture,
                        0.0,
                        0.0,
                        width as f32,
                        height as f32,
                        tubebox_render::Color::WHITE,
                    );
                }

                if !Orchestrator::ui_skipped(alpha) && screen == Screen::PlayUi {
                    self.draw.set_alpha(alpha);
                    let item = self.playback.current_item(self.library.set()).cloned();
                    let mut frame = UiFrame {
                        gl,
                        draw: &mut self.draw,
                        fonts: &mut self.fonts,
                        size: (width, height),
                        time: now,
                    };
                    screens::draw_darkener(&mut frame);
                    if let Some(item) = item {
                        screens::draw_now_playing(
                            &mut frame,
                            &item.title,
                            &item.artist,
                            self.playback.state.position_seconds,
                            self.playback.state.duration_seconds,
                        );
                    }
                }
            }
        }

        // Overlays ride on whatever screen is under them (never the intro).
        if !screen.in_intro() && screen != Screen::Handoff && screen != Screen::Recovery {
            let loading = self.orchestrator.loading_visible(&self.ui, &self.playback);
            let status = self.ui.status_text(now).map(|s| s.to_string());
            let volume_visible = self.ui.volume_overlay_visible(now);

            let mut frame = UiFrame {
                gl,
                draw: &mut self.draw,
                fonts: &mut self.fonts,
                size: (width, height),
                time: now,
            };

            if loading {
                screens::draw_loading(&mut frame, "Loading...");
            }
            if self.ui.settings_open {
                screens::draw_settings_overlay(
                    &mut frame,
                    &self.menu,
                    &self.settings,
                    self.library.set(),
                );
                if self.menu.section() == tubebox_core::MenuSection::Info {
                    let x = width as f32 * 0.62;
                    let y = height as f32 * 0.22;
                    self.qr
                        .draw(gl, frame.draw, x, y, height as f32 * 0.35);
                }
            }
            if self.keyboard.active {
                screens::draw_keyboard(&mut frame, &self.keyboard);
            }
            if let Some(text) = status {
                screens::draw_status_line(&mut frame, &text);
            }
            if volume_visible {
                screens::draw_volume_overlay(&mut frame, self.ui.master_volume);
            }
        }

        self.draw.set_alpha(1.0);

        // Post-process last. Scanlines stay allowed whenever the pass runs;
        // the operator turns them off through the intensity setting.
        self.crt
            .render(gl, &self.settings.effects, (width, height), now, true)?;

        Ok(())
    }
}

fn seek_step(long: bool) -> f64 {
    if long {
        SEEK_LONG
    } else {
        SEEK_SHORT
    }
}
