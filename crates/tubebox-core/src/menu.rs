//! Settings menu tree and game browser
//!
//! The tree is fixed in structure but dynamic in labels: entries are
//! re-emitted from current state every time they are listed, so there is no
//! second copy of any setting to fall out of sync. Selection is kept per
//! level and restored when backing out.

use crate::playlist::PlaylistSet;
use crate::settings::{AudioOutput, DisplayMode, EffectLevels, Settings};
use serde::{Deserialize, Serialize};

/// Sections of the settings menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuSection {
    /// Top level
    Root,
    /// Display mode + bezel
    Display,
    /// Output routing + game volume
    Audio,
    /// CRT effect intensities
    Effects,
    /// Game playlist browser
    Games,
    /// About pane with the admin URL QR code
    Info,
}

/// One of the seven CRT effects, for menu cycling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Scanline darkening
    Scanlines,
    /// Warm tint
    Warmth,
    /// Glow
    Glow,
    /// RGB phosphor mask
    RgbMask,
    /// Bloom
    Bloom,
    /// Interlace jitter
    Interlace,
    /// Flicker
    Flicker,
}

impl EffectKind {
    /// All effects in menu order
    pub const ALL: [EffectKind; 7] = [
        EffectKind::Scanlines,
        EffectKind::Warmth,
        EffectKind::Glow,
        EffectKind::RgbMask,
        EffectKind::Bloom,
        EffectKind::Interlace,
        EffectKind::Flicker,
    ];

    /// Menu label stem
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Scanlines => "Scanlines",
            EffectKind::Warmth => "Warmth",
            EffectKind::Glow => "Glow",
            EffectKind::RgbMask => "RGB Mask",
            EffectKind::Bloom => "Bloom",
            EffectKind::Interlace => "Interlace",
            EffectKind::Flicker => "Flicker",
        }
    }

    /// Read this effect's intensity.
    pub fn get(self, levels: &EffectLevels) -> f32 {
        match self {
            EffectKind::Scanlines => levels.scanlines,
            EffectKind::Warmth => levels.warmth,
            EffectKind::Glow => levels.glow,
            EffectKind::RgbMask => levels.rgb_mask,
            EffectKind::Bloom => levels.bloom,
            EffectKind::Interlace => levels.interlace,
            EffectKind::Flicker => levels.flicker,
        }
    }

    /// Write this effect's intensity.
    pub fn set(self, levels: &mut EffectLevels, value: f32) {
        match self {
            EffectKind::Scanlines => levels.scanlines = value,
            EffectKind::Warmth => levels.warmth = value,
            EffectKind::Glow => levels.glow = value,
            EffectKind::RgbMask => levels.rgb_mask = value,
            EffectKind::Bloom => levels.bloom = value,
            EffectKind::Interlace => levels.interlace = value,
            EffectKind::Flicker => levels.flicker = value,
        }
    }
}

/// The named intensity steps the menu cycles through
pub const EFFECT_STEPS: [(f32, &str); 4] = [
    (0.0, "Off"),
    (0.25, "Low"),
    (0.5, "Medium"),
    (1.0, "High"),
];

/// Label for an intensity, snapping to the nearest step name.
pub fn effect_step_name(value: f32) -> &'static str {
    let mut best = EFFECT_STEPS[0];
    for step in EFFECT_STEPS {
        if (value - step.0).abs() < (value - best.0).abs() {
            best = step;
        }
    }
    best.1
}

/// The step after `value`, wrapping High -> Off.
pub fn next_effect_step(value: f32) -> f32 {
    for (i, (step, _)) in EFFECT_STEPS.iter().enumerate() {
        if (value - step).abs() < 0.125 {
            return EFFECT_STEPS[(i + 1) % EFFECT_STEPS.len()].0;
        }
    }
    EFFECT_STEPS[0].0
}

/// What a SELECT on a menu entry asks the application to do
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    /// Descend into a section
    Enter(MenuSection),
    /// Close the whole settings overlay
    Close,
    /// Flip CRT native / modern TV
    ToggleDisplayMode,
    /// Advance to the next bezel (wraps through "none")
    CycleBezel,
    /// Advance one effect to its next intensity step
    CycleEffect(EffectKind),
    /// Advance HDMI -> Headphone -> Auto
    CycleAudioOutput,
    /// Open the virtual keyboard on the admin URL
    EditAdminUrl,
    /// Bump the game volume offset by the given dB
    AdjustGameVolume(f32),
    /// Launch the selected game item
    LaunchGame {
        /// Absolute playlist index within the set
        playlist_index: usize,
        /// Item index inside that playlist
        item_index: usize,
    },
}

/// A renderable menu entry
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    /// Text shown to the operator (already includes current values)
    pub label: String,
    /// What SELECT does, None for inert rows
    pub command: Option<MenuCommand>,
}

impl MenuEntry {
    fn new(label: impl Into<String>, command: MenuCommand) -> Self {
        Self {
            label: label.into(),
            command: Some(command),
        }
    }

    fn inert(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: None,
        }
    }
}

/// Two-level drill-down over game playlists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameBrowser {
    /// Index into the game-playlist listing when inside one, else None
    pub open_playlist: Option<usize>,
    /// Cursor within the current level
    pub selection: usize,
}

/// Owns the section stack and per-level cursor
#[derive(Debug, Clone, PartialEq)]
pub struct MenuManager {
    stack: Vec<(MenuSection, usize)>,
    /// Game browser sub-state, alive while the Games section is open
    pub browser: GameBrowser,
}

impl Default for MenuManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuManager {
    /// Start at the root section.
    pub fn new() -> Self {
        Self {
            stack: vec![(MenuSection::Root, 0)],
            browser: GameBrowser::default(),
        }
    }

    /// The section currently listed.
    pub fn section(&self) -> MenuSection {
        self.stack.last().map(|(s, _)| *s).unwrap_or(MenuSection::Root)
    }

    /// Cursor within the current level.
    pub fn selection(&self) -> usize {
        if self.section() == MenuSection::Games {
            self.browser.selection
        } else {
            self.stack.last().map(|(_, i)| *i).unwrap_or(0)
        }
    }

    /// Reset to the root (used when the overlay closes).
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push((MenuSection::Root, 0));
        self.browser = GameBrowser::default();
    }

    /// Entries for the current level, labels freshly derived from state.
    pub fn entries(&self, settings: &Settings, playlists: &PlaylistSet) -> Vec<MenuEntry> {
        match self.section() {
            MenuSection::Root => vec![
                MenuEntry::new("Display", MenuCommand::Enter(MenuSection::Display)),
                MenuEntry::new("Audio", MenuCommand::Enter(MenuSection::Audio)),
                MenuEntry::new("CRT Effects", MenuCommand::Enter(MenuSection::Effects)),
                MenuEntry::new("Games", MenuCommand::Enter(MenuSection::Games)),
                MenuEntry::new("Info", MenuCommand::Enter(MenuSection::Info)),
                MenuEntry::new("Close", MenuCommand::Close),
            ],
            MenuSection::Display => {
                let mode = match settings.display_mode {
                    DisplayMode::CrtNative => "CRT Native",
                    DisplayMode::ModernTv => "Modern TV",
                };
                let bezel = if settings.bezel_index < 0 {
                    "None".to_string()
                } else {
                    format!("#{}", settings.bezel_index + 1)
                };
                vec![
                    MenuEntry::new(
                        format!("Display Mode: {mode}"),
                        MenuCommand::ToggleDisplayMode,
                    ),
                    MenuEntry::new(format!("Bezel: {bezel}"), MenuCommand::CycleBezel),
                    MenuEntry::new("Back", MenuCommand::Enter(MenuSection::Root)),
                ]
            }
            MenuSection::Audio => {
                let output = match settings.audio_output {
                    AudioOutput::Hdmi => "HDMI",
                    AudioOutput::Headphone => "Headphone",
                    AudioOutput::Auto => "Auto",
                };
                vec![
                    MenuEntry::new(
                        format!("Output: {output}"),
                        MenuCommand::CycleAudioOutput,
                    ),
                    MenuEntry::new(
                        format!("Game Volume: {:+.0} dB", settings.game_volume_db),
                        MenuCommand::AdjustGameVolume(3.0),
                    ),
                    MenuEntry::new("Back", MenuCommand::Enter(MenuSection::Root)),
                ]
            }
            MenuSection::Effects => {
                let mut entries: Vec<MenuEntry> = EffectKind::ALL
                    .iter()
                    .map(|&kind| {
                        MenuEntry::new(
                            format!(
                                "{}: {}",
                                kind.name(),
                                effect_step_name(kind.get(&settings.effects))
                            ),
                            MenuCommand::CycleEffect(kind),
                        )
                    })
                    .collect();
                entries.push(MenuEntry::new("Back", MenuCommand::Enter(MenuSection::Root)));
                entries
            }
            MenuSection::Games => self.game_entries(playlists),
            MenuSection::Info => vec![
                MenuEntry::inert("Scan the code to open the admin page"),
                MenuEntry::new("Edit Admin URL", MenuCommand::EditAdminUrl),
                MenuEntry::new("Back", MenuCommand::Enter(MenuSection::Root)),
            ],
        }
    }

    fn game_entries(&self, playlists: &PlaylistSet) -> Vec<MenuEntry> {
        match self.browser.open_playlist {
            None => {
                let mut entries: Vec<MenuEntry> = playlists
                    .games()
                    .map(|(_, p)| {
                        MenuEntry::new(
                            format!("{} ({} games)", p.title, p.len()),
                            MenuCommand::Enter(MenuSection::Games),
                        )
                    })
                    .collect();
                if entries.is_empty() {
                    entries.push(MenuEntry::inert("No game playlists"));
                }
                entries.push(MenuEntry::new("Back", MenuCommand::Enter(MenuSection::Root)));
                entries
            }
            Some(browser_idx) => {
                let mut entries = Vec::new();
                if let Some((abs, playlist)) =
                    playlists.games().nth(browser_idx)
                {
                    for (item_idx, item) in playlist.items.iter().enumerate() {
                        entries.push(MenuEntry::new(
                            item.title.clone(),
                            MenuCommand::LaunchGame {
                                playlist_index: abs,
                                item_index: item_idx,
                            },
                        ));
                    }
                }
                entries.push(MenuEntry::new("Back", MenuCommand::Enter(MenuSection::Games)));
                entries
            }
        }
    }

    /// Move the cursor within the current level.
    pub fn navigate(&mut self, delta: i32, settings: &Settings, playlists: &PlaylistSet) {
        let count = self.entries(settings, playlists).len();
        if count == 0 {
            return;
        }
        if self.section() == MenuSection::Games {
            let cur = self.browser.selection as i32;
            self.browser.selection = (cur + delta).rem_euclid(count as i32) as usize;
        } else if let Some((_, sel)) = self.stack.last_mut() {
            let cur = *sel as i32;
            *sel = (cur + delta).rem_euclid(count as i32) as usize;
        }
    }

    /// SELECT on the current entry. Section navigation is resolved
    /// internally; everything else is handed back to the application.
    pub fn select(
        &mut self,
        settings: &Settings,
        playlists: &PlaylistSet,
    ) -> Option<MenuCommand> {
        let entries = self.entries(settings, playlists);
        let entry = entries.get(self.selection())?;
        let command = entry.command.clone()?;

        match command {
            MenuCommand::Enter(section) => {
                self.enter(section, playlists);
                None
            }
            other => Some(other),
        }
    }

    fn enter(&mut self, section: MenuSection, playlists: &PlaylistSet) {
        match (self.section(), section) {
            // Drill into a game playlist from the playlist listing.
            (MenuSection::Games, MenuSection::Games) => {
                if self.browser.open_playlist.is_none() {
                    let game_count = playlists.games().count();
                    if self.browser.selection < game_count {
                        self.browser.open_playlist = Some(self.browser.selection);
                        self.browser.selection = 0;
                    }
                } else {
                    // "Back" pseudo-entry inside a playlist.
                    self.browser.open_playlist = None;
                    self.browser.selection = 0;
                }
            }
            // "Back" to the root pops instead of pushing.
            (_, MenuSection::Root) => {
                self.back();
            }
            (_, target) => {
                if target == MenuSection::Games {
                    self.browser = GameBrowser::default();
                }
                self.stack.push((target, 0));
            }
        }
    }

    /// BACK action. Returns false when the overlay should close.
    pub fn back(&mut self) -> bool {
        if self.section() == MenuSection::Games && self.browser.open_playlist.is_some() {
            self.browser.open_playlist = None;
            self.browser.selection = 0;
            return true;
        }
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::{Playlist, PlaylistItem, SourceType};
    use std::path::PathBuf;

    fn game_playlist(title: &str, games: usize) -> Playlist {
        Playlist {
            title: title.to_string(),
            curator: String::new(),
            description: None,
            loop_playback: false,
            items: (0..games)
                .map(|i| PlaylistItem {
                    title: format!("Game {i}"),
                    artist: String::new(),
                    source_type: SourceType::EmulatedGame,
                    path: Some(PathBuf::from(format!("roms/{i}.sfc"))),
                    url: None,
                    start: None,
                    end: None,
                    tags: None,
                    emulator_core: Some("core".to_string()),
                    emulator_system: Some("system".to_string()),
                })
                .collect(),
        }
    }

    fn fixtures() -> (Settings, PlaylistSet) {
        (
            Settings::default(),
            PlaylistSet::new(vec![game_playlist("Arcade", 2), game_playlist("Console", 3)]),
        )
    }

    #[test]
    fn root_lists_all_sections() {
        let (settings, playlists) = fixtures();
        let menu = MenuManager::new();
        let entries = menu.entries(&settings, &playlists);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].label, "Display");
    }

    #[test]
    fn labels_reflect_current_settings() {
        let (mut settings, playlists) = fixtures();
        settings.display_mode = DisplayMode::CrtNative;
        let mut menu = MenuManager::new();
        menu.enter(MenuSection::Display, &playlists);
        let entries = menu.entries(&settings, &playlists);
        assert!(entries[0].label.contains("CRT Native"));

        settings.display_mode = DisplayMode::ModernTv;
        let entries = menu.entries(&settings, &playlists);
        assert!(entries[0].label.contains("Modern TV"));
    }

    #[test]
    fn game_browser_two_level_drill_down() {
        let (settings, playlists) = fixtures();
        let mut menu = MenuManager::new();
        menu.enter(MenuSection::Games, &playlists);

        // Level one: playlist listing + Back.
        let entries = menu.entries(&settings, &playlists);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].label.starts_with("Arcade"));
        assert_eq!(entries.last().unwrap().label, "Back");

        // Drill into the second playlist.
        menu.navigate(1, &settings, &playlists);
        let cmd = menu.select(&settings, &playlists);
        assert_eq!(cmd, None);
        assert_eq!(menu.browser.open_playlist, Some(1));

        // Level two: items + trailing Back.
        let entries = menu.entries(&settings, &playlists);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries.last().unwrap().label, "Back");

        // Selecting an item asks the app to launch it.
        let cmd = menu.select(&settings, &playlists);
        assert_eq!(
            cmd,
            Some(MenuCommand::LaunchGame {
                playlist_index: 1,
                item_index: 0
            })
        );
    }

    #[test]
    fn back_pops_browser_before_sections() {
        let (settings, playlists) = fixtures();
        let mut menu = MenuManager::new();
        menu.enter(MenuSection::Games, &playlists);
        menu.select(&settings, &playlists); // open playlist 0
        assert!(menu.browser.open_playlist.is_some());

        assert!(menu.back()); // back to playlist list
        assert!(menu.browser.open_playlist.is_none());
        assert!(menu.back()); // back to root
        assert_eq!(menu.section(), MenuSection::Root);
        assert!(!menu.back()); // closes the overlay
    }

    #[test]
    fn effect_steps_cycle_off_to_high() {
        assert_eq!(next_effect_step(0.0), 0.25);
        assert_eq!(next_effect_step(0.25), 0.5);
        assert_eq!(next_effect_step(0.5), 1.0);
        assert_eq!(next_effect_step(1.0), 0.0);
        assert_eq!(effect_step_name(0.5), "Medium");
        assert_eq!(effect_step_name(0.9), "High");
    }

    #[test]
    fn selecting_effect_entry_returns_cycle_command() {
        let (settings, playlists) = fixtures();
        let mut menu = MenuManager::new();
        menu.enter(MenuSection::Effects, &playlists);
        let cmd = menu.select(&settings, &playlists);
        assert_eq!(cmd, Some(MenuCommand::CycleEffect(EffectKind::Scanlines)));
    }

    #[test]
    fn selection_restored_per_level() {
        let (settings, playlists) = fixtures();
        let mut menu = MenuManager::new();
        menu.navigate(2, &settings, &playlists); // root cursor on "CRT Effects"
        menu.enter(MenuSection::Display, &playlists);
        menu.navigate(1, &settings, &playlists);
        menu.back();
        assert_eq!(menu.selection(), 2);
    }
}
