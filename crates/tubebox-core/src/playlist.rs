//! Playlists and playlist items
//!
//! Items are immutable after load; when a playlist file changes on disk the
//! whole playlist is replaced, never patched. Categorization (media vs game)
//! is derived from the items on demand and never stored.

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where an item's content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A file on the appliance's storage
    Local,
    /// A network stream URL
    RemoteStream,
    /// A ROM launched through the external emulator
    EmulatedGame,
}

/// One entry of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// Display title
    pub title: String,
    /// Artist line; required by the file format but may be empty
    pub artist: String,
    /// Content source kind
    pub source_type: SourceType,
    /// Filesystem path (local media, ROMs); relative paths resolve against
    /// the playlist directory
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Stream URL (remote streams only)
    #[serde(default)]
    pub url: Option<String>,
    /// Playback window start in seconds
    #[serde(default)]
    pub start: Option<f64>,
    /// Playback window end in seconds
    #[serde(default)]
    pub end: Option<f64>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Emulator core name (games only)
    #[serde(default)]
    pub emulator_core: Option<String>,
    /// Emulated system name (games only)
    #[serde(default)]
    pub emulator_system: Option<String>,
}

impl PlaylistItem {
    /// Check the per-source-type field requirements.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(CoreError::InvalidItem {
                title: self.title.clone(),
                reason: reason.to_string(),
            })
        };

        match self.source_type {
            SourceType::Local => {
                if self.path.is_none() {
                    return fail("local item has no path");
                }
            }
            SourceType::RemoteStream => {
                if self.url.is_none() {
                    return fail("remote stream has no url");
                }
            }
            SourceType::EmulatedGame => {
                if self.path.is_none() {
                    return fail("game item has no ROM path");
                }
                if self.emulator_core.is_none() || self.emulator_system.is_none() {
                    return fail("game item is missing emulator_core/emulator_system");
                }
            }
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return fail("end must be greater than start");
            }
        }

        Ok(())
    }
}

/// An ordered collection of items plus presentation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist title shown in the main UI
    pub title: String,
    /// Curator line shown under the title
    pub curator: String,
    /// Optional longer description for the info pane
    #[serde(default)]
    pub description: Option<String>,
    /// Wrap to item 0 at the end instead of stopping
    #[serde(rename = "loop", default)]
    pub loop_playback: bool,
    /// The items, in play order
    pub items: Vec<PlaylistItem>,
}

impl Playlist {
    /// A playlist is a game playlist iff it is non-empty and every item is an
    /// emulated game. Anything else is a media playlist.
    pub fn is_game_playlist(&self) -> bool {
        !self.items.is_empty()
            && self
                .items
                .iter()
                .all(|i| i.source_type == SourceType::EmulatedGame)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the playlist has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`, if in range
    pub fn item(&self, index: usize) -> Option<&PlaylistItem> {
        self.items.get(index)
    }
}

/// The full set of loaded playlists, swapped wholesale on reload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistSet {
    playlists: Vec<Playlist>,
}

impl PlaylistSet {
    /// Build a set from loaded playlists
    pub fn new(playlists: Vec<Playlist>) -> Self {
        Self { playlists }
    }

    /// All playlists in load order
    pub fn all(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Playlist by absolute index
    pub fn get(&self, index: usize) -> Option<&Playlist> {
        self.playlists.get(index)
    }

    /// Media playlists (drive the main UI), with their absolute indices
    pub fn media(&self) -> impl Iterator<Item = (usize, &Playlist)> {
        self.playlists
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_game_playlist())
    }

    /// Game playlists (settings menu game browser), with absolute indices
    pub fn games(&self) -> impl Iterator<Item = (usize, &Playlist)> {
        self.playlists
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_game_playlist())
    }

    /// Count of media playlists
    pub fn media_count(&self) -> usize {
        self.media().count()
    }

    /// Total number of playlists
    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    /// True when nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_item(title: &str) -> PlaylistItem {
        PlaylistItem {
            title: title.to_string(),
            artist: String::new(),
            source_type: SourceType::Local,
            path: Some(PathBuf::from("clips/a.mp4")),
            url: None,
            start: None,
            end: None,
            tags: None,
            emulator_core: None,
            emulator_system: None,
        }
    }

    fn game_item(title: &str) -> PlaylistItem {
        PlaylistItem {
            title: title.to_string(),
            artist: String::new(),
            source_type: SourceType::EmulatedGame,
            path: Some(PathBuf::from("roms/a.sfc")),
            url: None,
            start: None,
            end: None,
            tags: None,
            emulator_core: Some("snes9x".to_string()),
            emulator_system: Some("snes".to_string()),
        }
    }

    fn playlist(items: Vec<PlaylistItem>) -> Playlist {
        Playlist {
            title: "Test".to_string(),
            curator: "Tester".to_string(),
            description: None,
            loop_playback: false,
            items,
        }
    }

    #[test]
    fn categorization_is_pure_all_games() {
        let p = playlist(vec![game_item("a"), game_item("b")]);
        assert!(p.is_game_playlist());
    }

    #[test]
    fn categorization_mixed_is_media() {
        let p = playlist(vec![game_item("a"), media_item("b")]);
        assert!(!p.is_game_playlist());
    }

    #[test]
    fn empty_playlist_is_media() {
        let p = playlist(vec![]);
        assert!(!p.is_game_playlist());
    }

    #[test]
    fn validate_local_requires_path() {
        let mut item = media_item("a");
        item.path = None;
        assert!(item.validate().is_err());
    }

    #[test]
    fn validate_stream_requires_url() {
        let item = PlaylistItem {
            source_type: SourceType::RemoteStream,
            url: Some("http://example.com/s.m3u8".to_string()),
            path: None,
            ..media_item("s")
        };
        assert!(item.validate().is_ok());

        let bad = PlaylistItem {
            url: None,
            ..item
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_game_requires_core_and_system() {
        let mut item = game_item("g");
        item.emulator_system = None;
        assert!(item.validate().is_err());
    }

    #[test]
    fn validate_window_ordering() {
        let mut item = media_item("a");
        item.start = Some(10.0);
        item.end = Some(5.0);
        assert!(item.validate().is_err());
    }

    #[test]
    fn set_splits_media_and_games() {
        let set = PlaylistSet::new(vec![
            playlist(vec![media_item("m")]),
            playlist(vec![game_item("g")]),
            playlist(vec![media_item("m2"), media_item("m3")]),
        ]);
        let media: Vec<usize> = set.media().map(|(i, _)| i).collect();
        let games: Vec<usize> = set.games().map(|(i, _)| i).collect();
        assert_eq!(media, vec![0, 2]);
        assert_eq!(games, vec![1]);
        assert_eq!(set.media_count(), 2);
    }
}
