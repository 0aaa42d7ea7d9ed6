//! Playlist file parsing
//!
//! One YAML document per playlist. Field order is free; `artist` must be
//! present on every item (possibly empty) so curation mistakes surface at
//! load time instead of as blank UI rows. A file that fails to parse or
//! validate is skipped with a logged reason; other files continue to load.

use crate::error::{IoError, Result};
use std::path::Path;
use tracing::debug;
use tubebox_core::Playlist;

/// Load and validate a single playlist file.
pub fn load_playlist_file(path: &Path) -> Result<Playlist> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::Fs {
        path: path.to_path_buf(),
        source,
    })?;

    let playlist: Playlist =
        serde_yaml::from_str(&text).map_err(|e| IoError::PlaylistParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    for item in &playlist.items {
        item.validate().map_err(|source| IoError::PlaylistInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    }

    debug!(
        "Loaded playlist '{}' ({} items) from {:?}",
        playlist.title,
        playlist.items.len(),
        path
    );
    Ok(playlist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tubebox_core::SourceType;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const GOOD: &str = r#"
title: Saturday Tapes
curator: VHS Pete
description: Late-night picks
loop: true
items:
  - title: Opening Ident
    artist: ""
    source_type: local
    path: idents/open.mp4
  - title: Live Feed
    artist: Somebody
    source_type: remote_stream
    url: http://example.com/feed.m3u8
    tags: [live, loud]
"#;

    #[test]
    fn parses_full_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tapes.yaml", GOOD);
        let playlist = load_playlist_file(&path).unwrap();
        assert_eq!(playlist.title, "Saturday Tapes");
        assert!(playlist.loop_playback);
        assert_eq!(playlist.items.len(), 2);
        assert_eq!(playlist.items[1].source_type, SourceType::RemoteStream);
        assert_eq!(
            playlist.items[1].tags.as_deref(),
            Some(&["live".to_string(), "loud".to_string()][..])
        );
    }

    #[test]
    fn field_order_is_not_significant() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "reordered.yaml",
            r#"
items:
  - source_type: local
    path: a.mp4
    artist: ""
    title: A
loop: false
curator: C
title: T
"#,
        );
        let playlist = load_playlist_file(&path).unwrap();
        assert_eq!(playlist.title, "T");
        assert_eq!(playlist.items[0].title, "A");
    }

    #[test]
    fn missing_artist_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "noartist.yaml",
            r#"
title: T
curator: C
loop: false
items:
  - title: A
    source_type: local
    path: a.mp4
"#,
        );
        assert!(matches!(
            load_playlist_file(&path),
            Err(IoError::PlaylistParse { .. })
        ));
    }

    #[test]
    fn invalid_item_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "nopath.yaml",
            r#"
title: T
curator: C
loop: false
items:
  - title: A
    artist: ""
    source_type: local
"#,
        );
        assert!(matches!(
            load_playlist_file(&path),
            Err(IoError::PlaylistInvalid { .. })
        ));
    }

    #[test]
    fn game_items_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "games.yaml",
            r#"
title: Cart Shelf
curator: C
loop: false
items:
  - title: Puzzler
    artist: ""
    source_type: emulated_game
    path: roms/puzzler.gb
    emulator_core: gambatte
    emulator_system: gb
"#,
        );
        let playlist = load_playlist_file(&path).unwrap();
        assert!(playlist.is_game_playlist());
        assert_eq!(playlist.items[0].emulator_core.as_deref(), Some("gambatte"));
    }
}
