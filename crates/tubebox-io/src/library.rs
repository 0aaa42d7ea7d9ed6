//! Playlist library
//!
//! Scans a directory for playlist files and produces the in-memory
//! `PlaylistSet` the engine renders from. A reload builds a complete new set
//! and swaps it wholesale; a half-written or broken file never replaces a
//! good one in place.

use crate::error::Result;
use crate::playlist_file::load_playlist_file;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tubebox_core::PlaylistSet;

/// File extensions treated as playlist documents
const PLAYLIST_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Result of a directory scan
#[derive(Debug, Default)]
pub struct LibraryLoad {
    /// The freshly built set
    pub set: PlaylistSet,
    /// Files skipped, with the reason (for the log and status line)
    pub skipped: Vec<(PathBuf, String)>,
}

/// The playlist directory and its current in-memory set
pub struct PlaylistLibrary {
    dir: PathBuf,
    set: PlaylistSet,
}

impl PlaylistLibrary {
    /// Create a library over `dir` and perform the initial scan.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let load = scan_dir(&dir)?;
        info!(
            "Playlist library: {} playlists loaded from {:?} ({} skipped)",
            load.set.len(),
            dir,
            load.skipped.len()
        );
        Ok(Self {
            dir,
            set: load.set,
        })
    }

    /// The directory being watched.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The current set.
    pub fn set(&self) -> &PlaylistSet {
        &self.set
    }

    /// Rescan the directory and swap the set. Returns the skip list so the
    /// caller can surface a status message.
    pub fn reload(&mut self) -> Result<Vec<(PathBuf, String)>> {
        let load = scan_dir(&self.dir)?;
        info!(
            "Playlist reload: {} playlists ({} skipped)",
            load.set.len(),
            load.skipped.len()
        );
        self.set = load.set;
        Ok(load.skipped)
    }
}

/// Scan `dir` for playlist files, sorted by file name for a stable order.
pub fn scan_dir(dir: &Path) -> Result<LibraryLoad> {
    let mut load = LibraryLoad::default();

    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| PLAYLIST_EXTENSIONS.contains(&e))
                    .unwrap_or(false)
            })
            .collect(),
        Err(e) => {
            // A missing directory is an empty library, not a failure: the
            // admin may not have uploaded anything yet.
            warn!("Playlist directory {:?} unreadable: {}", dir, e);
            return Ok(load);
        }
    };
    paths.sort();

    let mut playlists = Vec::new();
    for path in paths {
        match load_playlist_file(&path) {
            Ok(playlist) => playlists.push(playlist),
            Err(e) => {
                warn!("Skipping playlist {:?}: {}", path, e);
                load.skipped.push((path, e.to_string()));
            }
        }
    }

    load.set = PlaylistSet::new(playlists);
    Ok(load)
}
