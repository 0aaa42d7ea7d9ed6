//! Directory change watcher
//!
//! The admin process writes into the playlist and settings directories from
//! outside; there is no RPC. Changes are detected by polling file mtimes on
//! a ~1.5 s interval, which also pairs correctly with the admin's
//! write-then-rename discipline: a rename bumps the directory entry, so only
//! complete files are ever observed.

use crate::error::{IoError, Result};
use crossbeam_channel::{unbounded, Receiver};
use notify::{Config, PollWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Poll interval for the mtime scan
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Watches one or more directories for any modification
pub struct DirWatcher {
    // Held for its Drop; polling stops when the watcher goes away.
    _watcher: PollWatcher,
    events: Receiver<notify::Result<notify::Event>>,
}

impl DirWatcher {
    /// Start watching `paths` (non-recursive) with the default interval.
    pub fn new(paths: &[&Path]) -> Result<Self> {
        let (tx, rx) = unbounded();

        let mut watcher = PollWatcher::new(
            move |event| {
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )
        .map_err(|e| IoError::Watcher(e.to_string()))?;

        for path in paths {
            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|e| IoError::Watcher(format!("{path:?}: {e}")))?;
        }

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Drain pending events; true when anything under the watched paths
    /// changed since the last call. Never blocks.
    pub fn changed(&self) -> bool {
        let mut any = false;
        while let Ok(event) = self.events.try_recv() {
            match event {
                Ok(event) => {
                    debug!("Watched change: {:?}", event.kind);
                    any = true;
                }
                Err(e) => warn!("Watcher error: {}", e),
            }
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_change_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = DirWatcher::new(&[dir.path()]).unwrap();
        assert!(!watcher.changed());
    }

    #[test]
    fn watching_missing_path_is_an_error() {
        let result = DirWatcher::new(&[Path::new("/nonexistent/tubebox-watch")]);
        assert!(result.is_err());
    }
}
