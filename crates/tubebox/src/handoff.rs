//! External-process display handoff
//!
//! The only place the engine blocks for more than a frame. The pipeline is
//! already stopped by the caller; this module drops DRM master, runs the
//! emulator launcher to completion on the inherited stdio, then reclaims the
//! display. GL rebuilding happens inside `Surface::reclaim_display`; the
//! caller still must `reset_gl()` every component before the next frame.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Duration;
use tracing::{error, info, warn};
use tubebox_core::PlaylistItem;
use tubebox_render::Surface;

/// Launcher invoked with the ROM as argv[1] (and bezel as argv[2] if set)
pub const DEFAULT_LAUNCHER: &str = "/opt/tubebox/bin/run-emulator";

/// Environment variable overriding the launcher path
pub const LAUNCHER_ENV: &str = "TUBEBOX_EMULATOR";

/// Attempts to reclaim the display before giving up
const RECLAIM_ATTEMPTS: u32 = 3;

/// Backoff between reclaim attempts
const RECLAIM_BACKOFF: Duration = Duration::from_millis(400);

/// Everything needed to start the emulator for one game item
#[derive(Debug, Clone)]
pub struct EmulatorLaunch {
    /// The launcher binary
    pub program: PathBuf,
    /// Absolute ROM path, argv[1]
    pub rom: PathBuf,
    /// Core name, passed in the environment
    pub core: String,
    /// System name, passed in the environment
    pub system: String,
    /// Optional bezel image, argv[2]
    pub bezel: Option<PathBuf>,
}

impl EmulatorLaunch {
    /// Build a launch for a game item, resolving the ROM path against the
    /// playlist directory. None for non-game or incomplete items.
    pub fn for_item(item: &PlaylistItem, base_dir: &Path, bezel: Option<PathBuf>) -> Option<Self> {
        let rom = item.path.as_ref()?;
        let rom = if rom.is_absolute() {
            rom.clone()
        } else {
            base_dir.join(rom)
        };
        let program = std::env::var_os(LAUNCHER_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LAUNCHER));

        Some(Self {
            program,
            rom,
            core: item.emulator_core.clone()?,
            system: item.emulator_system.clone()?,
            bezel,
        })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(&self.rom);
        if let Some(bezel) = &self.bezel {
            command.arg(bezel);
        }
        command
            .env("TUBEBOX_CORE", &self.core)
            .env("TUBEBOX_SYSTEM", &self.system);
        // Inherited stdio keeps the emulator's diagnostics in our journal.
        command
    }
}

/// Cede the display, run the emulator to completion, reclaim the display.
///
/// A nonzero emulator exit is informational; display recovery still runs.
/// An unrecoverable display is a hard error and the caller exits with the
/// fatal-resource-loss code.
pub fn run(surface: &mut Surface, launch: &EmulatorLaunch) -> Result<ExitStatus> {
    info!(
        "Handoff: {} {:?} (core={}, system={})",
        launch.program.display(),
        launch.rom,
        launch.core,
        launch.system
    );

    // If we cannot let go of the display, the handoff never starts.
    surface
        .release_display()
        .context("failed to release DRM master")?;

    let status = match launch.command().spawn() {
        Ok(mut child) => match child.wait() {
            Ok(status) => {
                if status.success() {
                    info!("Emulator exited cleanly");
                } else {
                    warn!("Emulator exited with {}", status);
                }
                Some(status)
            }
            Err(e) => {
                error!("Waiting for emulator failed: {}", e);
                None
            }
        },
        Err(e) => {
            error!("Failed to spawn {}: {}", launch.program.display(), e);
            None
        }
    };

    // Reclaim no matter how the emulator went.
    let mut last_error = None;
    for attempt in 1..=RECLAIM_ATTEMPTS {
        match surface.reclaim_display() {
            Ok(()) => {
                last_error = None;
                break;
            }
            Err(e) => {
                warn!("Display reclaim attempt {}/{} failed: {}", attempt, RECLAIM_ATTEMPTS, e);
                last_error = Some(e);
                std::thread::sleep(RECLAIM_BACKOFF);
            }
        }
    }
    if let Some(e) = last_error {
        bail!("display lost after {} reclaim attempts: {e}", RECLAIM_ATTEMPTS);
    }

    status.context("emulator never ran")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubebox_core::SourceType;

    fn game_item() -> PlaylistItem {
        PlaylistItem {
            title: "Puzzler".to_string(),
            artist: String::new(),
            source_type: SourceType::EmulatedGame,
            path: Some(PathBuf::from("roms/puzzler.gb")),
            url: None,
            start: None,
            end: None,
            tags: None,
            emulator_core: Some("gambatte".to_string()),
            emulator_system: Some("gb".to_string()),
        }
    }

    #[test]
    fn launch_resolves_rom_against_base_dir() {
        let launch = EmulatorLaunch::for_item(&game_item(), Path::new("/media/playlists"), None)
            .expect("launch");
        assert_eq!(launch.rom, PathBuf::from("/media/playlists/roms/puzzler.gb"));
        assert_eq!(launch.core, "gambatte");
    }

    #[test]
    fn absolute_rom_paths_pass_through() {
        let mut item = game_item();
        item.path = Some(PathBuf::from("/roms/puzzler.gb"));
        let launch = EmulatorLaunch::for_item(&item, Path::new("/media"), None).expect("launch");
        assert_eq!(launch.rom, PathBuf::from("/roms/puzzler.gb"));
    }

    #[test]
    fn incomplete_game_items_produce_no_launch() {
        let mut item = game_item();
        item.emulator_core = None;
        assert!(EmulatorLaunch::for_item(&item, Path::new("/m"), None).is_none());

        let mut item = game_item();
        item.path = None;
        assert!(EmulatorLaunch::for_item(&item, Path::new("/m"), None).is_none());
    }

    #[test]
    fn rom_is_argv1_and_bezel_argv2() {
        let launch = EmulatorLaunch::for_item(
            &game_item(),
            Path::new("/m"),
            Some(PathBuf::from("/bezels/crt.png")),
        )
        .expect("launch");
        let command = launch.command();
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args[0], std::ffi::OsStr::new("/m/roms/puzzler.gb"));
        assert_eq!(args[1], std::ffi::OsStr::new("/bezels/crt.png"));
    }
}
