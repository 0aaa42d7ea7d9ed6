//! Tubebox - a single-display kiosk engine for retro media appliances
//!
//! Owns the framebuffer through DRM/KMS, plays curated playlists with a
//! GL-composed UI and CRT post-process, and hands the display to an external
//! emulator on demand.

mod engine;
mod handoff;
mod logging_setup;
mod orchestrator;
mod playback;

use engine::{Engine, EngineConfig, EngineExit};
use tracing::{error, info};
use tubebox_io::SettingsStore;

/// Clean shutdown on QUIT
const EXIT_OK: i32 = 0;
/// Initialization failure (display, GL, fonts, input)
const EXIT_INIT_FAILURE: i32 = 1;
/// Fatal resource loss after recovery attempts
const EXIT_DISPLAY_LOST: i32 = 2;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let config = EngineConfig::from_env();

    // Settings come first: logging is configured by them.
    let settings_store = SettingsStore::new(&config.settings_path);
    let settings = settings_store.load();

    let _log_guard = match logging_setup::init(&settings.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging setup failed: {e:#}");
            None
        }
    };

    info!("Tubebox {} starting", env!("CARGO_PKG_VERSION"));

    let mut engine = match Engine::new(config, settings_store, settings) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Initialization failed: {:#}", e);
            return EXIT_INIT_FAILURE;
        }
    };

    match engine.run() {
        EngineExit::Clean => {
            info!("Clean shutdown");
            EXIT_OK
        }
        EngineExit::DisplayLost => {
            error!("Display lost, exiting");
            EXIT_DISPLAY_LOST
        }
    }
}
