//! Front-panel GPIO buttons
//!
//! Appliance builds can wire dedicated buttons straight to GPIO lines. Each
//! line is mapped onto a key code and fed through the same keymap as the
//! keyboards, so tap/hold resolution comes for free.

use crate::source::{InputSource, RawKeyEvent};
use crate::{InputError, Result};
use evdev::Key;
use gpio_cdev::{Chip, EventRequestFlags, LineRequestFlags};
use std::time::Instant;
use tracing::{info, warn};

/// A GPIO line offset bound to a key code
#[derive(Debug, Clone, Copy)]
pub struct GpioButton {
    /// Line offset on the chip
    pub line: u32,
    /// Key code fed into the keymap
    pub key: Key,
}

/// Default wiring for the reference front panel
pub const DEFAULT_BUTTONS: [GpioButton; 4] = [
    GpioButton {
        line: 17,
        key: Key::KEY_1,
    },
    GpioButton {
        line: 22,
        key: Key::KEY_2,
    },
    GpioButton {
        line: 23,
        key: Key::KEY_3,
    },
    GpioButton {
        line: 27,
        key: Key::KEY_4,
    },
];

/// Start one blocking reader thread per button, injecting transitions into
/// the given source. Buttons are active-low with both edges reported.
pub fn start(chip_path: &str, buttons: &[GpioButton], source: &InputSource) -> Result<()> {
    let mut chip =
        Chip::new(chip_path).map_err(|e| InputError::Gpio(format!("{chip_path}: {e}")))?;

    for button in buttons {
        let events = chip
            .get_line(button.line)
            .and_then(|line| {
                line.events(
                    LineRequestFlags::INPUT,
                    EventRequestFlags::BOTH_EDGES,
                    "tubebox",
                )
            })
            .map_err(|e| InputError::Gpio(format!("line {}: {e}", button.line)))?;

        info!("GPIO button on line {} -> {:?}", button.line, button.key);

        let tx_source = source.clone_sender();
        let key = button.key;
        let line = button.line;
        std::thread::Builder::new()
            .name(format!("gpio-{line}"))
            .spawn(move || {
                for event in events {
                    match event {
                        Ok(event) => {
                            // Falling edge = press (buttons pull the line low).
                            let pressed = matches!(
                                event.event_type(),
                                gpio_cdev::EventType::FallingEdge
                            );
                            if tx_source
                                .send(RawKeyEvent {
                                    key,
                                    pressed,
                                    at: Instant::now(),
                                })
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("GPIO line {} read error: {}", line, e);
                            return;
                        }
                    }
                }
            })
            .map_err(|e| InputError::Gpio(format!("spawn: {e}")))?;
    }

    Ok(())
}
