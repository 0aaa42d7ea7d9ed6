//! evdev input source
//!
//! One blocking reader thread per device pushes raw key transitions into a
//! channel. The main loop calls `poll` once per tick: transitions are
//! resolved into actions (tap vs long-press at release) and returned in
//! arrival order. A periodic rescan picks up hot-plugged devices; the
//! appliance runs no udev listener.

use crate::action::InputAction;
use crate::keymap::Keymap;
use crate::{InputError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use evdev::{Device, InputEventKind, Key};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Press length at which the hold action fires instead of the tap
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(300);

/// Interval between device rescans
const RESCAN_INTERVAL: Duration = Duration::from_secs(2);

/// One key transition as read off a device
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    /// The raw key code
    pub key: Key,
    /// true = pressed, false = released
    pub pressed: bool,
    /// Arrival time on the reader thread
    pub at: Instant,
}

/// Translates device events into the action alphabet
pub struct InputSource {
    keymap: Keymap,
    raw_tx: Sender<RawKeyEvent>,
    raw_rx: Receiver<RawKeyEvent>,
    /// Press timestamps for keys currently held
    held: HashMap<Key, Instant>,
    /// Device paths with a live reader thread
    watched: HashSet<PathBuf>,
    last_rescan: Instant,
}

impl InputSource {
    /// Enumerate devices and start reader threads. Fails only when nothing
    /// usable exists at all; later hot-plug is handled by the rescan.
    pub fn new(keymap: Keymap) -> Result<Self> {
        let (raw_tx, raw_rx) = unbounded();
        let mut source = Self {
            keymap,
            raw_tx,
            raw_rx,
            held: HashMap::new(),
            watched: HashSet::new(),
            last_rescan: Instant::now(),
        };

        let started = source.scan_devices();
        if started == 0 {
            return Err(InputError::NoDevices);
        }
        Ok(source)
    }

    /// Spawn readers for any new device whose key set overlaps the keymap.
    /// Returns how many readers were started.
    fn scan_devices(&mut self) -> usize {
        let mut started = 0;
        for (path, device) in evdev::enumerate() {
            if self.watched.contains(&path) {
                continue;
            }
            let relevant = device
                .supported_keys()
                .map(|keys| self.keymap.matches_any(keys.iter()))
                .unwrap_or(false);
            if !relevant {
                continue;
            }

            info!(
                "Input device: {} ({:?})",
                device.name().unwrap_or("unnamed"),
                path
            );
            self.watched.insert(path.clone());
            spawn_reader(path, device, self.raw_tx.clone());
            started += 1;
        }
        started
    }

    /// Drain raw transitions and return resolved actions in arrival order.
    /// Never blocks; called exactly once per frame.
    pub fn poll(&mut self) -> Vec<InputAction> {
        if self.last_rescan.elapsed() >= RESCAN_INTERVAL {
            self.last_rescan = Instant::now();
            self.scan_devices();
        }

        let mut actions = Vec::new();
        while let Ok(raw) = self.raw_rx.try_recv() {
            let Some(binding) = self.keymap.binding(raw.key) else {
                trace!("Dropping unmapped key {:?}", raw.key);
                continue;
            };

            if raw.pressed {
                self.held.insert(raw.key, raw.at);
            } else if let Some(pressed_at) = self.held.remove(&raw.key) {
                let long = raw.at.duration_since(pressed_at) >= LONG_PRESS_THRESHOLD;
                actions.push(binding.resolve(long));
            }
        }
        actions
    }

    /// Feed a transition directly, bypassing the device threads. Test hook
    /// and the path GPIO events come in through.
    pub fn inject(&self, event: RawKeyEvent) {
        let _ = self.raw_tx.send(event);
    }

    /// A sender feeding the raw queue; GPIO reader threads hold one.
    pub fn clone_sender(&self) -> Sender<RawKeyEvent> {
        self.raw_tx.clone()
    }
}

fn spawn_reader(path: PathBuf, mut device: Device, tx: Sender<RawKeyEvent>) {
    std::thread::Builder::new()
        .name(format!("input-{}", path.display()))
        .spawn(move || loop {
            let events = match device.fetch_events() {
                Ok(events) => events,
                Err(e) => {
                    // Unplugged. The rescan restarts us if it comes back.
                    debug!("Input device {:?} gone: {}", path, e);
                    return;
                }
            };
            for event in events {
                if let InputEventKind::Key(key) = event.kind() {
                    // value: 1 = press, 0 = release, 2 = autorepeat (ignored)
                    let pressed = match event.value() {
                        1 => true,
                        0 => false,
                        _ => continue,
                    };
                    if tx
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
            }
        })
        .map_err(|e| warn!("Failed to spawn input reader: {}", e))
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_source() -> InputSource {
        let (raw_tx, raw_rx) = unbounded();
        InputSource {
            keymap: Keymap::default(),
            raw_tx,
            raw_rx,
            held: HashMap::new(),
            watched: HashSet::new(),
            last_rescan: Instant::now(),
        }
    }

    fn press_release(source: &InputSource, key: Key, held_for: Duration) {
        let t0 = Instant::now();
        source.inject(RawKeyEvent {
            key,
            pressed: true,
            at: t0,
        });
        source.inject(RawKeyEvent {
            key,
            pressed: false,
            at: t0 + held_for,
        });
    }

    #[test]
    fn tap_fires_tap_action() {
        let mut source = bare_source();
        press_release(&source, Key::KEY_ENTER, Duration::from_millis(50));
        assert_eq!(source.poll(), vec![InputAction::Select]);
    }

    #[test]
    fn hold_fires_hold_action() {
        let mut source = bare_source();
        press_release(&source, Key::KEY_4, Duration::from_millis(400));
        assert_eq!(source.poll(), vec![InputAction::SampleMode]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut source = bare_source();
        press_release(&source, Key::KEY_4, LONG_PRESS_THRESHOLD);
        assert_eq!(source.poll(), vec![InputAction::SampleMode]);
        press_release(&source, Key::KEY_4, Duration::from_millis(299));
        assert_eq!(source.poll(), vec![InputAction::Settings]);
    }

    #[test]
    fn unknown_codes_are_dropped() {
        let mut source = bare_source();
        press_release(&source, Key::KEY_F24, Duration::from_millis(10));
        assert!(source.poll().is_empty());
    }

    #[test]
    fn burst_preserves_arrival_order() {
        let mut source = bare_source();
        let t0 = Instant::now();
        for i in 0..1000u32 {
            let key = if i % 2 == 0 {
                Key::KEY_LEFT
            } else {
                Key::KEY_RIGHT
            };
            source.inject(RawKeyEvent {
                key,
                pressed: true,
                at: t0,
            });
            source.inject(RawKeyEvent {
                key,
                pressed: false,
                at: t0 + Duration::from_millis(1),
            });
        }

        let actions = source.poll();
        assert_eq!(actions.len(), 1000);
        for (i, action) in actions.iter().enumerate() {
            let expected = if i % 2 == 0 {
                InputAction::NavPrev
            } else {
                InputAction::NavNext
            };
            assert_eq!(*action, expected);
        }
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut source = bare_source();
        source.inject(RawKeyEvent {
            key: Key::KEY_ENTER,
            pressed: false,
            at: Instant::now(),
        });
        assert!(source.poll().is_empty());
    }
}
