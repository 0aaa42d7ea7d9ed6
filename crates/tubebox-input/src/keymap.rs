//! Raw key code to action bindings
//!
//! One table serves keyboards and gamepads; GPIO lines reuse it by mapping
//! their offsets onto key codes. A binding carries the tap action and an
//! optional hold action; which one fires is decided at key release against
//! the long-press threshold.

use crate::action::InputAction;
use evdev::Key;
use std::collections::HashMap;

/// Tap action plus optional hold action for one physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Fired when released before the long-press threshold
    pub tap: InputAction,
    /// Fired when held past the threshold; falls back to `tap` when None
    pub hold: Option<InputAction>,
}

impl Binding {
    fn tap(action: InputAction) -> Self {
        Self {
            tap: action,
            hold: None,
        }
    }

    fn with_hold(tap: InputAction, hold: InputAction) -> Self {
        Self {
            tap,
            hold: Some(hold),
        }
    }

    /// Resolve the action for a press of the given length.
    pub fn resolve(&self, long: bool) -> InputAction {
        if long {
            self.hold.unwrap_or(self.tap)
        } else {
            self.tap
        }
    }
}

/// The active key table
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<Key, Binding>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();

        // Development keyboard map.
        bindings.insert(Key::KEY_LEFT, Binding::tap(InputAction::NavPrev));
        bindings.insert(Key::KEY_RIGHT, Binding::tap(InputAction::NavNext));
        bindings.insert(Key::KEY_ENTER, Binding::tap(InputAction::Select));
        bindings.insert(Key::KEY_SPACE, Binding::tap(InputAction::Select));
        bindings.insert(Key::KEY_BACKSPACE, Binding::tap(InputAction::Back));
        bindings.insert(Key::KEY_1, Binding::tap(InputAction::NavPrev));
        bindings.insert(Key::KEY_2, Binding::tap(InputAction::PlayToggle));
        bindings.insert(Key::KEY_3, Binding::tap(InputAction::NavNext));
        bindings.insert(
            Key::KEY_4,
            Binding::with_hold(InputAction::Settings, InputAction::SampleMode),
        );
        bindings.insert(
            Key::KEY_COMMA,
            Binding::with_hold(
                InputAction::SeekBack { long: false },
                InputAction::SeekBack { long: true },
            ),
        );
        bindings.insert(
            Key::KEY_DOT,
            Binding::with_hold(
                InputAction::SeekFwd { long: false },
                InputAction::SeekFwd { long: true },
            ),
        );
        bindings.insert(Key::KEY_UP, Binding::tap(InputAction::VolumeUp));
        bindings.insert(Key::KEY_DOWN, Binding::tap(InputAction::VolumeDown));
        bindings.insert(Key::KEY_VOLUMEUP, Binding::tap(InputAction::VolumeUp));
        bindings.insert(Key::KEY_VOLUMEDOWN, Binding::tap(InputAction::VolumeDown));
        bindings.insert(Key::KEY_Q, Binding::tap(InputAction::Quit));
        bindings.insert(Key::KEY_ESC, Binding::tap(InputAction::Quit));

        // Gamepad map.
        bindings.insert(Key::BTN_DPAD_LEFT, Binding::tap(InputAction::NavPrev));
        bindings.insert(Key::BTN_DPAD_RIGHT, Binding::tap(InputAction::NavNext));
        bindings.insert(Key::BTN_SOUTH, Binding::tap(InputAction::Select));
        bindings.insert(Key::BTN_EAST, Binding::tap(InputAction::Back));
        bindings.insert(
            Key::BTN_START,
            Binding::with_hold(InputAction::Settings, InputAction::SampleMode),
        );
        bindings.insert(Key::BTN_SELECT, Binding::tap(InputAction::PlayToggle));
        bindings.insert(
            Key::BTN_TL,
            Binding::with_hold(
                InputAction::SeekBack { long: false },
                InputAction::SeekBack { long: true },
            ),
        );
        bindings.insert(
            Key::BTN_TR,
            Binding::with_hold(
                InputAction::SeekFwd { long: false },
                InputAction::SeekFwd { long: true },
            ),
        );

        Self { bindings }
    }
}

impl Keymap {
    /// Binding for a raw code, None for unmapped keys.
    pub fn binding(&self, key: Key) -> Option<Binding> {
        self.bindings.get(&key).copied()
    }

    /// True when this keymap cares about any key of the device's set.
    pub fn matches_any(&self, keys: impl Iterator<Item = Key>) -> bool {
        let mut keys = keys;
        keys.any(|k| self.bindings.contains_key(&k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_and_hold_resolution() {
        let map = Keymap::default();
        let binding = map.binding(Key::KEY_4).unwrap();
        assert_eq!(binding.resolve(false), InputAction::Settings);
        assert_eq!(binding.resolve(true), InputAction::SampleMode);
    }

    #[test]
    fn tap_only_binding_ignores_hold() {
        let map = Keymap::default();
        let binding = map.binding(Key::KEY_ENTER).unwrap();
        assert_eq!(binding.resolve(true), InputAction::Select);
    }

    #[test]
    fn unmapped_key_is_none() {
        let map = Keymap::default();
        assert!(map.binding(Key::KEY_F24).is_none());
    }

    #[test]
    fn seek_keys_have_long_variants() {
        let map = Keymap::default();
        assert_eq!(
            map.binding(Key::KEY_DOT).unwrap().resolve(true),
            InputAction::SeekFwd { long: true }
        );
    }
}
