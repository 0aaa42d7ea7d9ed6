//! Persisted appliance settings
//!
//! One document, written atomically by the engine and read back at startup.
//! The admin may rewrite it from outside; every field tolerates absence so an
//! older or partial file still loads.

use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};

/// Overall presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Tuned for a real CRT behind the appliance
    CrtNative,
    /// Tuned for a flat panel, CRT look simulated by the effect pass
    ModernTv,
}

impl DisplayMode {
    /// The other mode (settings menu toggle).
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::CrtNative => DisplayMode::ModernTv,
            DisplayMode::ModernTv => DisplayMode::CrtNative,
        }
    }
}

/// Which physical output carries audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOutput {
    /// Force HDMI audio
    Hdmi,
    /// Force the headphone jack
    Headphone,
    /// Let the sink pick
    Auto,
}

/// Per-effect intensity of the CRT post-process, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectLevels {
    /// Horizontal scanline darkening
    pub scanlines: f32,
    /// Warm color tint
    pub warmth: f32,
    /// Soft glow around bright areas
    pub glow: f32,
    /// RGB phosphor mask
    pub rgb_mask: f32,
    /// Bright-area bloom
    pub bloom: f32,
    /// Interlace line jitter
    pub interlace: f32,
    /// Brightness flicker
    pub flicker: f32,
}

impl Default for EffectLevels {
    fn default() -> Self {
        Self {
            scanlines: 0.35,
            warmth: 0.2,
            glow: 0.15,
            rgb_mask: 0.0,
            bloom: 0.1,
            interlace: 0.0,
            flicker: 0.05,
        }
    }
}

impl EffectLevels {
    /// Clamp every intensity into [0, 1].
    pub fn clamped(mut self) -> Self {
        for v in [
            &mut self.scanlines,
            &mut self.warmth,
            &mut self.glow,
            &mut self.rgb_mask,
            &mut self.bloom,
            &mut self.interlace,
            &mut self.flicker,
        ] {
            *v = v.clamp(0.0, 1.0);
        }
        self
    }

    /// True when the whole pass can be skipped.
    pub fn all_zero(&self) -> bool {
        self.scanlines == 0.0
            && self.warmth == 0.0
            && self.glow == 0.0
            && self.rgb_mask == 0.0
            && self.bloom == 0.0
            && self.interlace == 0.0
            && self.flicker == 0.0
    }
}

/// The persisted settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Presentation mode
    pub display_mode: DisplayMode,
    /// Bezel overlay index, -1 = none
    pub bezel_index: i32,
    /// CRT effect intensities
    pub effects: EffectLevels,
    /// Audio output routing
    pub audio_output: AudioOutput,
    /// Gain applied to game audio relative to media, in dB
    pub game_volume_db: f32,
    /// Master volume, 0-100
    pub master_volume: u8,
    /// Logging configuration
    pub log: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::ModernTv,
            bezel_index: -1,
            effects: EffectLevels::default(),
            audio_output: AudioOutput::Auto,
            game_volume_db: 0.0,
            master_volume: 80,
            log: LogConfig::default(),
        }
    }
}

impl Settings {
    /// Normalize out-of-range values after deserialization.
    pub fn sanitized(mut self) -> Self {
        self.effects = self.effects.clamped();
        self.master_volume = self.master_volume.min(100);
        if self.bezel_index < -1 {
            self.bezel_index = -1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_json_roundtrip() {
        let mut settings = Settings::default();
        settings.effects.scanlines = 0.5;
        settings.audio_output = AudioOutput::Headphone;
        settings.master_volume = 55;

        let json = serde_json::to_string(&settings).expect("serialize settings");
        let back: Settings = serde_json::from_str(&json).expect("deserialize settings");
        assert_eq!(settings, back);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let back: Settings =
            serde_json::from_str(r#"{"display_mode":"crt_native"}"#).expect("partial parse");
        assert_eq!(back.display_mode, DisplayMode::CrtNative);
        assert_eq!(back.master_volume, Settings::default().master_volume);
        assert_eq!(back.effects, EffectLevels::default());
    }

    #[test]
    fn display_mode_double_toggle_is_identity() {
        let mode = DisplayMode::CrtNative;
        assert_eq!(mode.toggled().toggled(), mode);
    }

    #[test]
    fn sanitize_clamps_effects_and_volume() {
        let mut settings = Settings::default();
        settings.effects.bloom = 7.0;
        settings.effects.warmth = -1.0;
        settings.master_volume = 150;
        settings.bezel_index = -5;

        let s = settings.sanitized();
        assert_eq!(s.effects.bloom, 1.0);
        assert_eq!(s.effects.warmth, 0.0);
        assert_eq!(s.master_volume, 100);
        assert_eq!(s.bezel_index, -1);
    }

    #[test]
    fn all_zero_detection() {
        let zero = EffectLevels {
            scanlines: 0.0,
            warmth: 0.0,
            glow: 0.0,
            rgb_mask: 0.0,
            bloom: 0.0,
            interlace: 0.0,
            flicker: 0.0,
        };
        assert!(zero.all_zero());
        assert!(!EffectLevels::default().all_zero());
    }
}
