//! The single fade record
//!
//! One linear alpha ramp drives every UI draw in a frame. Starting a new
//! fade mid-flight adopts the new target and restarts progress; there is no
//! per-widget animation state anywhere in the engine.

/// Alpha below which the UI block is skipped entirely
pub const UI_ALPHA_EPSILON: f32 = 0.01;

/// A linear, time-bounded alpha ramp for the whole UI layer
#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    /// A ramp is currently running
    pub active: bool,
    /// Engine-clock timestamp (seconds) the ramp started at
    pub started_at: f64,
    /// Ramp length in seconds
    pub duration: f32,
    /// Whether the ramp ends with the UI visible
    pub target_visible: bool,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            active: false,
            started_at: 0.0,
            duration: 1.0,
            target_visible: true,
        }
    }
}

impl Fade {
    /// Start (or retarget) a ramp toward `visible` at engine time `now`.
    pub fn start(&mut self, now: f64, duration: f32, visible: bool) {
        self.active = true;
        self.started_at = now;
        self.duration = duration.max(0.001);
        self.target_visible = visible;
    }

    /// The UI alpha for this frame. Completed ramps latch at their target;
    /// the result is always within [0, 1].
    pub fn alpha(&mut self, now: f64) -> f32 {
        if !self.active {
            return if self.target_visible { 1.0 } else { 0.0 };
        }

        let t = ((now - self.started_at) as f32 / self.duration).clamp(0.0, 1.0);
        if t >= 1.0 {
            self.active = false;
        }

        if self.target_visible {
            t
        } else {
            1.0 - t
        }
    }

    /// Snap to fully visible or hidden without animating.
    pub fn set_immediate(&mut self, visible: bool) {
        self.active = false;
        self.target_visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_fade_is_fully_visible() {
        let mut fade = Fade::default();
        assert_eq!(fade.alpha(123.0), 1.0);
    }

    #[test]
    fn ramp_down_is_linear_and_clamped() {
        let mut fade = Fade::default();
        fade.start(10.0, 1.0, false);
        assert!((fade.alpha(10.0) - 1.0).abs() < 1e-6);
        assert!((fade.alpha(10.5) - 0.5).abs() < 1e-6);
        assert_eq!(fade.alpha(11.0), 0.0);
        // Past the end the target latches.
        assert_eq!(fade.alpha(20.0), 0.0);
        assert!(!fade.active);
    }

    #[test]
    fn retarget_mid_fade_restarts_progress() {
        let mut fade = Fade::default();
        fade.start(0.0, 1.0, false);
        let _ = fade.alpha(0.6);
        // New transition takes the new target and resets progress.
        fade.start(0.6, 1.0, true);
        assert!((fade.alpha(0.6) - 0.0).abs() < 1e-6);
        assert!((fade.alpha(1.1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn alpha_always_in_unit_range() {
        let mut fade = Fade::default();
        fade.start(5.0, 0.25, true);
        for i in 0..100 {
            let a = fade.alpha(4.0 + i as f64 * 0.05);
            assert!((0.0..=1.0).contains(&a));
        }
    }

    #[test]
    fn set_immediate_skips_animation() {
        let mut fade = Fade::default();
        fade.start(0.0, 1.0, false);
        fade.set_immediate(true);
        assert_eq!(fade.alpha(0.1), 1.0);
    }
}
