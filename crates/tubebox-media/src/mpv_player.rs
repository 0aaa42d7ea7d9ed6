//! MPV-based direct player using libmpv2
//!
//! Fallback for containers the streaming pipeline will not demux. MPV renders
//! straight into the DRM framebuffer (`vo=gpu`, `gpu-context=drm`), so this
//! implementation never produces frames through the slot; the engine treats
//! it as video-only output underneath whatever UI it composes next frame.

use crate::frame::VideoFrame;
use crate::player::{LoadRequest, Player};
use crate::MediaError;
use libmpv2::Mpv;
use tracing::{error, info, warn};

/// Direct-rendering implementation of [`Player`]
pub struct MpvPlayer {
    mpv: Option<Mpv>,
    last_error: Option<String>,
    paused: bool,
    looping: bool,
    volume_percent: f64,
}

impl MpvPlayer {
    /// Create an idle player. The MPV instance is built per load.
    pub fn new() -> Self {
        Self {
            mpv: None,
            last_error: None,
            paused: false,
            looping: false,
            volume_percent: 100.0,
        }
    }

    fn fail(&mut self, error: MediaError) -> bool {
        warn!("MPV load failed: {}", error);
        self.last_error = Some(error.to_string());
        false
    }

    fn property_f64(&self, name: &str) -> f64 {
        self.mpv
            .as_ref()
            .and_then(|mpv| mpv.get_property::<f64>(name).ok())
            .unwrap_or(0.0)
    }
}

impl Default for MpvPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for MpvPlayer {
    fn load(&mut self, request: &LoadRequest) -> bool {
        self.stop();
        self.last_error = None;

        if let Some(path) = &request.path {
            if !path.exists() {
                return self.fail(MediaError::FileNotFound(path.display().to_string()));
            }
        }
        let Some(uri) = request.uri() else {
            return self.fail(MediaError::Pipeline("empty load request".to_string()));
        };

        let mpv = match Mpv::new() {
            Ok(mpv) => mpv,
            Err(e) => return self.fail(MediaError::DecoderUnavailable(format!("mpv init: {e}"))),
        };

        // Render directly onto the display we own; no window system exists.
        mpv.set_property("vo", "gpu").ok();
        mpv.set_property("gpu-context", "drm").ok();
        mpv.set_property("keep-open", "yes").ok();
        mpv.set_property("volume", request.volume.clamp(0.0, 100.0)).ok();
        if request.looping {
            mpv.set_property("loop-file", "inf").ok();
        }
        if let Some(start) = request.start {
            mpv.set_property("start", start).ok();
        }
        if let Some(end) = request.end {
            mpv.set_property("end", end).ok();
        }

        if let Err(e) = mpv.command("loadfile", &[&uri]) {
            error!("mpv loadfile failed: {}", e);
            return self.fail(MediaError::Pipeline(format!("loadfile failed: {e}")));
        }

        info!("MPV playing {}", uri);
        self.looping = request.looping;
        self.volume_percent = request.volume;
        self.paused = false;
        self.mpv = Some(mpv);
        true
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn stop(&mut self) {
        if let Some(mpv) = self.mpv.take() {
            let _ = mpv.command("stop", &[]);
        }
        self.paused = false;
    }

    fn set_paused(&mut self, paused: bool) -> bool {
        if let Some(mpv) = &self.mpv {
            if mpv.set_property("pause", paused).is_ok() {
                self.paused = paused;
            }
        }
        self.paused
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn seek_absolute(&mut self, seconds: f64) {
        if let Some(mpv) = &self.mpv {
            if let Err(e) = mpv.command("seek", &[&seconds.max(0.0).to_string(), "absolute"]) {
                warn!("mpv seek failed: {}", e);
            }
        }
    }

    fn set_volume(&mut self, percent: f64) {
        self.volume_percent = percent.clamp(0.0, 100.0);
        if let Some(mpv) = &self.mpv {
            mpv.set_property("volume", self.volume_percent).ok();
        }
    }

    fn position(&self) -> f64 {
        self.property_f64("playback-time")
    }

    fn duration(&self) -> f64 {
        self.property_f64("duration")
    }

    fn is_playing(&self) -> bool {
        self.mpv.is_some() && !self.is_eos()
    }

    fn is_eos(&self) -> bool {
        self.mpv
            .as_ref()
            .and_then(|mpv| mpv.get_property::<bool>("eof-reached").ok())
            .unwrap_or(false)
    }

    fn take_error(&mut self) -> Option<String> {
        None
    }

    fn poll_frame(&mut self) -> Option<VideoFrame> {
        // MPV presents directly; there is nothing to upload.
        None
    }

    fn update(&mut self) {}
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_fails_before_mpv_init() {
        let mut player = MpvPlayer::new();
        let ok = player.load(&LoadRequest {
            path: Some(std::path::PathBuf::from("/nonexistent/clip.mkv")),
            volume: 100.0,
            ..Default::default()
        });
        assert!(!ok);
        assert!(player.last_error().is_some());
    }
}
