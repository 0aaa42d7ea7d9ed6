//! The player interface
//!
//! Both pipeline implementations sit behind this trait. Calls are
//! synchronous and non-blocking; failures come back as `false` plus a
//! last-error string for the status line, and background errors latch into
//! an atomic flag consumed on the next tick.

use crate::frame::VideoFrame;
use std::path::PathBuf;

/// Everything needed to start one item
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    /// Local file path, if the item is file-backed
    pub path: Option<PathBuf>,
    /// Stream URL, if the item is a remote stream
    pub url: Option<String>,
    /// Playback window start, seconds
    pub start: Option<f64>,
    /// Playback window end, seconds
    pub end: Option<f64>,
    /// Restart from the window start at EOS
    pub looping: bool,
    /// Initial volume, percent
    pub volume: f64,
}

impl LoadRequest {
    /// The URI the pipeline should open, or None when the request is empty.
    pub fn uri(&self) -> Option<String> {
        if let Some(url) = &self.url {
            return Some(url.clone());
        }
        self.path
            .as_ref()
            .map(|p| format!("file://{}", p.display()))
    }
}

/// A single-item playback pipeline
pub trait Player {
    /// Tear down anything current and start the requested item. Returns
    /// false (with `last_error` set) when the item cannot be opened.
    fn load(&mut self, request: &LoadRequest) -> bool;

    /// Human-readable reason for the last `load` failure.
    fn last_error(&self) -> Option<&str>;

    /// Send EOS, wait briefly, then force the pipeline down. Position and
    /// duration read zero afterwards.
    fn stop(&mut self);

    /// Pause or resume. Returns the new paused state.
    fn set_paused(&mut self, paused: bool) -> bool;

    /// Whether playback is currently paused.
    fn is_paused(&self) -> bool;

    /// Seek to an absolute position (seconds); flushing, key-frame snapped.
    fn seek_absolute(&mut self, seconds: f64);

    /// Seek relative to the current position (seconds).
    fn seek_relative(&mut self, delta: f64) {
        let target = (self.position() + delta).max(0.0);
        self.seek_absolute(target);
    }

    /// Set volume in percent (0-100+, clamped by the implementation).
    fn set_volume(&mut self, percent: f64);

    /// Change audio routing for subsequent loads. Implementations that own
    /// their sink apply it on the next `load`; the caller stops first.
    fn set_audio_output(&mut self, _output: tubebox_core::AudioOutput) {}

    /// Last observed position, seconds.
    fn position(&self) -> f64;

    /// Last observed duration, seconds; 0 until the stream is up.
    fn duration(&self) -> f64;

    /// A stream is up and not stopped.
    fn is_playing(&self) -> bool;

    /// End of stream was observed.
    fn is_eos(&self) -> bool;

    /// Consume the background error flag, if one latched since last tick.
    fn take_error(&mut self) -> Option<String>;

    /// Pull the newest decoded frame; zero timeout, None when nothing new.
    /// Direct-rendering implementations always return None.
    fn poll_frame(&mut self) -> Option<VideoFrame>;

    /// Pump bus messages and refresh the position/duration atomics.
    /// Called exactly once per tick from the main thread.
    fn update(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_prefers_url_over_path() {
        let request = LoadRequest {
            path: Some(PathBuf::from("/media/a.mp4")),
            url: Some("http://example.com/live".to_string()),
            ..Default::default()
        };
        assert_eq!(request.uri().as_deref(), Some("http://example.com/live"));
    }

    #[test]
    fn uri_from_path_gets_file_scheme() {
        let request = LoadRequest {
            path: Some(PathBuf::from("/media/a.mp4")),
            ..Default::default()
        };
        assert_eq!(request.uri().as_deref(), Some("file:///media/a.mp4"));
    }

    #[test]
    fn empty_request_has_no_uri() {
        assert_eq!(LoadRequest::default().uri(), None);
    }
}
