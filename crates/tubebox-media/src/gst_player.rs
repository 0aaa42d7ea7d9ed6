//! GStreamer playback pipeline
//!
//! One `uridecodebin` feeding two pre-built branches:
//! - video: queue ! videoconvert ! appsink (RGBA/I420/NV12 passthrough)
//! - audio: queue ! audioconvert ! audioresample ! volume ! sink
//!
//! Known hardware decoder factories are promoted above the software ones
//! before the first pipeline is built, so decodebin picks them wherever the
//! platform provides one. The appsink callback runs on a streaming thread
//! and must not touch GL: it copies planes into the `FrameSlot` and updates
//! the position atomic, nothing else.

use crate::frame::{FrameSlot, PixelLayout, VideoFrame};
use crate::player::{LoadRequest, Player};
use crate::MediaError;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tubebox_core::AudioOutput;

/// Decoder factories promoted above the software decoders when present
const HW_DECODERS: [&str; 10] = [
    "v4l2h264dec",
    "v4l2h265dec",
    "v4l2mpeg2dec",
    "v4l2mpeg4dec",
    "v4l2vp8dec",
    "v4l2vp9dec",
    "vah264dec",
    "vah265dec",
    "vaapih264dec",
    "vaapidecodebin",
];

/// ALSA device handed to the sink when HDMI audio is forced
const HDMI_ALSA_DEVICE: &str = "hw:0";
/// ALSA device handed to the sink when the headphone jack is forced
const HEADPHONE_ALSA_DEVICE: &str = "hw:1";

/// How long `stop` waits for the EOS to drain before forcing Null
const STOP_EOS_WAIT: Duration = Duration::from_millis(100);
/// State-change timeout when forcing the pipeline down
const STOP_STATE_TIMEOUT: Duration = Duration::from_secs(1);
/// Preroll timeout during `load`
const PREROLL_TIMEOUT: Duration = Duration::from_secs(2);

/// State shared with the streaming threads. Only atomics and the frame slot;
/// the error string sits behind a mutex because it is written once and read
/// once per failure.
#[derive(Default)]
struct SharedState {
    slot: FrameSlot,
    position_ns: AtomicU64,
    duration_ns: AtomicU64,
    playing: AtomicBool,
    eos: AtomicBool,
    error: Mutex<Option<String>>,
}

/// Streaming-media implementation of [`Player`]
pub struct GstPlayer {
    audio_output: AudioOutput,
    pipeline: Option<gst::Pipeline>,
    shared: Arc<SharedState>,
    last_error: Option<String>,
    paused: bool,
    looping: bool,
    window_start: Option<f64>,
    volume_percent: f64,
}

impl GstPlayer {
    /// Create an idle player routing audio to `audio_output`.
    pub fn new(audio_output: AudioOutput) -> Self {
        if let Err(e) = gst::init() {
            warn!("GStreamer init failed: {}", e);
        }
        promote_hw_decoders();

        Self {
            audio_output,
            pipeline: None,
            shared: Arc::new(SharedState::default()),
            last_error: None,
            paused: false,
            looping: false,
            window_start: None,
            volume_percent: 100.0,
        }
    }

    fn fail(&mut self, error: MediaError) -> bool {
        warn!("Load failed: {}", error);
        self.last_error = Some(error.to_string());
        false
    }

    fn build_pipeline(&mut self, uri: &str) -> Result<gst::Pipeline, String> {
        let pipeline = gst::Pipeline::new();

        let decode = gst::ElementFactory::make("uridecodebin")
            .property("uri", uri)
            .build()
            .map_err(|e| format!("uridecodebin unavailable: {e}"))?;

        // Video branch: passthrough for the three formats the upload path
        // understands, converting only when the decoder emits something else.
        let video_queue = make("queue")?;
        let video_convert = make("videoconvert")?;
        let caps = gst::Caps::builder("video/x-raw")
            .field("format", gst::List::new(["RGBA", "I420", "NV12"]))
            .build();
        let appsink = gst_app::AppSink::builder()
            .caps(&caps)
            .max_buffers(1)
            .drop(true)
            .sync(true)
            .build();

        // Audio branch ending in the configured sink.
        let audio_queue = make("queue")?;
        let audio_convert = make("audioconvert")?;
        let audio_resample = make("audioresample")?;
        let volume = gst::ElementFactory::make("volume")
            .name("volume")
            .property("volume", self.volume_percent / 100.0)
            .build()
            .map_err(|e| format!("volume unavailable: {e}"))?;
        let audio_sink = build_audio_sink(self.audio_output)?;

        pipeline
            .add_many([
                &decode,
                &video_queue,
                &video_convert,
                appsink.upcast_ref(),
                &audio_queue,
                &audio_convert,
                &audio_resample,
                &volume,
                &audio_sink,
            ])
            .map_err(|e| format!("pipeline assembly: {e}"))?;
        gst::Element::link_many([&video_queue, &video_convert, appsink.upcast_ref()])
            .map_err(|e| format!("video branch link: {e}"))?;
        gst::Element::link_many([
            &audio_queue,
            &audio_convert,
            &audio_resample,
            &volume,
            &audio_sink,
        ])
        .map_err(|e| format!("audio branch link: {e}"))?;

        // Route decoded pads into the matching branch as they appear.
        let video_target = video_queue.clone();
        let audio_target = audio_queue.clone();
        decode.connect_pad_added(move |_, src_pad| {
            let Some(caps) = src_pad.current_caps() else {
                return;
            };
            let Some(structure) = caps.structure(0) else {
                return;
            };
            let name = structure.name();

            let target = if name.starts_with("video/") {
                &video_target
            } else if name.starts_with("audio/") {
                &audio_target
            } else {
                debug!("Ignoring pad with caps {}", name);
                return;
            };

            let Some(sink_pad) = target.static_pad("sink") else {
                return;
            };
            if sink_pad.is_linked() {
                return;
            }
            if let Err(e) = src_pad.link(&sink_pad) {
                warn!("Pad link failed for {}: {:?}", name, e);
            }
        });

        // Streaming-thread side: copy the newest sample into the slot and
        // stamp the position atomic. No GL, no allocation beyond the planes.
        let shared = self.shared.clone();
        let sample_shared = shared.clone();
        appsink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    offer_sample(&sample_shared, &sample)?;
                    Ok(gst::FlowSuccess::Ok)
                })
                .new_preroll(move |sink| {
                    // Preroll delivers the post-seek frame while paused.
                    let sample = sink.pull_preroll().map_err(|_| gst::FlowError::Eos)?;
                    offer_sample(&shared, &sample)?;
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(pipeline)
    }

    fn apply_window_seek(&self, pipeline: &gst::Pipeline, start: f64, end: Option<f64>) {
        let start_time = secs_to_clocktime(start);
        let stop_time: Option<gst::ClockTime> = end.map(secs_to_clocktime);
        let flags = gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT;
        if let Err(e) = pipeline.seek(
            1.0,
            flags,
            gst::SeekType::Set,
            start_time,
            gst::SeekType::Set,
            stop_time,
        ) {
            warn!("Window seek to {}..{:?} failed: {}", start, end, e);
        }
    }

    fn drain_bus(&mut self) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        let Some(bus) = pipeline.bus() else {
            return;
        };

        while let Some(msg) = bus.pop() {
            match msg.view() {
                gst::MessageView::Eos(_) => {
                    if self.looping {
                        let start = self.window_start.unwrap_or(0.0);
                        debug!("EOS, looping back to {}", start);
                        if let Err(e) = pipeline.seek_simple(
                            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                            secs_to_clocktime(start),
                        ) {
                            warn!("Loop seek failed: {}", e);
                            self.shared.eos.store(true, Ordering::Relaxed);
                        }
                    } else {
                        self.shared.eos.store(true, Ordering::Relaxed);
                        self.shared.playing.store(false, Ordering::Relaxed);
                    }
                }
                gst::MessageView::Error(err) => {
                    let text = format!(
                        "{}: {}",
                        err.src().map(|s| s.path_string()).unwrap_or_default(),
                        err.error()
                    );
                    warn!("Pipeline error: {}", text);
                    *self.shared.error.lock() = Some(text);
                    self.shared.playing.store(false, Ordering::Relaxed);
                }
                gst::MessageView::Warning(w) => {
                    debug!("Pipeline warning: {}", w.error());
                }
                _ => {}
            }
        }
    }
}

impl Player for GstPlayer {
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

        info!("Loading {}", uri);
        self.looping = request.looping;
        self.window_start = request.start;
        self.volume_percent = request.volume;

        let pipeline = match self.build_pipeline(&uri) {
            Ok(p) => p,
            Err(e) => return self.fail(MediaError::DecoderUnavailable(e)),
        };

        // Preroll synchronously so open failures surface here, not mid-menu.
        if pipeline.set_state(gst::State::Paused).is_err() {
            let _ = pipeline.set_state(gst::State::Null);
            return self.fail(MediaError::Pipeline(format!("cannot open {uri}")));
        }
        let (result, _, _) = pipeline.state(Some(clocktime_from_duration(PREROLL_TIMEOUT)));
        if result.is_err() {
            // Pull the real reason off the bus if there is one.
            let reason = pipeline
                .bus()
                .and_then(|bus| {
                    bus.timed_pop_filtered(gst::ClockTime::ZERO, &[gst::MessageType::Error])
                })
                .and_then(|msg| match msg.view() {
                    gst::MessageView::Error(e) => Some(e.error().to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| format!("preroll failed for {uri}"));
            let _ = pipeline.set_state(gst::State::Null);
            return self.fail(MediaError::Pipeline(reason));
        }

        if request.start.is_some() || request.end.is_some() {
            self.apply_window_seek(&pipeline, request.start.unwrap_or(0.0), request.end);
        }

        if pipeline.set_state(gst::State::Playing).is_err() {
            let _ = pipeline.set_state(gst::State::Null);
            return self.fail(MediaError::Pipeline(format!("cannot start {uri}")));
        }

        self.shared.eos.store(false, Ordering::Relaxed);
        self.shared.playing.store(true, Ordering::Relaxed);
        self.shared.position_ns.store(0, Ordering::Relaxed);
        self.shared.duration_ns.store(0, Ordering::Relaxed);
        *self.shared.error.lock() = None;
        self.paused = false;
        self.pipeline = Some(pipeline);
        true
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn stop(&mut self) {
        let Some(pipeline) = self.pipeline.take() else {
            return;
        };

        // Polite first: EOS lets the audio sink drain instead of popping.
        pipeline.send_event(gst::event::Eos::new());
        if let Some(bus) = pipeline.bus() {
            let _ = bus.timed_pop_filtered(
                Some(clocktime_from_duration(STOP_EOS_WAIT)),
                &[gst::MessageType::Eos],
            );
        }

        let _ = pipeline.set_state(gst::State::Null);
        let (result, _, _) = pipeline.state(Some(clocktime_from_duration(STOP_STATE_TIMEOUT)));
        if result.is_err() {
            warn!("Pipeline refused to reach Null within timeout");
        }

        self.shared.playing.store(false, Ordering::Relaxed);
        self.shared.eos.store(false, Ordering::Relaxed);
        self.shared.position_ns.store(0, Ordering::Relaxed);
        self.shared.duration_ns.store(0, Ordering::Relaxed);
        self.shared.slot.clear();
        self.paused = false;
    }

    fn set_paused(&mut self, paused: bool) -> bool {
        if let Some(pipeline) = &self.pipeline {
            let target = if paused {
                gst::State::Paused
            } else {
                gst::State::Playing
            };
            if pipeline.set_state(target).is_ok() {
                self.paused = paused;
            }
        }
        self.paused
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn seek_absolute(&mut self, seconds: f64) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        let target = seconds.max(0.0);
        if let Err(e) = pipeline.seek_simple(
            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
            secs_to_clocktime(target),
        ) {
            warn!("Seek to {}s failed: {}", target, e);
            return;
        }
        // The slot may hold a pre-seek frame; the flush made it stale.
        self.shared.slot.clear();
        self.shared
            .position_ns
            .store((target * 1e9) as u64, Ordering::Relaxed);
        self.shared.eos.store(false, Ordering::Relaxed);
    }

    fn set_volume(&mut self, percent: f64) {
        self.volume_percent = percent.clamp(0.0, 200.0);
        if let Some(pipeline) = &self.pipeline {
            if let Some(volume) = pipeline.by_name("volume") {
                volume.set_property("volume", self.volume_percent / 100.0);
            }
        }
    }

    /// The sink is never swapped mid-stream; the caller stops playback
    /// first and the next load builds the audio branch with the new device.
    fn set_audio_output(&mut self, output: AudioOutput) {
        self.audio_output = output;
    }

    fn position(&self) -> f64 {
        self.shared.position_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    fn duration(&self) -> f64 {
        self.shared.duration_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    fn is_eos(&self) -> bool {
        self.shared.eos.load(Ordering::Relaxed)
    }

    fn take_error(&mut self) -> Option<String> {
        self.shared.error.lock().take()
    }

    fn poll_frame(&mut self) -> Option<VideoFrame> {
        self.shared.slot.take()
    }

    fn update(&mut self) {
        self.drain_bus();

        let Some(pipeline) = &self.pipeline else {
            return;
        };

        if self.shared.duration_ns.load(Ordering::Relaxed) == 0 {
            if let Some(duration) = pipeline.query_duration::<gst::ClockTime>() {
                self.shared
                    .duration_ns
                    .store(duration.nseconds(), Ordering::Relaxed);
            }
        }
        // The appsink stamps positions from video pts; the query keeps
        // audio-only streams and paused state honest.
        if let Some(position) = pipeline.query_position::<gst::ClockTime>() {
            self.shared
                .position_ns
                .store(position.nseconds(), Ordering::Relaxed);
        }
    }
}

impl Drop for GstPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn make(factory: &str) -> Result<gst::Element, String> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|e| format!("{factory} unavailable: {e}"))
}

/// The ALSA device string for a forced output, None for auto.
fn alsa_device(output: AudioOutput) -> Option<&'static str> {
    match output {
        AudioOutput::Hdmi => Some(HDMI_ALSA_DEVICE),
        AudioOutput::Headphone => Some(HEADPHONE_ALSA_DEVICE),
        AudioOutput::Auto => None,
    }
}

fn build_audio_sink(output: AudioOutput) -> Result<gst::Element, String> {
    match alsa_device(output) {
        Some(device) => gst::ElementFactory::make("alsasink")
            .property("device", device)
            .build()
            .map_err(|e| format!("alsasink unavailable: {e}")),
        None => make("autoaudiosink"),
    }
}

/// Promote the platform's hardware decoders above the software defaults so
/// decodebin prefers them. Harmless when none of the factories exist.
fn promote_hw_decoders() {
    let registry = gst::Registry::get();
    let promoted_rank = gst::Rank::from(i32::from(gst::Rank::PRIMARY) + 1);
    for name in HW_DECODERS {
        if let Some(feature) = registry.lookup_feature(name) {
            debug!("Promoting hardware decoder {}", name);
            feature.set_rank(promoted_rank);
        }
    }
}

fn secs_to_clocktime(seconds: f64) -> gst::ClockTime {
    gst::ClockTime::from_nseconds((seconds.max(0.0) * 1e9) as u64)
}

fn clocktime_from_duration(duration: Duration) -> gst::ClockTime {
    gst::ClockTime::from_nseconds(duration.as_nanos() as u64)
}

/// Copy a mapped sample into the slot and stamp the position atomic.
fn offer_sample(
    shared: &SharedState,
    sample: &gst::Sample,
) -> Result<(), gst::FlowError> {
    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
    let caps = sample.caps().ok_or(gst::FlowError::Error)?;
    let info = gst_video::VideoInfo::from_caps(caps).map_err(|_| gst::FlowError::NotSupported)?;

    let layout = match info.format() {
        gst_video::VideoFormat::Rgba => PixelLayout::Rgba,
        gst_video::VideoFormat::I420 => PixelLayout::I420,
        gst_video::VideoFormat::Nv12 => PixelLayout::Nv12,
        other => {
            warn!("Unexpected appsink format {:?}", other);
            return Err(gst::FlowError::NotSupported);
        }
    };

    let vframe = gst_video::VideoFrameRef::from_buffer_ref_readable(buffer, &info)
        .map_err(|_| gst::FlowError::Error)?;

    let plane_count = layout.plane_count();
    let mut planes = Vec::with_capacity(plane_count);
    let mut strides = Vec::with_capacity(plane_count);
    for plane in 0..plane_count {
        let data = vframe
            .plane_data(plane as u32)
            .map_err(|_| gst::FlowError::Error)?;
        planes.push(data.to_vec());
        strides.push(vframe.plane_stride()[plane] as usize);
    }

    let pts = buffer
        .pts()
        .map(|t| Duration::from_nanos(t.nseconds()))
        .unwrap_or_default();

    shared
        .position_ns
        .store(pts.as_nanos() as u64, Ordering::Relaxed);
    shared.slot.offer(VideoFrame {
        width: info.width(),
        height: info.height(),
        layout,
        planes,
        strides,
        pts,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clocktime_conversion_is_nanosecond_exact() {
        assert_eq!(secs_to_clocktime(1.5).nseconds(), 1_500_000_000);
        assert_eq!(secs_to_clocktime(-3.0).nseconds(), 0);
    }

    #[test]
    fn forced_outputs_map_to_alsa_devices() {
        assert_eq!(alsa_device(AudioOutput::Hdmi), Some(HDMI_ALSA_DEVICE));
        assert_eq!(
            alsa_device(AudioOutput::Headphone),
            Some(HEADPHONE_ALSA_DEVICE)
        );
        assert_eq!(alsa_device(AudioOutput::Auto), None);
    }

    #[test]
    fn load_of_missing_file_fails_synchronously() {
        let mut player = GstPlayer::new(AudioOutput::Auto);
        let ok = player.load(&LoadRequest {
            path: Some(std::path::PathBuf::from("/nonexistent/clip.mp4")),
            volume: 100.0,
            ..Default::default()
        });
        assert!(!ok);
        assert!(player.last_error().unwrap().contains("not found"));
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.duration(), 0.0);
    }

    #[test]
    fn stop_on_idle_player_is_a_no_op() {
        let mut player = GstPlayer::new(AudioOutput::Auto);
        player.stop();
        assert!(!player.is_playing());
    }
}
