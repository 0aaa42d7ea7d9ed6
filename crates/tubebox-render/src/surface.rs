//! DRM/KMS display surface
//!
//! Bare kernel mode-setting, no compositor anywhere: pick the first connected
//! connector, take its preferred mode, render GLES into a GBM surface and
//! scan buffers out with page flips. The page-flip wait is the engine's
//! vsync pacing; no other sleep exists in the frame loop.
//!
//! For the emulator handoff the DRM master lock is dropped and later
//! reclaimed, and the whole EGL/GBM side is torn down and rebuilt; see
//! `release_display` / `reclaim_display`.

use crate::{RenderError, Result};
use drm::control::{connector, crtc, framebuffer, Device as ControlDevice, ModeTypeFlags, PageFlipFlags};
use drm::Device as DrmDevice;
use gbm::{AsRaw, BufferObject, BufferObjectFlags, Format};
use glutin::config::{ConfigSurfaceTypes, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, NotCurrentGlContext, Version};
use glutin::display::GlDisplay;
use glutin::surface::{GlSurface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::{GbmDisplayHandle, GbmWindowHandle, RawDisplayHandle, RawWindowHandle};
use std::fs::{File, OpenOptions};
use std::num::NonZeroU32;
use std::os::fd::AsFd;
use std::path::PathBuf;
use std::ptr::NonNull;
use tracing::{debug, info, warn};

type EglDisplay = glutin::api::egl::display::Display;
type EglConfig = glutin::api::egl::config::Config;
type EglContext = glutin::api::egl::context::PossiblyCurrentContext;
type EglSurface = glutin::api::egl::surface::Surface<WindowSurface>;

/// The DRM node wrapper the drm crate traits hang off
struct Card(File);

impl AsFd for Card {
    fn as_fd(&self) -> std::os::unix::prelude::BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl DrmDevice for Card {}
impl ControlDevice for Card {}

/// A pixel-space rectangle (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// GL-side state rebuilt after every handoff. Field order is teardown
/// order: scanout buffers first, then surface, context, display, and the
/// GBM surface they were created against last.
struct GlState {
    previous_bo: Option<BufferObject<()>>,
    previous_fb: Option<framebuffer::Handle>,
    gl: glow::Context,
    egl_surface: EglSurface,
    egl_context: EglContext,
    _egl_display: EglDisplay,
    gbm_surface: gbm::Surface<()>,
    needs_modeset: bool,
}

/// Owns the display: DRM master, CRTC, GBM buffers, EGL context
pub struct Surface {
    gbm: gbm::Device<Card>,
    connector: connector::Handle,
    crtc: crtc::Handle,
    mode: drm::control::Mode,
    width: u32,
    height: u32,
    gl_state: Option<GlState>,
}

impl Surface {
    /// Open the first card with a connected connector and bring up the full
    /// GLES stack on its preferred mode.
    pub fn open() -> Result<Self> {
        let card = first_connected_card()?;
        let gbm = gbm::Device::new(card).map_err(|e| {
            warn!("GBM device creation failed: {}", e);
            RenderError::DisplayUnavailable
        })?;

        let resources = gbm
            .resource_handles()
            .map_err(|e| RenderError::ModeSetFailed(format!("resources: {e}")))?;

        let connector_info = resources
            .connectors()
            .iter()
            .filter_map(|handle| gbm.get_connector(*handle, false).ok())
            .find(|info| info.state() == connector::State::Connected)
            .ok_or(RenderError::DisplayUnavailable)?;

        // Preferred mode, falling back to whatever the connector lists first.
        let mode = connector_info
            .modes()
            .iter()
            .find(|m| m.mode_type().contains(ModeTypeFlags::PREFERRED))
            .or_else(|| connector_info.modes().first())
            .copied()
            .ok_or_else(|| RenderError::ModeSetFailed("connector has no modes".to_string()))?;

        // First CRTC reachable from the connector's encoder.
        let crtc = connector_info
            .current_encoder()
            .and_then(|enc| gbm.get_encoder(enc).ok())
            .map(|enc| resources.filter_crtcs(enc.possible_crtcs()))
            .and_then(|crtcs| crtcs.first().copied())
            .or_else(|| resources.crtcs().first().copied())
            .ok_or_else(|| RenderError::ModeSetFailed("no usable CRTC".to_string()))?;

        let (width, height) = mode.size();
        let (width, height) = (width as u32, height as u32);
        info!(
            "Display: {}x{}@{} on {:?}",
            width,
            height,
            mode.vrefresh(),
            connector_info.interface()
        );

        let mut surface = Self {
            gbm,
            connector: connector_info.handle(),
            crtc,
            mode,
            width,
            height,
            gl_state: None,
        };
        surface.build_gl()?;
        Ok(surface)
    }

    /// Native resolution of the chosen mode.
    pub fn original_resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Largest centered 4:3 rectangle, where the content is drawn.
    pub fn content_viewport(&self) -> Viewport {
        let (w, h) = (self.width as i64, self.height as i64);
        let (cw, ch) = if w * 3 >= h * 4 {
            // Wide screen: pillarbox.
            (h * 4 / 3, h)
        } else {
            // Tall screen: letterbox.
            (w, w * 3 / 4)
        };
        Viewport {
            x: ((w - cw) / 2) as i32,
            y: ((h - ch) / 2) as i32,
            width: cw as u32,
            height: ch as u32,
        }
    }

    /// The live GL entry points. Panics only if called between
    /// `release_display` and `reclaim_display`, which is a bug by the
    /// handoff invariant.
    pub fn gl(&self) -> &glow::Context {
        &self.gl_state.as_ref().expect("GL used during handoff").gl
    }

    /// Swap buffers, then flip the new front buffer onto the CRTC and wait
    /// for the flip to complete. The wait is the frame pacing.
    pub fn present(&mut self) -> Result<()> {
        let state = self
            .gl_state
            .as_mut()
            .ok_or_else(|| RenderError::DisplayLost("present during handoff".to_string()))?;

        state
            .egl_surface
            .swap_buffers(&state.egl_context)
            .map_err(|e| RenderError::Egl(format!("swap: {e}")))?;

        let bo = state
            .gbm_surface
            .lock_front_buffer()
            .map_err(|e| RenderError::DisplayLost(format!("lock front buffer: {e}")))?;

        let fb = self
            .gbm
            .add_framebuffer(&bo, 24, 32)
            .map_err(|e| RenderError::DisplayLost(format!("add framebuffer: {e}")))?;

        if state.needs_modeset {
            self.gbm
                .set_crtc(self.crtc, Some(fb), (0, 0), &[self.connector], Some(self.mode))
                .map_err(|e| RenderError::ModeSetFailed(e.to_string()))?;
            state.needs_modeset = false;
        } else {
            self.gbm
                .page_flip(self.crtc, fb, PageFlipFlags::EVENT, None)
                .map_err(|e| RenderError::DisplayLost(format!("page flip: {e}")))?;

            // Block until the flip lands; this is the vsync wait.
            'wait: loop {
                let events = self
                    .gbm
                    .receive_events()
                    .map_err(|e| RenderError::DisplayLost(format!("drm events: {e}")))?;
                for event in events {
                    if let drm::control::Event::PageFlip(_) = event {
                        break 'wait;
                    }
                }
            }
        }

        // The old front buffer is off-screen now; release it. The new bo
        // stays alive until the next flip displaces it.
        if let Some(old_fb) = state.previous_fb.replace(fb) {
            let _ = self.gbm.destroy_framebuffer(old_fb);
        }
        drop(state.previous_bo.replace(bo));

        Ok(())
    }

    /// Drop DRM master and tear down the GL stack so a foreign process can
    /// take the display. Every GL handle any component holds is dead after
    /// this returns.
    pub fn release_display(&mut self) -> Result<()> {
        if let Some(state) = self.gl_state.take() {
            if let Some(fb) = state.previous_fb {
                let _ = self.gbm.destroy_framebuffer(fb);
            }
            // Dropping the state releases surface, context and display.
            drop(state);
        }

        self.gbm
            .release_master_lock()
            .map_err(|e| RenderError::DisplayLost(format!("drop master: {e}")))?;
        info!("DRM master released");
        Ok(())
    }

    /// Reclaim DRM master and rebuild the GL stack. The next `present` does
    /// a full mode set in case the foreign process changed the mode.
    pub fn reclaim_display(&mut self) -> Result<()> {
        self.gbm
            .acquire_master_lock()
            .map_err(|e| RenderError::DisplayLost(format!("acquire master: {e}")))?;
        info!("DRM master reclaimed");

        self.build_gl()
    }

    /// Re-assert the GL state the engine depends on. Called after recovery;
    /// the foreign process is allowed to have left anything behind.
    pub fn assert_baseline_gl_state(&self) {
        use glow::HasContext;
        let gl = self.gl();
        unsafe {
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.disable(glow::DITHER);
            gl.active_texture(glow::TEXTURE0);
        }
    }

    fn build_gl(&mut self) -> Result<()> {
        let gbm_surface = self
            .gbm
            .create_surface::<()>(
                self.width,
                self.height,
                Format::Xrgb8888,
                BufferObjectFlags::SCANOUT | BufferObjectFlags::RENDERING,
            )
            .map_err(|e| RenderError::DisplayLost(format!("gbm surface: {e}")))?;

        let raw_display = RawDisplayHandle::Gbm(GbmDisplayHandle::new(
            NonNull::new(self.gbm.as_raw() as *mut _)
                .ok_or_else(|| RenderError::Egl("null gbm device".to_string()))?,
        ));
        let raw_window = RawWindowHandle::Gbm(GbmWindowHandle::new(
            NonNull::new(gbm_surface.as_raw() as *mut _)
                .ok_or_else(|| RenderError::Egl("null gbm surface".to_string()))?,
        ));

        let egl_display = unsafe { EglDisplay::new(raw_display) }
            .map_err(|e| RenderError::Egl(format!("display: {e}")))?;

        let config = select_config(&egl_display)?;

        let context_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(Some(raw_window));
        let context = unsafe { egl_display.create_context(&config, &context_attrs) }
            .map_err(|e| RenderError::Egl(format!("context: {e}")))?;

        let surface_attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window,
            NonZeroU32::new(self.width).expect("mode width is nonzero"),
            NonZeroU32::new(self.height).expect("mode height is nonzero"),
        );
        let egl_surface = unsafe { egl_display.create_window_surface(&config, &surface_attrs) }
            .map_err(|e| RenderError::Egl(format!("surface: {e}")))?;

        let egl_context = context
            .make_current(&egl_surface)
            .map_err(|e| RenderError::Egl(format!("make current: {e}")))?;

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| {
                egl_display.get_proc_address(name).cast()
            })
        };

        self.gl_state = Some(GlState {
            previous_bo: None,
            previous_fb: None,
            gl,
            egl_surface,
            egl_context,
            _egl_display: egl_display,
            gbm_surface,
            needs_modeset: true,
        });

        self.assert_baseline_gl_state();
        debug!("GL stack built ({}x{})", self.width, self.height);
        Ok(())
    }
}

/// Scan /dev/dri for the first card whose connectors include a connected one.
fn first_connected_card() -> Result<Card> {
    let entries = std::fs::read_dir("/dev/dri")
        .map_err(|_| RenderError::DisplayUnavailable)?;

    let mut cards: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("card"))
                .unwrap_or(false)
        })
        .collect();
    cards.sort();

    for path in cards {
        let Ok(file) = OpenOptions::new().read(true).write(true).open(&path) else {
            continue;
        };
        let card = Card(file);
        let Ok(resources) = card.resource_handles() else {
            continue;
        };
        let connected = resources.connectors().iter().any(|handle| {
            card.get_connector(*handle, false)
                .map(|info| info.state() == connector::State::Connected)
                .unwrap_or(false)
        });
        if connected {
            info!("Using DRM node {:?}", path);
            return Ok(card);
        }
        warn!("No connected connector on {:?}", path);
    }

    Err(RenderError::DisplayUnavailable)
}

fn select_config(display: &EglDisplay) -> Result<EglConfig> {
    let template = ConfigTemplateBuilder::new()
        .with_surface_type(ConfigSurfaceTypes::WINDOW)
        .build();
    unsafe { display.find_configs(template) }
        .map_err(|e| RenderError::Egl(format!("configs: {e}")))?
        .next()
        .ok_or_else(|| RenderError::Egl("no EGL config".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_for(width: u32, height: u32) -> Viewport {
        // Exercise the aspect math without a device.
        let (w, h) = (width as i64, height as i64);
        let (cw, ch) = if w * 3 >= h * 4 {
            (h * 4 / 3, h)
        } else {
            (w, w * 3 / 4)
        };
        Viewport {
            x: ((w - cw) / 2) as i32,
            y: ((h - ch) / 2) as i32,
            width: cw as u32,
            height: ch as u32,
        }
    }

    #[test]
    fn wide_mode_pillarboxes() {
        let vp = viewport_for(1920, 1080);
        assert_eq!(vp.width, 1440);
        assert_eq!(vp.height, 1080);
        assert_eq!(vp.x, 240);
        assert_eq!(vp.y, 0);
    }

    #[test]
    fn native_4_3_fills() {
        let vp = viewport_for(1024, 768);
        assert_eq!(vp.width, 1024);
        assert_eq!(vp.height, 768);
        assert_eq!((vp.x, vp.y), (0, 0));
    }

    #[test]
    fn tall_mode_letterboxes() {
        let vp = viewport_for(1080, 1920);
        assert_eq!(vp.width, 1080);
        assert_eq!(vp.height, 810);
        assert_eq!(vp.x, 0);
        assert!(vp.y > 0);
    }
}
