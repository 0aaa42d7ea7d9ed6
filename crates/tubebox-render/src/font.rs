//! Glyph rasterization and caching
//!
//! Two faces are loaded at startup: a display face for titles and the logo
//! fallback, and a body face for everything else. Glyphs are rasterized on
//! first use per (face, codepoint, size) into an RGBA texture with the
//! coverage in the alpha channel, and kept until process exit. `reset_gl`
//! forgets the textures but keeps the loaded font data, so the caches refill
//! cheaply after a handoff.

use crate::{Color, Draw2d, RenderError, Result};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.35;

/// Which of the two loaded faces to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Titles and the logo fallback
    Display,
    /// Body text, menus, status line
    Body,
}

/// A cached, uploaded glyph
struct Glyph {
    texture: Option<glow::NativeTexture>,
    width: u32,
    height: u32,
    /// Horizontal bearing (left side)
    left: i32,
    /// Vertical bearing (distance from baseline to bitmap top)
    top: i32,
    /// Horizontal advance to the next pen position
    advance: f32,
}

/// Lazy per-(face, codepoint, size) glyph cache over two loaded faces
pub struct FontAtlas {
    font_system: FontSystem,
    swash: SwashCache,
    display_family: String,
    body_family: String,
    glyphs: HashMap<(FontFace, char, u32), Option<Glyph>>,
}

impl FontAtlas {
    /// Load both faces from TTF files.
    pub fn new(display_ttf: &Path, body_ttf: &Path) -> Result<Self> {
        let mut db = cosmic_text::fontdb::Database::new();

        let display_family = load_face(&mut db, display_ttf)?;
        let body_family = load_face(&mut db, body_ttf)?;
        info!(
            "Fonts loaded: display='{}', body='{}'",
            display_family, body_family
        );

        let font_system = FontSystem::new_with_locale_and_db("en-US".to_string(), db);

        Ok(Self {
            font_system,
            swash: SwashCache::new(),
            display_family,
            body_family,
            glyphs: HashMap::new(),
        })
    }

    /// Forget every glyph texture. Font data survives, so the next draw
    /// re-rasterizes from the warm shaping caches.
    pub fn reset_gl(&mut self) {
        debug!("FontAtlas: forgetting {} glyph textures", self.glyphs.len());
        self.glyphs.clear();
    }

    /// Number of cached glyph entries (tests and diagnostics).
    pub fn cached_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// Width in pixels of `text` at `size` (single line).
    pub fn measure(&mut self, gl: &glow::Context, text: &str, size: f32, face: FontFace) -> f32 {
        let size_key = size_bucket(size);
        let mut width = 0.0;
        for ch in text.chars() {
            if ch == '\n' {
                break;
            }
            if let Some(glyph) = self.glyph(gl, ch, size_key, face) {
                width += glyph.advance;
            }
        }
        width
    }

    /// Draw `text` with its baseline starting at (x, y). Newlines advance by
    /// a size-proportional line height. Returns the final pen position.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        gl: &glow::Context,
        draw2d: &mut Draw2d,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        face: FontFace,
        color: Color,
    ) -> (f32, f32) {
        let size_key = size_bucket(size);
        let line_height = size * LINE_HEIGHT_FACTOR;
        let mut pen_x = x;
        let mut pen_y = y;

        for ch in text.chars() {
            if ch == '\n' {
                pen_x = x;
                pen_y += line_height;
                continue;
            }

            let Some(glyph) = self.glyph(gl, ch, size_key, face) else {
                continue;
            };
            let (advance, tex, gx, gy, gw, gh) = (
                glyph.advance,
                glyph.texture,
                pen_x + glyph.left as f32,
                pen_y - glyph.top as f32,
                glyph.width as f32,
                glyph.height as f32,
            );
            if let Some(texture) = tex {
                draw2d.textured_rect(gl, texture, gx, gy, gw, gh, color);
            }
            pen_x += advance;
        }

        (pen_x, pen_y)
    }

    fn family(&self, face: FontFace) -> &str {
        match face {
            FontFace::Display => &self.display_family,
            FontFace::Body => &self.body_family,
        }
    }

    /// Fetch a glyph from the cache, rasterizing and uploading on miss.
    fn glyph(&mut self, gl: &glow::Context, ch: char, size: u32, face: FontFace) -> Option<&Glyph> {
        let key = (face, ch, size);
        if !self.glyphs.contains_key(&key) {
            let glyph = self.rasterize(gl, ch, size, face);
            self.glyphs.insert(key, glyph);
        }
        self.glyphs.get(&key).and_then(|g| g.as_ref())
    }

    fn rasterize(&mut self, gl: &glow::Context, ch: char, size: u32, face: FontFace) -> Option<Glyph> {
        let family = self.family(face).to_string();
        let metrics = Metrics::new(size as f32, size as f32 * LINE_HEIGHT_FACTOR);

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_text(
            &mut self.font_system,
            &ch.to_string(),
            Attrs::new().family(Family::Name(&family)),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let run = buffer.layout_runs().next()?;
        let layout_glyph = run.glyphs.first()?;
        let advance = layout_glyph.w;
        let physical = layout_glyph.physical((0.0, 0.0), 1.0);

        let image = self
            .swash
            .get_image_uncached(&mut self.font_system, physical.cache_key)?;

        let placement = image.placement;
        if placement.width == 0 || placement.height == 0 {
            // Whitespace: advance only, nothing to upload.
            return Some(Glyph {
                texture: None,
                width: 0,
                height: 0,
                left: placement.left,
                top: placement.top,
                advance,
            });
        }

        // Coverage goes into alpha; RGB stays white and is tinted by the
        // color uniform at draw time.
        let pixel_count = (placement.width * placement.height) as usize;
        let mut rgba = vec![255u8; pixel_count * 4];
        match image.content {
            SwashContent::Mask => {
                for (i, &coverage) in image.data.iter().enumerate() {
                    rgba[i * 4 + 3] = coverage;
                }
            }
            SwashContent::Color => {
                rgba.copy_from_slice(&image.data);
            }
            SwashContent::SubpixelMask => {
                warn!("Subpixel glyph for {:?}, flattening", ch);
                for i in 0..pixel_count {
                    rgba[i * 4 + 3] = image.data[i * 3];
                }
            }
        }

        let texture =
            crate::texture::upload_rgba_texture(gl, placement.width, placement.height, &rgba)
                .ok()?;

        Some(Glyph {
            texture: Some(texture),
            width: placement.width,
            height: placement.height,
            left: placement.left,
            top: placement.top,
            advance,
        })
    }
}

/// Sizes are bucketed to whole pixels so nearby float sizes share textures.
fn size_bucket(size: f32) -> u32 {
    size.round().max(1.0) as u32
}

fn load_face(db: &mut cosmic_text::fontdb::Database, path: &Path) -> Result<String> {
    let before = db.faces().count();
    db.load_font_file(path)
        .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;

    db.faces()
        .nth(before)
        .and_then(|face| face.families.first().map(|(name, _)| name.clone()))
        .ok_or_else(|| RenderError::Font(format!("{}: no face in file", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_buckets_round_to_pixels() {
        assert_eq!(size_bucket(13.9), 14);
        assert_eq!(size_bucket(14.2), 14);
        assert_eq!(size_bucket(0.2), 1);
    }

    #[test]
    fn same_codepoint_same_size_shares_a_bucket() {
        // The cache key is (face, char, bucket); two requests at 18.1 and
        // 17.8 must land on one texture.
        assert_eq!(size_bucket(18.1), size_bucket(17.8));
    }

    #[test]
    fn distinct_sizes_use_distinct_buckets() {
        let sizes = [10.0_f32, 14.0, 18.0, 22.0, 32.0, 48.0];
        let buckets: std::collections::HashSet<u32> =
            sizes.iter().map(|s| size_bucket(*s)).collect();
        assert_eq!(buckets.len(), sizes.len());
    }
}
