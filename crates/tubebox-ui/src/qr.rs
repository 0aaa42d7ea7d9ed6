//! QR code pane for the Info section
//!
//! The matrix is generated once per URL change and kept as booleans; drawing
//! is a grid of black quads on a white card, so nothing here owns a GL
//! handle and handoffs cost the pane nothing.

use qrcode::QrCode;
use tracing::warn;
use tubebox_render::{Color, Draw2d};

/// Cached QR matrix for the currently shown URL
#[derive(Default)]
pub struct QrPane {
    url: String,
    modules: Vec<bool>,
    width: usize,
}

impl QrPane {
    /// Empty pane; nothing drawn until a URL is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate the matrix if `url` differs from the cached one.
    pub fn set_url(&mut self, url: &str) {
        if url == self.url {
            return;
        }
        match QrCode::new(url.as_bytes()) {
            Ok(code) => {
                self.width = code.width();
                self.modules = code
                    .to_colors()
                    .into_iter()
                    .map(|c| c == qrcode::Color::Dark)
                    .collect();
                self.url = url.to_string();
            }
            Err(e) => {
                warn!("QR generation failed for '{}': {}", url, e);
                self.modules.clear();
                self.width = 0;
                self.url.clear();
            }
        }
    }

    /// The URL currently encoded.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Module count along one side.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Draw the code inside a white card at (x, y), `size` pixels square.
    pub fn draw(&self, gl: &glow::Context, draw: &mut Draw2d, x: f32, y: f32, size: f32) {
        if self.width == 0 {
            return;
        }

        // Quiet zone: the white card extends two modules past the code.
        let module = size / self.width as f32;
        let margin = module * 2.0;
        draw.fill_rect(
            gl,
            x - margin,
            y - margin,
            size + margin * 2.0,
            size + margin * 2.0,
            Color::WHITE,
        );

        for row in 0..self.width {
            for col in 0..self.width {
                if self.modules[row * self.width + col] {
                    draw.fill_rect(
                        gl,
                        x + col as f32 * module,
                        y + row as f32 * module,
                        module + 0.5,
                        module + 0.5,
                        Color::BLACK,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_generated_once_per_url() {
        let mut pane = QrPane::new();
        pane.set_url("http://10.0.0.2/admin");
        let width = pane.width();
        assert!(width > 0);

        // Same URL: nothing regenerated (width and data identical).
        pane.set_url("http://10.0.0.2/admin");
        assert_eq!(pane.width(), width);

        // New URL: regenerated.
        pane.set_url("http://10.0.0.3/admin");
        assert!(pane.width() > 0);
        assert_eq!(pane.url(), "http://10.0.0.3/admin");
    }

    #[test]
    fn empty_pane_draws_nothing() {
        let pane = QrPane::new();
        assert_eq!(pane.width(), 0);
    }

    #[test]
    fn modules_match_width_squared() {
        let mut pane = QrPane::new();
        pane.set_url("http://example.com");
        assert_eq!(pane.modules.len(), pane.width() * pane.width());
    }
}
