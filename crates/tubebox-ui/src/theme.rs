//! Colors and layout constants

use tubebox_core::MenuSection;
use tubebox_render::Color;

/// Menu background
pub const BACKGROUND: Color = Color::rgb(0.05, 0.05, 0.09);
/// Primary text
pub const TEXT: Color = Color::rgb(0.92, 0.92, 0.88);
/// Secondary text (curator lines, hints)
pub const TEXT_DIM: Color = Color::rgb(0.55, 0.55, 0.52);
/// Selection highlight
pub const HIGHLIGHT: Color = Color::rgb(1.0, 0.72, 0.2);
/// Darkener drawn between video and UI
pub const DARKENER: Color = Color::rgba(0.0, 0.0, 0.0, 0.5);
/// Settings panel background
pub const PANEL: Color = Color::rgba(0.07, 0.07, 0.11, 0.94);
/// Status line text
pub const STATUS: Color = Color::rgb(1.0, 0.45, 0.35);

/// Title size for the playlist screen
pub const TITLE_SIZE: f32 = 48.0;
/// Body text size
pub const BODY_SIZE: f32 = 22.0;
/// Menu entry size
pub const MENU_SIZE: f32 = 18.0;
/// Small print (status line, hints)
pub const SMALL_SIZE: f32 = 14.0;

/// Accent bar color per settings section
pub fn section_accent(section: MenuSection) -> Color {
    match section {
        MenuSection::Root => Color::rgb(1.0, 0.72, 0.2),
        MenuSection::Display => Color::rgb(0.35, 0.65, 1.0),
        MenuSection::Audio => Color::rgb(0.4, 0.85, 0.5),
        MenuSection::Effects => Color::rgb(0.85, 0.45, 0.9),
        MenuSection::Games => Color::rgb(1.0, 0.4, 0.4),
        MenuSection::Info => Color::rgb(0.55, 0.8, 0.85),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_has_a_distinct_accent() {
        let sections = [
            MenuSection::Root,
            MenuSection::Display,
            MenuSection::Audio,
            MenuSection::Effects,
            MenuSection::Games,
            MenuSection::Info,
        ];
        for (i, a) in sections.iter().enumerate() {
            for b in sections.iter().skip(i + 1) {
                assert_ne!(section_accent(*a), section_accent(*b));
            }
        }
    }
}
