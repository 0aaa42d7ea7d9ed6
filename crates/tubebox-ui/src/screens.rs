//! Screen composition
//!
//! Free functions that read state and emit quads. The frame-wide fade alpha
//! is already set on `Draw2d` by the orchestrator before any of these run;
//! nothing here animates on its own except the spinner and the pulsing
//! loading text, which derive from the frame time.

use glam::Vec2;
use tubebox_core::{
    keyboard::KEYBOARD_ROWS, MenuManager, PlaylistSet, Settings, UiState, VirtualKeyboard,
};
use tubebox_render::{Color, Draw2d, FontAtlas, FontFace};

use crate::theme;

/// Everything a draw function needs for one frame
pub struct UiFrame<'a> {
    pub gl: &'a glow::Context,
    pub draw: &'a mut Draw2d,
    pub fonts: &'a mut FontAtlas,
    /// Full display resolution
    pub size: (u32, u32),
    /// Engine clock, seconds
    pub time: f64,
}

impl UiFrame<'_> {
    fn width(&self) -> f32 {
        self.size.0 as f32
    }

    fn height(&self) -> f32 {
        self.size.1 as f32
    }
}

/// The main menu: selected playlist title, curator, and navigation arrows.
pub fn draw_menu(frame: &mut UiFrame, playlists: &PlaylistSet, ui: &UiState) {
    let media: Vec<_> = playlists.media().collect();
    let center_x = frame.width() / 2.0;
    let center_y = frame.height() / 2.0;

    if media.is_empty() {
        let text = "No playlists yet";
        let w = frame
            .fonts
            .measure(frame.gl, text, theme::TITLE_SIZE, FontFace::Display);
        frame.fonts.draw(
            frame.gl,
            frame.draw,
            text,
            center_x - w / 2.0,
            center_y,
            theme::TITLE_SIZE,
            FontFace::Display,
            theme::TEXT_DIM,
        );
        let hint = "Upload one from the admin page (Info in settings)";
        let w = frame
            .fonts
            .measure(frame.gl, hint, theme::SMALL_SIZE, FontFace::Body);
        frame.fonts.draw(
            frame.gl,
            frame.draw,
            hint,
            center_x - w / 2.0,
            center_y + 48.0,
            theme::SMALL_SIZE,
            FontFace::Body,
            theme::TEXT_DIM,
        );
        return;
    }

    let index = ui.selected_playlist_index.min(media.len() - 1);
    let (_, playlist) = media[index];

    let title_w = frame
        .fonts
        .measure(frame.gl, &playlist.title, theme::TITLE_SIZE, FontFace::Display);
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        &playlist.title,
        center_x - title_w / 2.0,
        center_y - 20.0,
        theme::TITLE_SIZE,
        FontFace::Display,
        theme::TEXT,
    );

    let sub = format!(
        "curated by {}  |  {} items{}",
        playlist.curator,
        playlist.len(),
        if playlist.loop_playback { "  |  loops" } else { "" }
    );
    let sub_w = frame
        .fonts
        .measure(frame.gl, &sub, theme::BODY_SIZE, FontFace::Body);
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        &sub,
        center_x - sub_w / 2.0,
        center_y + 24.0,
        theme::BODY_SIZE,
        FontFace::Body,
        theme::TEXT_DIM,
    );

    // Position dots.
    let dot_gap = 18.0;
    let dots_w = dot_gap * (media.len() as f32 - 1.0);
    for i in 0..media.len() {
        let x = center_x - dots_w / 2.0 + i as f32 * dot_gap;
        let color = if i == index {
            theme::HIGHLIGHT
        } else {
            theme::TEXT_DIM
        };
        frame
            .draw
            .fill_rect(frame.gl, x - 3.0, center_y + 64.0, 6.0, 6.0, color);
    }

    // Nav arrows, only when there is more than one playlist.
    if media.len() > 1 {
        let arrow_y = center_y - 36.0;
        frame.draw.triangle(
            frame.gl,
            60.0,
            arrow_y,
            90.0,
            arrow_y - 22.0,
            90.0,
            arrow_y + 22.0,
            theme::HIGHLIGHT,
        );
        frame.draw.triangle(
            frame.gl,
            frame.width() - 60.0,
            arrow_y,
            frame.width() - 90.0,
            arrow_y - 22.0,
            frame.width() - 90.0,
            arrow_y + 22.0,
            theme::HIGHLIGHT,
        );
    }
}

/// The 50% darkener between video and UI in the composed playback screen.
pub fn draw_darkener(frame: &mut UiFrame) {
    frame
        .draw
        .fill_rect(frame.gl, 0.0, 0.0, frame.width(), frame.height(), theme::DARKENER);
}

/// Now-playing line drawn at the bottom of the composed playback screen.
pub fn draw_now_playing(frame: &mut UiFrame, title: &str, artist: &str, position: f64, duration: f64) {
    let y = frame.height() - 72.0;
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        title,
        48.0,
        y,
        theme::BODY_SIZE,
        FontFace::Display,
        theme::TEXT,
    );
    if !artist.is_empty() {
        frame.fonts.draw(
            frame.gl,
            frame.draw,
            artist,
            48.0,
            y + 26.0,
            theme::SMALL_SIZE,
            FontFace::Body,
            theme::TEXT_DIM,
        );
    }

    // Progress bar.
    if duration > 0.0 {
        let bar_w = frame.width() - 96.0;
        let t = (position / duration).clamp(0.0, 1.0) as f32;
        frame.draw.fill_rect(
            frame.gl,
            48.0,
            y + 40.0,
            bar_w,
            4.0,
            Color::rgba(1.0, 1.0, 1.0, 0.25),
        );
        frame
            .draw
            .fill_rect(frame.gl, 48.0, y + 40.0, bar_w * t, 4.0, theme::HIGHLIGHT);
    }
}

/// Right-half settings panel with the section-colored accent bar.
pub fn draw_settings_overlay(
    frame: &mut UiFrame,
    menu: &MenuManager,
    settings: &Settings,
    playlists: &PlaylistSet,
) {
    let panel_x = frame.width() / 2.0;
    let panel_w = frame.width() / 2.0;
    frame
        .draw
        .fill_rect(frame.gl, panel_x, 0.0, panel_w, frame.height(), theme::PANEL);
    frame.draw.fill_rect(
        frame.gl,
        panel_x,
        0.0,
        6.0,
        frame.height(),
        theme::section_accent(menu.section()),
    );

    let entries = menu.entries(settings, playlists);
    let selected = menu.selection();
    let mut y = 80.0;
    for (i, entry) in entries.iter().enumerate() {
        let color = if i == selected {
            theme::HIGHLIGHT
        } else if entry.command.is_some() {
            theme::TEXT
        } else {
            theme::TEXT_DIM
        };
        if i == selected {
            frame.fonts.draw(
                frame.gl,
                frame.draw,
                ">",
                panel_x + 28.0,
                y,
                theme::MENU_SIZE,
                FontFace::Body,
                theme::HIGHLIGHT,
            );
        }
        frame.fonts.draw(
            frame.gl,
            frame.draw,
            &entry.label,
            panel_x + 52.0,
            y,
            theme::MENU_SIZE,
            FontFace::Body,
            color,
        );
        y += theme::MENU_SIZE * 1.8;
    }
}

/// Transient status line (skip messages, errors).
pub fn draw_status_line(frame: &mut UiFrame, text: &str) {
    let y = frame.height() - 24.0;
    frame.draw.fill_rect(
        frame.gl,
        0.0,
        y - 20.0,
        frame.width(),
        28.0,
        Color::rgba(0.0, 0.0, 0.0, 0.6),
    );
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        text,
        24.0,
        y,
        theme::SMALL_SIZE,
        FontFace::Body,
        theme::STATUS,
    );
}

/// Master volume overlay.
pub fn draw_volume_overlay(frame: &mut UiFrame, volume: u8) {
    let w = 260.0;
    let x = frame.width() / 2.0 - w / 2.0;
    let y = frame.height() - 120.0;

    frame
        .draw
        .fill_rect(frame.gl, x, y, w, 48.0, Color::rgba(0.0, 0.0, 0.0, 0.7));
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        "VOL",
        x + 14.0,
        y + 30.0,
        theme::SMALL_SIZE,
        FontFace::Body,
        theme::TEXT_DIM,
    );
    let bar_x = x + 64.0;
    let bar_w = w - 80.0;
    frame.draw.fill_rect(
        frame.gl,
        bar_x,
        y + 20.0,
        bar_w,
        8.0,
        Color::rgba(1.0, 1.0, 1.0, 0.2),
    );
    frame.draw.fill_rect(
        frame.gl,
        bar_x,
        y + 20.0,
        bar_w * volume as f32 / 100.0,
        8.0,
        theme::HIGHLIGHT,
    );
}

/// Loading spinner: a slow-rotating square plus pulsing text.
pub fn draw_loading(frame: &mut UiFrame, label: &str) {
    let center = Vec2::new(frame.width() / 2.0, frame.height() / 2.0);
    let angle = (frame.time * 1.6) as f32;
    frame.draw.rotated_square(
        frame.gl,
        center.x,
        center.y - 30.0,
        26.0,
        angle,
        theme::HIGHLIGHT,
    );

    let pulse = 0.55 + 0.45 * ((frame.time * 3.0).sin() * 0.5 + 0.5) as f32;
    let w = frame
        .fonts
        .measure(frame.gl, label, theme::BODY_SIZE, FontFace::Body);
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        label,
        center.x - w / 2.0,
        center.y + 52.0,
        theme::BODY_SIZE,
        FontFace::Body,
        theme::TEXT.with_alpha(pulse),
    );
}

/// Full-screen black overlay (intro fade-out, handoff blanking).
pub fn draw_black_overlay(frame: &mut UiFrame, alpha: f32) {
    frame.draw.fill_rect(
        frame.gl,
        0.0,
        0.0,
        frame.width(),
        frame.height(),
        Color::BLACK.with_alpha(alpha),
    );
}

/// The modal virtual keyboard.
pub fn draw_keyboard(frame: &mut UiFrame, keyboard: &VirtualKeyboard) {
    let cell = Vec2::new(44.0, 44.0);
    let cols = KEYBOARD_ROWS[0].chars().count() as f32;
    let grid_w = cols * cell.x;
    let grid_h = KEYBOARD_ROWS.len() as f32 * cell.y;
    let origin = Vec2::new(
        frame.width() / 2.0 - grid_w / 2.0,
        frame.height() / 2.0 - grid_h / 2.0,
    );

    // Backdrop, prompt and buffer.
    frame.draw.fill_rect(
        frame.gl,
        origin.x - 24.0,
        origin.y - 110.0,
        grid_w + 48.0,
        grid_h + 150.0,
        theme::PANEL,
    );
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        &keyboard.prompt,
        origin.x,
        origin.y - 76.0,
        theme::MENU_SIZE,
        FontFace::Body,
        theme::TEXT_DIM,
    );
    let shown = format!("{}_", keyboard.buffer);
    frame.fonts.draw(
        frame.gl,
        frame.draw,
        &shown,
        origin.x,
        origin.y - 40.0,
        theme::BODY_SIZE,
        FontFace::Body,
        theme::TEXT,
    );

    for (row_idx, row) in KEYBOARD_ROWS.iter().enumerate() {
        for (col_idx, ch) in row.chars().enumerate() {
            let pos = origin + Vec2::new(col_idx as f32 * cell.x, row_idx as f32 * cell.y);
            let selected = keyboard.row == row_idx && keyboard.col == col_idx;
            if selected {
                frame.draw.fill_rect(
                    frame.gl,
                    pos.x + 2.0,
                    pos.y + 2.0,
                    cell.x - 4.0,
                    cell.y - 4.0,
                    theme::HIGHLIGHT.with_alpha(0.3),
                );
            }
            let label = match ch {
                '\u{8}' => "<-".to_string(),
                '\u{15}' => "CLR".to_string(),
                '\u{a}' => "OK".to_string(),
                c => c.to_string(),
            };
            frame.fonts.draw(
                frame.gl,
                frame.draw,
                &label,
                pos.x + 14.0,
                pos.y + 30.0,
                theme::MENU_SIZE,
                FontFace::Body,
                if selected { theme::HIGHLIGHT } else { theme::TEXT },
            );
        }
    }
}
