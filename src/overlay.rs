//! Preview placement of subtitle text boxes.
//!
//! Mirrors how the burned result is laid out: bottom-aligned text sits
//! `margin_v` plus twice the outline above the bottom edge, centered horizontally
//! unless the alignment picks a side column.

use crate::ass_writer::PLAY_RES_Y;
use crate::style::SubtitleStyle;

/// Top-left corner and size of a placed text box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayLayout {
    /// Place a `text_w` x `text_h` box inside a `scene_w` x `scene_h` scene.
    /// All values, including the style's margins, share one coordinate space.
    pub fn place(scene_w: f64, scene_h: f64, text_w: f64, text_h: f64, style: &SubtitleStyle) -> Self {
        let outline_adjust = style.outline as f64 * 2.0;
        let margin_v = style.margin_v as f64;

        let x = match style.alignment.column() {
            0 => style.margin_l as f64,
            2 => scene_w - text_w - style.margin_r as f64,
            _ => (scene_w - text_w) / 2.0,
        };

        let y = if style.alignment.is_top() {
            margin_v + outline_adjust
        } else if style.alignment.is_middle() {
            (scene_h - text_h) / 2.0
        } else {
            scene_h - text_h - margin_v - outline_adjust
        };

        Self { x, y, width: text_w, height: text_h }
    }

    /// Place `text` in a video of `video_w` x `video_h` pixels.
    ///
    /// Style metrics are defined in ASS script space, so they are scaled by the
    /// ratio between the video height and the script height first.
    pub fn place_in_video(video_w: u32, video_h: u32, text: &str, style: &SubtitleStyle) -> Self {
        let scale = video_h as f64 / PLAY_RES_Y as f64;
        let mut scaled = style.clone();
        scaled.margin_v = (style.margin_v as f64 * scale).round() as u32;
        scaled.margin_l = (style.margin_l as f64 * scale).round() as u32;
        scaled.margin_r = (style.margin_r as f64 * scale).round() as u32;
        scaled.outline = (style.outline as f64 * scale) as f32;

        let (w, h) = estimate_box(text, style.font_size as f64 * scale);
        Self::place(video_w as f64, video_h as f64, w, h, &scaled)
    }
}

/// Rough text box for `text` at `font_size`: wide glyphs (CJK) count as one em,
/// others as 0.6 em; each line is 1.2 em tall. Empty text has no size.
pub fn estimate_box(text: &str, font_size: f64) -> (f64, f64) {
    if text.trim().is_empty() {
        return (0.0, 0.0);
    }

    let lines: Vec<&str> = text.lines().collect();
    let widest = lines
        .iter()
        .map(|line| {
            line.chars()
                .map(|c| if is_wide(c) { 1.0 } else { 0.6 })
                .sum::<f64>()
        })
        .fold(0.0_f64, f64::max);

    (widest * font_size, lines.len() as f64 * font_size * 1.2)
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}
