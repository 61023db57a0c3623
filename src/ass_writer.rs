//! ASS (Advanced SubStation Alpha) documents for burning a track with ffmpeg's
//! `ass` filter.
//!
//! Each loaded track is written as its own document carrying one style, so the two
//! tracks can be positioned and colored independently and chained in one filtergraph.

use std::fmt::Write;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::file_utils::FileManager;
use crate::style::SubtitleStyle;
use crate::subtitle_processor::SubtitleTrack;

/// libass script resolution used when a file declares none; font sizes and margins
/// are expressed in this coordinate space
pub const PLAY_RES_X: u32 = 384;
pub const PLAY_RES_Y: u32 = 288;

static SIMPLE_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)([bius])\s*>").unwrap());

static ANY_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z0-9][^>]*>|<\d{1,2}:\d{2}(?::\d{2})?\.\d{3}>").unwrap());

/// A single `Dialogue:` line
#[derive(Debug, Clone, PartialEq)]
pub struct AssEvent {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// A complete ASS document with one style
#[derive(Debug, Clone)]
pub struct AssDocument {
    pub style_name: String,
    pub style: SubtitleStyle,
    pub events: Vec<AssEvent>,
}

impl AssDocument {
    /// Build a document for `track` rendered with `style`.
    ///
    /// Every event is prefixed with the style's primary color override so the color
    /// survives renderers that ignore the style table.
    pub fn from_track(track: &SubtitleTrack, style: &SubtitleStyle, style_name: &str) -> Self {
        let color_tag = style.primary_color.to_ass_override();
        let events = track
            .entries
            .iter()
            .map(|entry| AssEvent {
                start_ms: entry.start_time_ms,
                end_ms: entry.end_time_ms,
                text: format!("{}{}", color_tag, convert_markup(&entry.text)),
            })
            .collect();

        Self {
            style_name: style_name.to_string(),
            style: style.clone(),
            events,
        }
    }

    /// Render the document
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("[Script Info]\n");
        out.push_str("; Generated by dualsub\n");
        out.push_str("ScriptType: v4.00+\n");
        let _ = writeln!(out, "PlayResX: {}", PLAY_RES_X);
        let _ = writeln!(out, "PlayResY: {}", PLAY_RES_Y);
        out.push_str("WrapStyle: 0\n");
        out.push_str("ScaledBorderAndShadow: yes\n");
        out.push_str("Collisions: Normal\n");
        out.push('\n');

        out.push_str("[V4+ Styles]\n");
        out.push_str("Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n");
        out.push_str(&self.style.to_ass_style_line(&self.style_name));
        out.push_str("\n\n");

        out.push_str("[Events]\n");
        out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
        for event in &self.events {
            let _ = writeln!(
                out,
                "Dialogue: 0,{},{},{},,0,0,0,,{}",
                format_ass_time(event.start_ms),
                format_ass_time(event.end_ms),
                self.style_name,
                event.text
            );
        }

        out
    }

    /// Write the rendered document to `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        FileManager::write_to_file(path, &self.render())
    }
}

/// `H:MM:SS.cc`, centiseconds truncated
pub fn format_ass_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// Convert SRT/WebVTT markup into ASS event text.
///
/// `<i> <b> <u> <s>` become override tags, other tags are dropped, literal braces
/// are replaced so they cannot open override blocks, and line breaks become `\N`.
pub fn convert_markup(text: &str) -> String {
    let braces_safe = text.replace('{', "(").replace('}', ")");
    let simple = SIMPLE_TAG_REGEX.replace_all(&braces_safe, |caps: &regex::Captures| {
        let on = if caps[1].is_empty() { 1 } else { 0 };
        format!("{{\\{}{}}}", caps[2].to_lowercase(), on)
    });
    let stripped = ANY_TAG_REGEX.replace_all(&simple, "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\\N")
}
