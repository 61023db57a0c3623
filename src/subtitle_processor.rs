use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Context, Result as AnyResult, anyhow};
use log::{warn, debug};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::file_utils::{FileManager, FileType};

// @module: Subtitle loading and timeline queries

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: WebVTT cue timing line, hours optional
static VTT_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})\s+-->\s+(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})").unwrap()
});

// @const: HTML-ish markup (<i>, <font color=..>, <c.yellow>, <v Bob>, <00:01.000>)
static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z0-9][^>]*>|<\d{1,2}:\d{2}(?::\d{2})?\.\d{3}>").unwrap()
});

// @const: ASS override blocks
static ASS_OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\[^}]*\}").unwrap()
});

/// Text subtitle formats accepted as burn sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    WebVtt,
}

impl SubtitleFormat {
    /// Format for a file extension, if recognised
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::WebVtt),
            _ => None,
        }
    }
}

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, markup preserved
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range and non-empty text
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> AnyResult<Self> {
        if end_time_ms <= start_time_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_time_ms, start_time_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty subtitle text for entry {}", seq_num));
        }

        Ok(SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> AnyResult<u64> {
        let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Whether the entry is on screen at `position_ms` (both ends inclusive)
    pub fn is_active_at(&self, position_ms: u64) -> bool {
        self.start_time_ms <= position_ms && position_ms <= self.end_time_ms
    }

    /// Text without markup
    pub fn plaintext(&self) -> String {
        plaintext(&self.text)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_time_ms),
            Self::format_timestamp(self.end_time_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Strip markup from subtitle text.
///
/// Removes HTML-like tags, WebVTT voice/class/timestamp tags and ASS override
/// blocks, decodes the common entities and turns `\N` / `\n` escapes into newlines.
pub fn plaintext(text: &str) -> String {
    let without_ass = ASS_OVERRIDE_REGEX.replace_all(text, "");
    let without_tags = MARKUP_TAG_REGEX.replace_all(&without_ass, "");
    without_tags
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// One loaded subtitle track
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    /// File the track was loaded from
    pub source_file: PathBuf,

    /// Original format
    pub format: SubtitleFormat,

    /// Entries in the order they appear on the timeline
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    pub fn new(source_file: PathBuf, format: SubtitleFormat) -> Self {
        SubtitleTrack {
            source_file,
            format,
            entries: Vec::new(),
        }
    }

    /// Load an SRT or WebVTT file, detecting the format by extension or content
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = FileManager::read_subtitle_text(path).map_err(|e| SubtitleError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let format = match FileManager::detect_file_type(path) {
            Ok(FileType::Subtitle(format)) => format,
            _ => Self::sniff_format(&content)
                .ok_or_else(|| SubtitleError::UnsupportedFormat(path.to_path_buf()))?,
        };

        let entries = match format {
            SubtitleFormat::Srt => Self::parse_srt_string(&content)?,
            SubtitleFormat::WebVtt => Self::parse_vtt_string(&content)?,
        };

        debug!("Loaded {} entries from {:?} ({:?})", entries.len(), path, format);

        Ok(SubtitleTrack {
            source_file: path.to_path_buf(),
            format,
            entries,
        })
    }

    /// Guess the format from file content
    pub fn sniff_format(content: &str) -> Option<SubtitleFormat> {
        let head = content.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            return Some(SubtitleFormat::WebVtt);
        }
        if TIMESTAMP_REGEX.is_match(content) {
            return Some(SubtitleFormat::Srt);
        }
        None
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> AnyResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            FileManager::ensure_dir(parent)?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for entry in &self.entries {
            write!(file, "{}", entry)?;
        }

        Ok(())
    }

    /// Text visible at `position_ms`: every active entry's plaintext, one per line.
    /// Empty when nothing is on screen.
    pub fn active_text(&self, position_ms: u64) -> String {
        let mut text = String::new();
        for entry in self.entries.iter().filter(|e| e.is_active_at(position_ms)) {
            text.push_str(&entry.plaintext());
            text.push('\n');
        }
        text.trim().to_string()
    }

    /// Re-time the track for a clip that starts at `start_ms` and lasts `duration_ms`.
    ///
    /// Entries overlapping the window are kept and shifted so the clip starts at zero;
    /// their times are clamped to `[0, duration_ms]`.
    pub fn clip_window(&self, start_ms: u64, duration_ms: u64) -> SubtitleTrack {
        let end_ms = start_ms + duration_ms;
        let entries = self
            .entries
            .iter()
            .filter(|e| e.end_time_ms > start_ms && e.start_time_ms < end_ms)
            .map(|e| SubtitleEntry {
                seq_num: e.seq_num,
                start_time_ms: e.start_time_ms.saturating_sub(start_ms),
                end_time_ms: (e.end_time_ms - start_ms).min(duration_ms),
                text: e.text.clone(),
            })
            .collect();

        SubtitleTrack {
            source_file: self.source_file.clone(),
            format: self.format,
            entries,
        }
    }

    /// End of the last entry
    pub fn last_end_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.end_time_ms).max().unwrap_or(0)
    }

    /// Parse SRT format string into subtitle entries
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();

        let mut current_seq_num: Option<usize> = None;
        let mut current_start_time_ms: Option<u64> = None;
        let mut current_end_time_ms: Option<u64> = None;
        let mut current_text = String::new();
        let mut line_count = 0;
        let mut blocks_seen = 0usize;

        let mut add_current_entry = |seq_num: usize, start_ms: u64, end_ms: u64, text: &str| {
            match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, text.trim().to_string()) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
            }
        };

        for line in content.lines() {
            line_count += 1;
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            // Blank line closes the current entry
            if trimmed.is_empty() {
                if let (Some(seq_num), Some(start_ms), Some(end_ms)) = (current_seq_num, current_start_time_ms, current_end_time_ms) {
                    if current_text.is_empty() {
                        warn!("Skipping subtitle entry {} without text (line {})", seq_num, line_count);
                    } else {
                        add_current_entry(seq_num, start_ms, end_ms, &current_text);
                    }
                }
                current_seq_num = None;
                current_start_time_ms = None;
                current_end_time_ms = None;
                current_text.clear();
                continue;
            }

            if current_seq_num.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    blocks_seen += 1;
                    continue;
                }
                // Cue without an index line
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    blocks_seen += 1;
                    current_seq_num = Some(blocks_seen);
                    current_start_time_ms = Some(Self::parse_timestamp_to_ms(&caps, 1));
                    current_end_time_ms = Some(Self::parse_timestamp_to_ms(&caps, 5));
                    continue;
                }
            }

            if current_seq_num.is_some() && current_start_time_ms.is_none() && current_end_time_ms.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    current_start_time_ms = Some(Self::parse_timestamp_to_ms(&caps, 1));
                    current_end_time_ms = Some(Self::parse_timestamp_to_ms(&caps, 5));
                    continue;
                }
            }

            if current_seq_num.is_some() && current_start_time_ms.is_some() && current_end_time_ms.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
            }
        }

        if let (Some(seq_num), Some(start_ms), Some(end_ms)) = (current_seq_num, current_start_time_ms, current_end_time_ms) {
            if !current_text.is_empty() {
                add_current_entry(seq_num, start_ms, end_ms, &current_text);
            }
        }

        Self::finish_entries(entries)
    }

    /// Parse WebVTT content into subtitle entries
    pub fn parse_vtt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        let mut blocks = normalized
            .split("\n\n")
            .map(|block| block.trim_matches(|c| c == '\n' || c == '\r'));

        let header = blocks.next().unwrap_or_default();
        if !header.trim_start().starts_with("WEBVTT") {
            return Err(SubtitleError::Malformed("missing WEBVTT header".to_string()));
        }

        let mut entries = Vec::new();
        for (index, block) in blocks.enumerate() {
            let mut lines = block.lines().peekable();
            let Some(first) = lines.peek().copied() else {
                continue;
            };
            let first = first.trim();
            if first.starts_with("NOTE") || first.starts_with("STYLE") || first.starts_with("REGION") {
                continue;
            }

            // Optional cue identifier
            if !first.contains("-->") {
                lines.next();
            }

            let Some(timing) = lines.next() else {
                continue;
            };
            let Some(caps) = VTT_TIMING_REGEX.captures(timing.trim()) else {
                warn!("Skipping WebVTT cue with unreadable timing: {}", timing.trim());
                continue;
            };

            let start_ms = Self::parse_vtt_time(&caps, 1);
            let end_ms = Self::parse_vtt_time(&caps, 5);
            let text = lines.map(str::trim).collect::<Vec<_>>().join("\n");

            match SubtitleEntry::new_validated(index + 1, start_ms, end_ms, text) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping invalid WebVTT cue {}: {}", index + 1, e),
            }
        }

        Self::finish_entries(entries)
    }

    /// Sort, report overlaps and renumber
    fn finish_entries(mut entries: Vec<SubtitleEntry>) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        if entries.is_empty() {
            warn!("No valid subtitle entries found in content");
            return Err(SubtitleError::Empty);
        }

        entries.sort_by_key(|entry| entry.start_time_ms);

        let overlap_count = entries
            .windows(2)
            .filter(|pair| pair[0].end_time_ms > pair[1].start_time_ms)
            .count();
        if overlap_count > 0 {
            debug!("Found {} overlapping subtitle entries", overlap_count);
        }

        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        Ok(entries)
    }

    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let part = |offset: usize| -> u64 {
            caps.get(start_idx + offset)
                .map_or(0, |m| m.as_str().parse().unwrap_or(0))
        };
        (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
    }

    fn parse_vtt_time(caps: &regex::Captures, start_idx: usize) -> u64 {
        // Same layout as SRT captures; a missing hour group parses as zero
        Self::parse_timestamp_to_ms(caps, start_idx)
    }
}

impl fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Track")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Format: {:?}", self.format)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
