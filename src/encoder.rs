/*!
 * Burn command composition.
 *
 * Turns an export request (source video, generated subtitle files, optional clip
 * range, encoder choice) into the argument list of a single ffmpeg invocation, and
 * the matching ffplay invocation for live preview.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::anyhow;

use crate::errors::ExportError;
use crate::timecode::format_seconds;

/// Video encoder used for the burn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEncoder {
    /// NVIDIA NVENC
    Nvenc,
    /// AMD AMF
    Amf,
    /// Intel Quick Sync
    Qsv,
    /// libx264 on the CPU
    Software,
}

impl HardwareEncoder {
    /// Pick the first hardware H.264 encoder present in `ffmpeg -encoders` output
    pub fn detect_from_listing(listing: &str) -> Self {
        if listing.contains("h264_nvenc") {
            HardwareEncoder::Nvenc
        } else if listing.contains("h264_amf") {
            HardwareEncoder::Amf
        } else if listing.contains("h264_qsv") {
            HardwareEncoder::Qsv
        } else {
            HardwareEncoder::Software
        }
    }

    /// Value for `-hwaccel`, if the encoder uses one
    pub fn hwaccel(&self) -> Option<&'static str> {
        match self {
            HardwareEncoder::Nvenc => Some("cuda"),
            HardwareEncoder::Amf => Some("auto"),
            HardwareEncoder::Qsv => Some("qsv"),
            HardwareEncoder::Software => None,
        }
    }

    /// Output codec arguments; `crf` only applies to the software encoder
    pub fn codec_args(&self, crf: u8) -> Vec<String> {
        let args: Vec<&str> = match self {
            HardwareEncoder::Nvenc => vec!["-c:v", "h264_nvenc", "-preset", "fast", "-cq", "23"],
            HardwareEncoder::Amf => vec!["-c:v", "h264_amf", "-usage", "lowlatency"],
            HardwareEncoder::Qsv => vec!["-c:v", "h264_qsv", "-preset", "veryfast"],
            HardwareEncoder::Software => {
                return vec![
                    "-c:v".to_string(),
                    "libx264".to_string(),
                    "-preset".to_string(),
                    "veryfast".to_string(),
                    "-crf".to_string(),
                    crf.to_string(),
                ];
            }
        };
        args.into_iter().map(String::from).collect()
    }
}

impl fmt::Display for HardwareEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HardwareEncoder::Nvenc => "NVIDIA NVENC (h264_nvenc)",
            HardwareEncoder::Amf => "AMD AMF (h264_amf)",
            HardwareEncoder::Qsv => "Intel Quick Sync (h264_qsv)",
            HardwareEncoder::Software => "software (libx264)",
        };
        write!(f, "{}", name)
    }
}

/// Encoder choice from configuration or the command line
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderPreference {
    /// Probe ffmpeg for a hardware encoder, fall back to software
    #[default]
    Auto,
    Software,
    Nvenc,
    Amf,
    Qsv,
}

impl EncoderPreference {
    /// The encoder this preference forces, or `None` for auto-detection
    pub fn forced(&self) -> Option<HardwareEncoder> {
        match self {
            EncoderPreference::Auto => None,
            EncoderPreference::Software => Some(HardwareEncoder::Software),
            EncoderPreference::Nvenc => Some(HardwareEncoder::Nvenc),
            EncoderPreference::Amf => Some(HardwareEncoder::Amf),
            EncoderPreference::Qsv => Some(HardwareEncoder::Qsv),
        }
    }
}

impl FromStr for EncoderPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "software" | "cpu" | "libx264" => Ok(Self::Software),
            "nvenc" => Ok(Self::Nvenc),
            "amf" => Ok(Self::Amf),
            "qsv" => Ok(Self::Qsv),
            _ => Err(anyhow!("Invalid encoder: {}", s)),
        }
    }
}

/// Portion of the source video to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRange {
    pub start_ms: u64,
    pub duration_ms: u64,
}

/// Everything needed to compose one burn invocation
#[derive(Debug, Clone)]
pub struct BurnRequest {
    pub video: PathBuf,
    /// Generated ASS files, drawn in order
    pub subtitle_files: Vec<PathBuf>,
    pub output: PathBuf,
    pub clip: Option<ClipRange>,
    pub encoder: HardwareEncoder,
    pub crf: u8,
}

impl BurnRequest {
    /// `-vf` value: one `ass=` filter per subtitle file
    pub fn filter_chain(&self) -> Result<String, ExportError> {
        subtitle_filter_chain(&self.subtitle_files)
    }

    /// Full ffmpeg argument list (without the program name):
    /// `[-hwaccel X] [-ss S] [-t D] -i video <codec> -vf <chain> -c:a copy -y out`
    pub fn to_args(&self) -> Result<Vec<String>, ExportError> {
        let filter = self.filter_chain()?;
        let mut args = Vec::new();

        if let Some(hwaccel) = self.encoder.hwaccel() {
            args.push("-hwaccel".to_string());
            args.push(hwaccel.to_string());
        }

        if let Some(clip) = self.clip {
            args.push("-ss".to_string());
            args.push(format_seconds(clip.start_ms));
            args.push("-t".to_string());
            args.push(format_seconds(clip.duration_ms));
        }

        args.push("-i".to_string());
        args.push(self.video.to_string_lossy().to_string());
        args.extend(self.encoder.codec_args(self.crf));
        args.push("-vf".to_string());
        args.push(filter);
        args.extend(["-c:a", "copy", "-y"].map(String::from));
        args.push(self.output.to_string_lossy().to_string());

        Ok(args)
    }
}

/// ffplay arguments for a live preview starting at `start_ms`
pub fn preview_args(video: &Path, subtitle_files: &[PathBuf], start_ms: u64, title: &str) -> Result<Vec<String>, ExportError> {
    let filter = subtitle_filter_chain(subtitle_files)?;
    let mut args = Vec::new();
    if start_ms > 0 {
        args.push("-ss".to_string());
        args.push(format_seconds(start_ms));
    }
    args.push("-vf".to_string());
    args.push(filter);
    args.push("-window_title".to_string());
    args.push(title.to_string());
    args.push("-autoexit".to_string());
    args.push("-i".to_string());
    args.push(video.to_string_lossy().to_string());
    Ok(args)
}

fn subtitle_filter_chain(files: &[PathBuf]) -> Result<String, ExportError> {
    if files.is_empty() {
        return Err(ExportError::NoSubtitles);
    }
    Ok(files
        .iter()
        .map(|file| format!("ass={}", escape_filter_path(file)))
        .collect::<Vec<_>>()
        .join(","))
}

/// Escape a path for use as a filter option value inside a filtergraph.
///
/// ffmpeg unescapes twice: once when splitting the graph, once when splitting a
/// filter's options. The option level escapes `:` and `'`; the graph level wraps
/// the result in single quotes, closing and reopening around embedded quotes.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut option_level = String::with_capacity(normalized.len() + 8);
    for ch in normalized.chars() {
        if ch == ':' || ch == '\'' {
            option_level.push('\\');
        }
        option_level.push(ch);
    }

    let mut quoted = String::with_capacity(option_level.len() + 4);
    quoted.push('\'');
    for ch in option_level.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// Parse the `time=HH:MM:SS.xx` field of an ffmpeg stderr status line into seconds
pub fn ffmpeg_progress_seconds(line: &str) -> Option<f64> {
    let start = line.find("time=")?;
    let rest = line[start + 5..].trim_start();
    let value = rest.split_whitespace().next()?;

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].trim_start_matches('-').parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;
    if value.starts_with('-') {
        return Some(0.0);
    }

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
