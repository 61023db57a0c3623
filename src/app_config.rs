use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::encoder::EncoderPreference;
use crate::presets::{Preset, PresetRegistry};
use crate::style::SubtitleStyle;

/// Application configuration module
/// This module handles loading, validating and saving the configuration:
/// default track styles, user presets, export settings and tool locations.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Style of subtitle 1 before any preset is applied
    #[serde(default = "SubtitleStyle::first_track_default")]
    pub subtitle1: SubtitleStyle,

    /// Style of subtitle 2 before any preset is applied
    #[serde(default = "SubtitleStyle::second_track_default")]
    pub subtitle2: SubtitleStyle,

    /// Font used when a style's font is not installed
    #[serde(default = "default_fallback_font")]
    pub fallback_font: String,

    /// User presets; a preset named like a built-in replaces it
    #[serde(default)]
    pub presets: Vec<Preset>,

    /// Preset applied when none is given on the command line
    #[serde(default = "default_preset_name")]
    pub default_preset: String,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Export configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    // @field: Encoder choice, auto probes ffmpeg
    #[serde(default)]
    pub encoder: EncoderPreference,

    // @field: libx264 quality (0-51)
    #[serde(default = "default_crf")]
    pub crf: u8,

    // @field: Length of a preview clip
    #[serde(default = "default_preview_duration_secs")]
    pub preview_duration_secs: u64,

    // @field: Inserted between video stem and extension of default output names
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    // @field: Output container extension
    #[serde(default = "default_container")]
    pub container: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderPreference::default(),
            crf: default_crf(),
            preview_duration_secs: default_preview_duration_secs(),
            output_suffix: default_output_suffix(),
            container: default_container(),
        }
    }
}

/// External tool configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolsConfig {
    // @field: ffmpeg binary
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    // @field: ffprobe binary
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    // @field: ffplay binary
    #[serde(default = "default_ffplay")]
    pub ffplay: String,

    // @field: fontconfig listing binary
    #[serde(default = "default_fc_list")]
    pub fc_list: String,

    // @field: Timeout for short probes (encoders, fonts, duration)
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            ffplay: default_ffplay(),
            fc_list: default_fc_list(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_fallback_font() -> String {
    "Arial".to_string()
}

fn default_preset_name() -> String {
    Preset::none().name
}

fn default_crf() -> u8 {
    23
}

fn default_preview_duration_secs() -> u64 {
    10
}

fn default_output_suffix() -> String {
    "dualsub".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_ffplay() -> String {
    "ffplay".to_string()
}

fn default_fc_list() -> String {
    "fc-list".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    5
}

// @const: Longest preview clip accepted
const MAX_PREVIEW_SECS: u64 = 600;

impl Config {
    /// Load `path`, or write a default configuration there when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.subtitle1
            .validate()
            .map_err(|e| anyhow!("subtitle1: {}", e))?;
        self.subtitle2
            .validate()
            .map_err(|e| anyhow!("subtitle2: {}", e))?;

        if self.fallback_font.trim().is_empty() {
            return Err(anyhow!("fallback_font must not be empty"));
        }
        if self.fallback_font.contains(',') {
            return Err(anyhow!("fallback_font must not contain a comma: '{}'", self.fallback_font));
        }

        if self.export.crf > 51 {
            return Err(anyhow!("export.crf must be between 0 and 51, got {}", self.export.crf));
        }
        if self.export.preview_duration_secs == 0 || self.export.preview_duration_secs > MAX_PREVIEW_SECS {
            return Err(anyhow!(
                "export.preview_duration_secs must be between 1 and {}, got {}",
                MAX_PREVIEW_SECS,
                self.export.preview_duration_secs
            ));
        }
        let container = self.export.container.trim_start_matches('.');
        if container.is_empty() || !container.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("export.container is not a valid extension: '{}'", self.export.container));
        }

        if self.tools.probe_timeout_secs == 0 {
            return Err(anyhow!("tools.probe_timeout_secs must be at least 1"));
        }

        let mut seen = HashSet::new();
        for preset in &self.presets {
            let key = preset.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(anyhow!("Preset names must not be empty"));
            }
            if !seen.insert(key) {
                return Err(anyhow!("Duplicate preset name: '{}'", preset.name));
            }
            for (track, margin) in [("first", preset.first.margin_v), ("second", preset.second.margin_v)] {
                if margin.is_some_and(|m| m > 1000) {
                    return Err(anyhow!("Preset '{}': {} margin must be at most 1000", preset.name, track));
                }
            }
            for (track, size) in [("first", preset.first.font_size), ("second", preset.second.font_size)] {
                if size.is_some_and(|s| s == 0 || s > 500) {
                    return Err(anyhow!("Preset '{}': {} font size must be between 1 and 500", preset.name, track));
                }
            }
        }

        if self.registry().get(&self.default_preset).is_none() {
            return Err(anyhow!(
                "default_preset '{}' is not a known preset ({})",
                self.default_preset,
                self.registry().names().join(", ")
            ));
        }

        Ok(())
    }

    /// Built-in presets merged with the configured ones
    pub fn registry(&self) -> PresetRegistry {
        PresetRegistry::with_user_presets(&self.presets)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            subtitle1: SubtitleStyle::first_track_default(),
            subtitle2: SubtitleStyle::second_track_default(),
            fallback_font: default_fallback_font(),
            presets: Vec::new(),
            default_preset: default_preset_name(),
            export: ExportConfig::default(),
            tools: ToolsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
