/*!
 * Position presets.
 *
 * A preset is a named bundle of per-track settings: whether the track is used at
 * all, and optional overrides for its vertical margin, screen position and size.
 * Three presets are built in; users can add more (or replace a built-in) through
 * the configuration file.
 */

use serde::{Deserialize, Serialize};

use crate::style::{Alignment, SubtitleStyle};

/// Settings a preset applies to one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPreset {
    /// Whether the track takes part in preview and export
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_v: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl TrackPreset {
    /// Enabled track placed at `margin_v`
    pub fn at_margin(margin_v: u32) -> Self {
        Self {
            enabled: true,
            margin_v: Some(margin_v),
            alignment: None,
            font_size: None,
        }
    }

    /// Track switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            margin_v: None,
            alignment: None,
            font_size: None,
        }
    }

    /// Copy the overrides into `style`
    pub fn apply_to(&self, style: &mut SubtitleStyle) {
        if let Some(margin) = self.margin_v {
            style.margin_v = margin;
        }
        if let Some(alignment) = self.alignment {
            style.alignment = alignment;
        }
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
    }
}

/// Named preset covering both tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Subtitle 1
    pub first: TrackPreset,

    /// Subtitle 2
    pub second: TrackPreset,
}

impl Preset {
    /// Both tracks, subtitle 1 stacked above subtitle 2
    pub fn none() -> Self {
        Self {
            name: "none".to_string(),
            description: "None (both subtitles)".to_string(),
            first: TrackPreset::at_margin(35),
            second: TrackPreset::at_margin(5),
        }
    }

    /// The video already carries Chinese subtitles; only subtitle 2 is burned
    pub fn chinese() -> Self {
        Self {
            name: "chinese".to_string(),
            description: "Video with Chinese subtitles (only Subtitle 2)".to_string(),
            first: TrackPreset::disabled(),
            second: TrackPreset::at_margin(25),
        }
    }

    /// The video already carries English subtitles; only subtitle 1 is burned
    pub fn english() -> Self {
        Self {
            name: "english".to_string(),
            description: "Video with English subtitles (only Subtitle 1)".to_string(),
            first: TrackPreset::at_margin(35),
            second: TrackPreset::disabled(),
        }
    }

    pub fn builtins() -> Vec<Preset> {
        vec![Self::none(), Self::chinese(), Self::english()]
    }
}

/// Built-in presets merged with user presets
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: Vec<Preset>,
}

impl PresetRegistry {
    /// Registry of built-ins, with `user` presets replacing same-named built-ins
    /// and the rest appended in order
    pub fn with_user_presets(user: &[Preset]) -> Self {
        let mut presets = Preset::builtins();
        for preset in user {
            match presets
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&preset.name))
            {
                Some(existing) => *existing = preset.clone(),
                None => presets.push(preset.clone()),
            }
        }
        Self { presets }
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::with_user_presets(&[])
    }
}
