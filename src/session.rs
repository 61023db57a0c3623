/*!
 * In-memory editing session.
 *
 * A session holds what the user has opened and configured so far: the video, the
 * two subtitle tracks with their styles, the active preset and the playback cursor.
 * Nothing here touches external tools; the controller drives those.
 */

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::SessionError;
use crate::file_utils::{FileManager, FileType};
use crate::presets::Preset;
use crate::style::SubtitleStyle;
use crate::subtitle_processor::SubtitleTrack;

/// Which of the two tracks an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSlot {
    First,
    Second,
}

impl TrackSlot {
    pub const ALL: [TrackSlot; 2] = [TrackSlot::First, TrackSlot::Second];

    pub fn index(&self) -> usize {
        match self {
            TrackSlot::First => 0,
            TrackSlot::Second => 1,
        }
    }

    /// Style name used inside generated ASS files
    pub fn style_name(&self) -> &'static str {
        match self {
            TrackSlot::First => "Sub1",
            TrackSlot::Second => "Sub2",
        }
    }
}

impl fmt::Display for TrackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSlot::First => write!(f, "Subtitle 1"),
            TrackSlot::Second => write!(f, "Subtitle 2"),
        }
    }
}

/// Style, content and availability of one track
#[derive(Debug, Clone)]
pub struct TrackState {
    pub style: SubtitleStyle,
    pub subtitles: Option<SubtitleTrack>,
    pub enabled: bool,
}

impl TrackState {
    fn new(style: SubtitleStyle) -> Self {
        Self {
            style,
            subtitles: None,
            enabled: true,
        }
    }

    /// Enabled and loaded
    pub fn is_ready(&self) -> bool {
        self.enabled && self.subtitles.is_some()
    }
}

/// Editing session state
#[derive(Debug, Clone)]
pub struct Session {
    video: Option<PathBuf>,
    video_duration_ms: Option<u64>,
    tracks: [TrackState; 2],
    preset: String,
    position_ms: u64,
}

impl Session {
    /// Empty session with the given track styles; both tracks enabled
    pub fn new(first: SubtitleStyle, second: SubtitleStyle) -> Self {
        Self {
            video: None,
            video_duration_ms: None,
            tracks: [TrackState::new(first), TrackState::new(second)],
            preset: Preset::none().name,
            position_ms: 0,
        }
    }

    pub fn video(&self) -> Option<&Path> {
        self.video.as_deref()
    }

    pub fn video_duration_ms(&self) -> Option<u64> {
        self.video_duration_ms
    }

    pub fn set_video_duration_ms(&mut self, duration: Option<u64>) {
        self.video_duration_ms = duration;
        if let Some(max) = duration {
            self.position_ms = self.position_ms.min(max);
        }
    }

    pub fn track(&self, slot: TrackSlot) -> &TrackState {
        &self.tracks[slot.index()]
    }

    pub fn preset_name(&self) -> &str {
        &self.preset
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    /// Open a video file
    pub fn load_video<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SessionError> {
        let path = path.as_ref();
        if !FileManager::file_exists(path) {
            return Err(SessionError::MissingFile(path.to_path_buf()));
        }
        match FileManager::detect_file_type(path) {
            Ok(FileType::Video) => {}
            _ => return Err(SessionError::NotAVideo(path.to_path_buf())),
        }

        info!("Loaded video {:?}", path);
        self.video = Some(path.to_path_buf());
        self.video_duration_ms = None;
        self.position_ms = 0;
        Ok(())
    }

    /// Load a subtitle file into `slot`
    pub fn load_subtitles<P: AsRef<Path>>(&mut self, slot: TrackSlot, path: P) -> Result<(), SessionError> {
        self.ensure_enabled(slot)?;

        let track = SubtitleTrack::load(path.as_ref())
            .map_err(|source| SessionError::Subtitle { slot, source })?;
        info!("{}: {} entries from {:?}", slot, track.entries.len(), path.as_ref());
        self.tracks[slot.index()].subtitles = Some(track);
        Ok(())
    }

    /// Replace the style of `slot`
    pub fn set_style(&mut self, slot: TrackSlot, style: SubtitleStyle) -> Result<(), SessionError> {
        style
            .validate()
            .map_err(|source| SessionError::Style { slot, source })?;
        self.tracks[slot.index()].style = style;
        Ok(())
    }

    /// Apply one `key=value` style edit to `slot`; the style is left unchanged on error
    pub fn edit_style(&mut self, slot: TrackSlot, key: &str, value: &str) -> Result<(), SessionError> {
        self.ensure_enabled(slot)?;

        let mut style = self.tracks[slot.index()].style.clone();
        style
            .apply_setting(key, value)
            .map_err(|source| SessionError::Style { slot, source })?;
        debug!("{}: {} = {}", slot, key, value);
        self.tracks[slot.index()].style = style;
        Ok(())
    }

    /// Switch to `preset`: enable or disable each track, copy margin/position overrides
    /// into the styles and drop subtitles of tracks the preset turns off
    pub fn apply_preset(&mut self, preset: &Preset) {
        for (slot, track_preset) in [(TrackSlot::First, &preset.first), (TrackSlot::Second, &preset.second)] {
            let track = &mut self.tracks[slot.index()];
            track.enabled = track_preset.enabled;
            if track_preset.enabled {
                track_preset.apply_to(&mut track.style);
            } else if track.subtitles.take().is_some() {
                debug!("{} cleared by preset '{}'", slot, preset.name);
            }
        }
        self.preset = preset.name.clone();
        info!("Preset: {}", preset.description);
    }

    /// Verify that a video is open and every enabled track is loaded
    pub fn ensure_exportable(&self) -> Result<(), SessionError> {
        if self.video.is_none() {
            return Err(SessionError::NoVideo);
        }
        if self.tracks.iter().all(|t| !t.enabled) {
            return Err(SessionError::NothingToExport);
        }
        for slot in TrackSlot::ALL {
            let track = self.track(slot);
            if track.enabled && track.subtitles.is_none() {
                return Err(SessionError::MissingTrack {
                    slot,
                    preset: self.preset.clone(),
                });
            }
        }
        Ok(())
    }

    /// Enabled, loaded tracks in display order
    pub fn ready_tracks(&self) -> Vec<(TrackSlot, &TrackState)> {
        TrackSlot::ALL
            .into_iter()
            .map(|slot| (slot, self.track(slot)))
            .filter(|(_, track)| track.is_ready())
            .collect()
    }

    /// Move the cursor, clamped to the video length when it is known
    pub fn seek(&mut self, position_ms: u64) -> u64 {
        self.position_ms = match self.video_duration_ms {
            Some(max) => position_ms.min(max),
            None => position_ms,
        };
        self.position_ms
    }

    /// Text each enabled track shows at the cursor
    pub fn overlay_text(&self) -> Vec<(TrackSlot, String)> {
        self.ready_tracks()
            .into_iter()
            .filter_map(|(slot, track)| {
                track
                    .subtitles
                    .as_ref()
                    .map(|subs| (slot, subs.active_text(self.position_ms)))
            })
            .collect()
    }

    fn ensure_enabled(&self, slot: TrackSlot) -> Result<(), SessionError> {
        if self.track(slot).enabled {
            Ok(())
        } else {
            Err(SessionError::TrackDisabled {
                slot,
                preset: self.preset.clone(),
            })
        }
    }
}
