use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::ass_writer::AssDocument;
use crate::encoder::{preview_args, BurnRequest, ClipRange, HardwareEncoder};
use crate::errors::{ExportError, MediaError, SessionError};
use crate::file_utils::FileManager;
use crate::media::ffmpeg::SystemMedia;
use crate::media::MediaBackend;
use crate::overlay::OverlayLayout;
use crate::session::{Session, TrackSlot};
use crate::style::SubtitleStyle;
use crate::subtitle_processor::SubtitleTrack;
use crate::timecode::format_position;

// @module: Application controller for preview and export workflows

// @const: Stem used for default clip output names
const CLIP_SUFFIX: &str = "preview";

/// One `key=value` style edit addressed to a track
#[derive(Debug, Clone, PartialEq)]
pub struct StyleEdit {
    pub slot: TrackSlot,
    pub key: String,
    pub value: String,
}

impl StyleEdit {
    /// Parse `key=value`
    pub fn parse(slot: TrackSlot, input: &str) -> Result<Self> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| anyhow!("Style edit '{}' must look like key=value", input))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Style edit '{}' has an empty key", input));
        }
        Ok(Self {
            slot,
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// What to open and how to configure it before a preview or export
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub video: PathBuf,
    pub subtitle1: Option<PathBuf>,
    pub subtitle2: Option<PathBuf>,
    /// Preset name, the configured default when `None`
    pub preset: Option<String>,
    pub style_edits: Vec<StyleEdit>,
    /// Initial cursor position
    pub position_ms: u64,
}

/// Result of a finished export
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub output: PathBuf,
    pub encoder: HardwareEncoder,
    pub elapsed: Duration,
}

/// Text and placement of one track at the cursor
#[derive(Debug, Clone)]
pub struct OverlayLine {
    pub slot: TrackSlot,
    pub text: String,
    /// `None` when the track shows nothing at the cursor
    pub layout: Option<OverlayLayout>,
}

/// Main application controller
#[derive(Debug)]
pub struct Controller<B: MediaBackend = SystemMedia> {
    // @field: App configuration
    config: Config,
    // @field: External tool chain
    backend: B,
    // @field: Draw progress bars during encodes
    show_progress: bool,
}

impl Controller<SystemMedia> {
    // @method: Create a controller driving the installed ffmpeg tools
    pub fn with_config(config: Config) -> Result<Self> {
        let backend = SystemMedia::new(config.tools.clone());
        Self::with_backend(config, backend)
    }
}

impl<B: MediaBackend> Controller<B> {
    /// Create a controller on top of any media backend
    pub fn with_backend(config: Config, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            show_progress: true,
        })
    }

    /// Disable progress bars (tests, non-interactive runs)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build a session from `request`: resolve fonts, apply the preset and the style
    /// edits, then open the video and subtitle files
    pub async fn prepare_session(&self, request: &SessionRequest) -> Result<Session, SessionError> {
        let registry = self.config.registry();
        let preset_name = request.preset.as_deref().unwrap_or(&self.config.default_preset);
        let preset = registry
            .get(preset_name)
            .ok_or_else(|| SessionError::UnknownPreset(preset_name.to_string()))?;

        let (first, second) = self
            .resolve_fonts(self.config.subtitle1.clone(), self.config.subtitle2.clone())
            .await;
        let mut session = Session::new(first, second);
        session.apply_preset(preset);

        for edit in &request.style_edits {
            session.edit_style(edit.slot, &edit.key, &edit.value)?;
        }

        session.load_video(&request.video)?;
        match self.backend.probe_duration(&request.video).await {
            Ok(Some(secs)) => {
                debug!("Video duration: {:.3}s", secs);
                session.set_video_duration_ms(Some((secs * 1000.0).round() as u64));
            }
            Ok(None) => warn!("Could not determine the duration of {:?}", request.video),
            Err(e) => warn!("Duration probe failed: {}", e),
        }

        for (slot, path) in [(TrackSlot::First, &request.subtitle1), (TrackSlot::Second, &request.subtitle2)] {
            if let Some(path) = path {
                session.load_subtitles(slot, path)?;
            }
        }

        session.seek(request.position_ms);
        Ok(session)
    }

    /// Fill the empty tracks of `request` that its preset enables with subtitle files
    /// found next to the video. Files are matched to tracks by the language tag in
    /// their name: Chinese tags go to Subtitle 1, English tags to Subtitle 2. Files
    /// whose language is not recognised are returned unassigned.
    pub fn fill_sibling_subtitles(&self, request: &mut SessionRequest) -> Result<Vec<PathBuf>> {
        let registry = self.config.registry();
        let preset_name = request.preset.as_deref().unwrap_or(&self.config.default_preset);
        let preset = registry
            .get(preset_name)
            .ok_or_else(|| anyhow!("Unknown preset '{}'", preset_name))?;
        let enabled = [preset.first.enabled, preset.second.enabled];

        let taken: Vec<PathBuf> = [&request.subtitle1, &request.subtitle2]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        let mut unassigned = Vec::new();
        for path in FileManager::find_sibling_subtitles(&request.video)? {
            if taken.contains(&path) {
                continue;
            }
            let tags = FileManager::subtitle_name_tags(&request.video, &path);
            let Some(slot) = tags.iter().find_map(|tag| track_for_language(tag)) else {
                unassigned.push(path);
                continue;
            };

            let target = match slot {
                TrackSlot::First => &mut request.subtitle1,
                TrackSlot::Second => &mut request.subtitle2,
            };
            if !enabled[slot.index()] {
                debug!("{}: skipping {:?}, disabled by preset '{}'", slot, path, preset.name);
            } else if target.is_some() {
                debug!("{}: already set, skipping {:?}", slot, path);
            } else {
                info!("{}: using {:?}", slot, path);
                *target = Some(path);
            }
        }
        Ok(unassigned)
    }

    /// Replace fonts that are not installed with the configured fallback. When the
    /// font list is unavailable the styles are kept as they are.
    async fn resolve_fonts(&self, mut first: SubtitleStyle, mut second: SubtitleStyle) -> (SubtitleStyle, SubtitleStyle) {
        let families = match self.backend.font_families().await {
            Ok(families) if !families.is_empty() => families,
            Ok(_) => return (first, second),
            Err(e) => {
                debug!("Font lookup unavailable: {}", e);
                return (first, second);
            }
        };

        for (slot, style) in [(TrackSlot::First, &mut first), (TrackSlot::Second, &mut second)] {
            let installed = families
                .iter()
                .any(|family| family.eq_ignore_ascii_case(&style.font_name));
            if !installed {
                warn!(
                    "{}: font '{}' is not installed, using '{}'",
                    slot, style.font_name, self.config.fallback_font
                );
                style.font_name = self.config.fallback_font.clone();
            }
        }
        (first, second)
    }

    /// Encoder to use: the configured one when forced, otherwise the first hardware
    /// encoder ffmpeg offers, falling back to libx264
    pub async fn detect_encoder(&self) -> HardwareEncoder {
        if let Some(forced) = self.config.export.encoder.forced() {
            return forced;
        }
        match self.backend.list_encoders().await {
            Ok(listing) => HardwareEncoder::detect_from_listing(&listing),
            Err(e) => {
                warn!("Encoder detection failed, using software encoding: {}", e);
                HardwareEncoder::Software
            }
        }
    }

    /// Burn every enabled track into the whole video
    pub async fn export(&self, session: &Session, output: Option<&Path>, force: bool) -> Result<ExportOutcome, ExportError> {
        session.ensure_exportable()?;
        let output = self.output_path(session, output, &self.config.export.output_suffix)?;

        let tracks = session
            .ready_tracks()
            .into_iter()
            .filter_map(|(slot, state)| state.subtitles.clone().map(|subs| (slot, state.style.clone(), subs)))
            .collect::<Vec<_>>();

        self.burn(session, tracks, None, output, force).await
    }

    /// Export a short clip starting at the cursor, with subtitles re-timed to the clip
    pub async fn export_clip(&self, session: &Session, output: Option<&Path>, force: bool) -> Result<ExportOutcome, ExportError> {
        session.ensure_exportable()?;
        let suffix = format!("{}.{}", self.config.export.output_suffix, CLIP_SUFFIX);
        let output = self.output_path(session, output, &suffix)?;

        let start_ms = session.position_ms();
        let mut duration_ms = self.config.export.preview_duration_secs * 1000;
        if let Some(total) = session.video_duration_ms() {
            duration_ms = duration_ms.min(total.saturating_sub(start_ms));
        }
        if duration_ms == 0 {
            return Err(ExportError::EmptyClip {
                start: format_position(start_ms),
            });
        }

        let tracks = session
            .ready_tracks()
            .into_iter()
            .filter_map(|(slot, state)| {
                state
                    .subtitles
                    .as_ref()
                    .map(|subs| (slot, state.style.clone(), subs.clip_window(start_ms, duration_ms)))
            })
            .collect::<Vec<_>>();

        let clip = ClipRange { start_ms, duration_ms };
        self.burn(session, tracks, Some(clip), output, force).await
    }

    /// Play the video with both tracks overlaid, from the cursor
    pub async fn preview(&self, session: &Session) -> Result<(), ExportError> {
        let video = session.video().ok_or(SessionError::NoVideo)?;
        let workspace = temp_workspace()?;

        let tracks = session
            .ready_tracks()
            .into_iter()
            .filter_map(|(slot, state)| state.subtitles.as_ref().map(|subs| (slot, &state.style, subs)))
            .collect::<Vec<_>>();
        let files = write_subtitle_files(workspace.path(), tracks)?;

        let title = format!(
            "dualsub - {}",
            video.file_name().unwrap_or_default().to_string_lossy()
        );
        let args = preview_args(video, &files, session.position_ms(), &title)?;
        info!("Preview from {} (space: pause, arrows: seek, q: quit)", format_position(session.position_ms()));
        self.backend.play(&args).await?;
        Ok(())
    }

    /// Text and placement of each enabled track at the cursor for a `width` x `height` frame
    pub fn overlay_report(&self, session: &Session, width: u32, height: u32) -> Vec<OverlayLine> {
        session
            .overlay_text()
            .into_iter()
            .map(|(slot, text)| {
                let layout = if text.is_empty() {
                    None
                } else {
                    Some(OverlayLayout::place_in_video(width, height, &text, &session.track(slot).style))
                };
                OverlayLine { slot, text, layout }
            })
            .collect()
    }

    fn output_path(&self, session: &Session, output: Option<&Path>, suffix: &str) -> Result<PathBuf, ExportError> {
        match output {
            Some(path) => Ok(path.to_path_buf()),
            None => {
                let video = session.video().ok_or(SessionError::NoVideo)?;
                Ok(FileManager::generate_output_path(video, suffix, &self.config.export.container))
            }
        }
    }

    async fn burn(
        &self,
        session: &Session,
        tracks: Vec<(TrackSlot, SubtitleStyle, SubtitleTrack)>,
        clip: Option<ClipRange>,
        output: PathBuf,
        force: bool,
    ) -> Result<ExportOutcome, ExportError> {
        let video = session.video().ok_or(SessionError::NoVideo)?;
        if output.exists() && !force {
            return Err(ExportError::OutputExists(output));
        }
        if let Some(parent) = output.parent() {
            FileManager::ensure_dir(parent).map_err(|e| ExportError::TempFile(e.to_string()))?;
        }

        let workspace = temp_workspace()?;
        let files = write_subtitle_files(
            workspace.path(),
            tracks.iter().map(|(slot, style, subs)| (*slot, style, subs)).collect(),
        )?;

        let encoder = self.detect_encoder().await;
        info!("Encoder: {}", encoder);

        let request = BurnRequest {
            video: video.to_path_buf(),
            subtitle_files: files,
            output: output.clone(),
            clip,
            encoder,
            crf: self.config.export.crf,
        };
        let args = request.to_args()?;

        let total_secs = match clip {
            Some(range) => Some(range.duration_ms as f64 / 1000.0),
            None => self.known_duration(session, video).await,
        };

        let progress_bar = self.progress_bar();
        progress_bar.set_message(output.file_name().unwrap_or_default().to_string_lossy().to_string());
        let on_progress = |fraction: f64| progress_bar.set_position((fraction * 1000.0).round() as u64);

        let start_time = Instant::now();
        let result = self.backend.encode(&args, total_secs, &on_progress).await;
        drop(workspace);

        match result {
            Ok(()) => {
                progress_bar.finish_and_clear();
                let elapsed = start_time.elapsed();
                info!("Export completed in {:.1}s: {:?}", elapsed.as_secs_f64(), output);
                Ok(ExportOutcome { output, encoder, elapsed })
            }
            Err(e) => {
                progress_bar.abandon();
                if matches!(e, MediaError::Cancelled) && output.exists() {
                    if let Err(remove_error) = std::fs::remove_file(&output) {
                        warn!("Could not remove partial output {:?}: {}", output, remove_error);
                    }
                }
                error!("Export failed: {}", e);
                Err(e.into())
            }
        }
    }

    async fn known_duration(&self, session: &Session, video: &Path) -> Option<f64> {
        if let Some(ms) = session.video_duration_ms() {
            return Some(ms as f64 / 1000.0);
        }
        match self.backend.probe_duration(video).await {
            Ok(Some(duration)) => Some(duration),
            Ok(None) | Err(_) => {
                // Fall back to the end of the longest track
                let last_end = session
                    .ready_tracks()
                    .iter()
                    .filter_map(|(_, state)| state.subtitles.as_ref().map(|subs| subs.last_end_ms()))
                    .max()
                    .filter(|ms| *ms > 0);
                match last_end {
                    Some(ms) => {
                        debug!("Duration unknown, estimating progress from subtitles ({} ms)", ms);
                        Some(ms as f64 / 1000.0)
                    }
                    None => {
                        warn!("Video duration unknown, progress will not be shown");
                        None
                    }
                }
            }
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(1000);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }
}

/// Track a language tag from a subtitle file name belongs to
fn track_for_language(tag: &str) -> Option<TrackSlot> {
    let primary = tag.split(['-', '_']).next().unwrap_or(tag);
    match primary {
        "zh" | "zho" | "chi" | "chs" | "cht" | "chinese" | "cn" => Some(TrackSlot::First),
        "en" | "eng" | "english" => Some(TrackSlot::Second),
        _ => None,
    }
}

fn temp_workspace() -> Result<tempfile::TempDir, ExportError> {
    tempfile::Builder::new()
        .prefix("dualsub-")
        .tempdir()
        .map_err(|e| ExportError::TempFile(e.to_string()))
}

/// Write one ASS document per track into `dir`, in track order
fn write_subtitle_files(dir: &Path, tracks: Vec<(TrackSlot, &SubtitleStyle, &SubtitleTrack)>) -> Result<Vec<PathBuf>, ExportError> {
    if tracks.is_empty() {
        return Err(ExportError::NoSubtitles);
    }

    let mut files = Vec::with_capacity(tracks.len());
    for (slot, style, subs) in tracks {
        let path = dir.join(format!("{}.ass", slot.style_name().to_lowercase()));
        AssDocument::from_track(subs, style, slot.style_name())
            .write_to(&path)
            .map_err(|e| ExportError::TempFile(e.to_string()))?;
        debug!("{}: {} events written to {:?}", slot, subs.entries.len(), path);
        files.push(path);
    }
    Ok(files)
}
