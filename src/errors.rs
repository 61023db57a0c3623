/*!
 * Error types for the dualsub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

use crate::session::TrackSlot;

/// Errors that can occur while loading or parsing subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file could not be read
    #[error("Failed to read subtitle file {path:?}: {message}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying IO message
        message: String,
    },

    /// The file is not SRT or WebVTT
    #[error("Unsupported subtitle format: {0:?}")]
    UnsupportedFormat(PathBuf),

    /// A structural problem in the subtitle text
    #[error("Malformed subtitle content: {0}")]
    Malformed(String),

    /// Nothing usable was found
    #[error("No valid subtitle entries were found")]
    Empty,
}

/// Errors produced when a style field receives an invalid value
#[derive(Error, Debug, PartialEq)]
pub enum StyleError {
    /// Unknown setting key
    #[error("Unknown style setting '{0}'")]
    UnknownSetting(String),

    /// Value failed to parse
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Value parsed but lies outside the allowed range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
        /// Offending value
        value: f64,
    },

    /// Font family left empty
    #[error("Font name cannot be empty")]
    EmptyFont,
}

/// Errors raised by the in-memory editing session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Export or preview requested without a video
    #[error("You must load a video before exporting")]
    NoVideo,

    /// File was not recognised as a video
    #[error("Not a video file: {0:?}")]
    NotAVideo(PathBuf),

    /// Input file does not exist
    #[error("File does not exist: {0:?}")]
    MissingFile(PathBuf),

    /// The active preset disabled this track
    #[error("{slot} is disabled by preset '{preset}'")]
    TrackDisabled {
        /// Track that was addressed
        slot: TrackSlot,
        /// Active preset name
        preset: String,
    },

    /// An enabled track has no subtitles loaded
    #[error("Preset '{preset}' requires {slot} to be loaded before exporting")]
    MissingTrack {
        /// Track that is missing
        slot: TrackSlot,
        /// Active preset name
        preset: String,
    },

    /// Every track is disabled
    #[error("No subtitles to export")]
    NothingToExport,

    /// Unknown preset name
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),

    /// Style edit failed
    #[error("{slot}: {source}")]
    Style {
        /// Track whose style was edited
        slot: TrackSlot,
        /// Validation failure
        #[source]
        source: StyleError,
    },

    /// Subtitle loading failed
    #[error("Error loading {slot}: {source}")]
    Subtitle {
        /// Track being loaded
        slot: TrackSlot,
        /// Parse failure
        #[source]
        source: SubtitleError,
    },
}

/// Errors from the external media tools (ffmpeg, ffprobe, ffplay, fc-list)
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool is not installed or not on PATH
    #[error("'{0}' was not found. Install it and make sure it is on your PATH")]
    MissingDependency(String),

    /// The tool could not be started for another reason
    #[error("Failed to run {tool}: {message}")]
    Spawn {
        /// Tool name
        tool: String,
        /// OS error text
        message: String,
    },

    /// The tool exited unsuccessfully
    #[error("{tool} exited with status {code:?}: {message}")]
    Failed {
        /// Tool name
        tool: String,
        /// Exit code if any
        code: Option<i32>,
        /// Filtered stderr
        message: String,
    },

    /// The tool did not answer in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Timeout used
        secs: u64,
    },

    /// The user interrupted the run
    #[error("Export cancelled")]
    Cancelled,

    /// Output of the tool could not be understood
    #[error("Unexpected output from {tool}: {message}")]
    Output {
        /// Tool name
        tool: String,
        /// Details
        message: String,
    },
}

/// Errors raised while preparing or running an export
#[derive(Error, Debug)]
pub enum ExportError {
    /// No subtitle file ended up in the filter chain
    #[error("No subtitles to export.")]
    NoSubtitles,

    /// Refusing to clobber an existing file
    #[error("Output file already exists: {0:?}. Use -f to force overwrite")]
    OutputExists(PathBuf),

    /// The clip would start at or after the end of the video
    #[error("Nothing to export after {start}: the cursor is at the end of the video")]
    EmptyClip {
        /// Clip start, `HH:MM:SS.mmm`
        start: String,
    },

    /// Writing the temporary ASS file failed
    #[error("Failed to write temporary subtitle file: {0}")]
    TempFile(String),

    /// Session was not ready
    #[error(transparent)]
    Session(#[from] SessionError),

    /// External tool failure
    #[error(transparent)]
    Media(#[from] MediaError),
}
