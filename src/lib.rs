/*!
 * # dualsub - bilingual subtitle preview and burn-in
 *
 * A Rust library for previewing two independent subtitle tracks over a video and
 * burning both into a new video with ffmpeg.
 *
 * ## Features
 *
 * - Load SRT and WebVTT subtitle tracks
 * - Per-track styles: font, size, colors, outline, shadow, margins, screen position
 * - Position presets for videos that already carry one of the languages
 * - Real-time preview through ffplay, starting at any position
 * - Full exports and short preview clips with re-timed subtitles
 * - Hardware encoder detection (NVENC, AMF, Quick Sync) with libx264 fallback
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `style`: Subtitle style values and their ASS rendering
 * - `subtitle_processor`: Subtitle file parsing and timing queries
 * - `ass_writer`: Generation of the ASS documents handed to ffmpeg
 * - `presets`: Named position presets
 * - `session`: In-memory editing state
 * - `overlay`: Preview text placement
 * - `encoder`: ffmpeg / ffplay command composition
 * - `media`: Boundary to the external tools
 * - `app_controller`: Preview and export workflows
 * - `file_utils`: File system operations
 * - `timecode`: Playback position parsing
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod ass_writer;
pub mod encoder;
pub mod errors;
pub mod file_utils;
pub mod media;
pub mod overlay;
pub mod presets;
pub mod session;
pub mod style;
pub mod subtitle_processor;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, SessionRequest, StyleEdit};
pub use encoder::{BurnRequest, EncoderPreference, HardwareEncoder};
pub use errors::{ExportError, MediaError, SessionError, StyleError, SubtitleError};
pub use presets::{Preset, PresetRegistry};
pub use session::{Session, TrackSlot};
pub use style::{Alignment, Color, SubtitleStyle};
pub use subtitle_processor::{SubtitleEntry, SubtitleTrack};
