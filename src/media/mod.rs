/*!
 * Boundary to the external media tools.
 *
 * Everything that decodes, renders or encodes video lives outside this crate. The
 * `MediaBackend` trait is the one seam through which the controller reaches those
 * tools, so workflows can be exercised against a scripted backend in tests:
 * - `ffmpeg::SystemMedia`: spawns ffmpeg / ffprobe / ffplay / fc-list
 * - `mock::MockMedia`: records calls and returns scripted results
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::errors::MediaError;

/// Progress callback: fraction of the encode completed, in `[0, 1]`
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Common trait for the external media tool chain
#[async_trait]
pub trait MediaBackend: Send + Sync + Debug {
    /// Duration of `video` in seconds, `None` when it cannot be determined
    async fn probe_duration(&self, video: &Path) -> Result<Option<f64>, MediaError>;

    /// Raw `ffmpeg -encoders` listing
    async fn list_encoders(&self) -> Result<String, MediaError>;

    /// Installed font family names
    async fn font_families(&self) -> Result<Vec<String>, MediaError>;

    /// Run one encode with the given ffmpeg arguments.
    ///
    /// # Arguments
    /// * `args` - Arguments after the program name
    /// * `total_secs` - Expected output length, enables progress reporting
    /// * `on_progress` - Called with the completed fraction
    async fn encode(&self, args: &[String], total_secs: Option<f64>, on_progress: ProgressFn<'_>) -> Result<(), MediaError>;

    /// Open a preview window and wait until it closes
    async fn play(&self, args: &[String]) -> Result<(), MediaError>;
}

pub mod ffmpeg;
pub mod mock;
