/*!
 * Scripted media backend for testing.
 *
 * - `MockMedia::working()` - every tool succeeds, software encoder only
 * - `MockMedia::failing()` - encodes exit with a codec error
 * - `MockMedia::missing_ffmpeg()` - behaves as if ffmpeg is not installed
 */

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::MediaError;
use crate::media::{MediaBackend, ProgressFn};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockMediaBehavior {
    /// Every call succeeds
    Working,
    /// Encodes and previews exit with a non-zero status
    Failing,
    /// Every spawn fails as if the tool is not on PATH
    MissingTool,
    /// Encodes are cancelled midway
    Cancelled,
}

/// Mock backend recording every call it receives
#[derive(Debug)]
pub struct MockMedia {
    behavior: MockMediaBehavior,
    duration_secs: Option<f64>,
    encoder_listing: String,
    fonts: Vec<String>,
    encode_calls: Arc<Mutex<Vec<Vec<String>>>>,
    play_calls: Arc<Mutex<Vec<Vec<String>>>>,
    /// Subtitle files referenced by each encode, read while they still exist
    encoded_subtitles: Arc<Mutex<Vec<String>>>,
    probe_count: Arc<AtomicUsize>,
}

impl MockMedia {
    pub fn new(behavior: MockMediaBehavior) -> Self {
        Self {
            behavior,
            duration_secs: Some(60.0),
            encoder_listing: " V....D libx264              libx264 H.264 / AVC\n".to_string(),
            fonts: vec!["Arial".to_string(), "DejaVu Sans".to_string()],
            encode_calls: Arc::new(Mutex::new(Vec::new())),
            play_calls: Arc::new(Mutex::new(Vec::new())),
            encoded_subtitles: Arc::new(Mutex::new(Vec::new())),
            probe_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockMediaBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockMediaBehavior::Failing)
    }

    pub fn missing_ffmpeg() -> Self {
        Self::new(MockMediaBehavior::MissingTool)
    }

    pub fn cancelled() -> Self {
        Self::new(MockMediaBehavior::Cancelled)
    }

    /// Replace the `ffmpeg -encoders` listing
    pub fn with_encoders(mut self, listing: &str) -> Self {
        self.encoder_listing = listing.to_string();
        self
    }

    /// Replace the probed video duration
    pub fn with_duration(mut self, duration_secs: Option<f64>) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Replace the installed font families
    pub fn with_fonts(mut self, fonts: &[&str]) -> Self {
        self.fonts = fonts.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Arguments of every encode so far
    pub fn encode_calls(&self) -> Vec<Vec<String>> {
        self.encode_calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Arguments of every preview so far
    pub fn play_calls(&self) -> Vec<Vec<String>> {
        self.play_calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Contents of the subtitle documents handed to the encoder
    pub fn encoded_subtitles(&self) -> Vec<String> {
        self.encoded_subtitles.lock().map(|docs| docs.clone()).unwrap_or_default()
    }

    /// Number of duration probes
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    fn missing(&self, tool: &str) -> MediaError {
        MediaError::MissingDependency(tool.to_string())
    }

    /// Read the `.ass` files named in a filter chain so tests can inspect them
    /// after the temporary directory is gone
    fn capture_subtitles(&self, args: &[String]) {
        let Some(pos) = args.iter().position(|a| a == "-vf") else {
            return;
        };
        let Some(chain) = args.get(pos + 1) else {
            return;
        };

        let mut captured = Vec::new();
        for filter in chain.split("',ass='") {
            let path = filter
                .trim_start_matches("ass=")
                .trim_matches('\'')
                .replace("\\:", ":");
            if let Ok(content) = std::fs::read_to_string(&path) {
                captured.push(content);
            }
        }

        if let Ok(mut docs) = self.encoded_subtitles.lock() {
            docs.extend(captured);
        }
    }
}

#[async_trait]
impl MediaBackend for MockMedia {
    async fn probe_duration(&self, _video: &Path) -> Result<Option<f64>, MediaError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        if self.behavior == MockMediaBehavior::MissingTool {
            return Err(self.missing("ffprobe"));
        }
        Ok(self.duration_secs)
    }

    async fn list_encoders(&self) -> Result<String, MediaError> {
        if self.behavior == MockMediaBehavior::MissingTool {
            return Err(self.missing("ffmpeg"));
        }
        Ok(self.encoder_listing.clone())
    }

    async fn font_families(&self) -> Result<Vec<String>, MediaError> {
        if self.behavior == MockMediaBehavior::MissingTool {
            return Err(self.missing("fc-list"));
        }
        Ok(self.fonts.clone())
    }

    async fn encode(&self, args: &[String], total_secs: Option<f64>, on_progress: ProgressFn<'_>) -> Result<(), MediaError> {
        if self.behavior == MockMediaBehavior::MissingTool {
            return Err(self.missing("ffmpeg"));
        }

        if let Ok(mut calls) = self.encode_calls.lock() {
            calls.push(args.to_vec());
        }
        self.capture_subtitles(args);

        match self.behavior {
            MockMediaBehavior::Failing => Err(MediaError::Failed {
                tool: "ffmpeg".to_string(),
                code: Some(1),
                message: "Error while opening encoder".to_string(),
            }),
            MockMediaBehavior::Cancelled => {
                on_progress(0.5);
                Err(MediaError::Cancelled)
            }
            _ => {
                if total_secs.is_some() {
                    on_progress(0.5);
                }
                on_progress(1.0);
                Ok(())
            }
        }
    }

    async fn play(&self, args: &[String]) -> Result<(), MediaError> {
        match self.behavior {
            MockMediaBehavior::MissingTool => Err(self.missing("ffplay")),
            MockMediaBehavior::Failing => Err(MediaError::Failed {
                tool: "ffplay".to_string(),
                code: Some(1),
                message: "Failed to open video".to_string(),
            }),
            _ => {
                if let Ok(mut calls) = self.play_calls.lock() {
                    calls.push(args.to_vec());
                }
                Ok(())
            }
        }
    }
}
