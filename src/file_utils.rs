use anyhow::{Result, Context};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::subtitle_processor::{SubtitleFormat, SubtitleTrack};

// @module: File and directory utilities

// @const: Common video container extensions accepted by ffmpeg
const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
    "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @const: Bytes read when sniffing a file without a known extension
const SNIFF_BYTES: u64 = 4096;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @generates: Output path for a burned video
    // @params: video, suffix, extension
    pub fn generate_output_path<P: AsRef<Path>>(video: P, suffix: &str, extension: &str) -> PathBuf {
        let video = video.as_ref();
        let stem = video.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        if !suffix.is_empty() {
            output_filename.push('.');
            output_filename.push_str(suffix);
        }
        output_filename.push('.');
        output_filename.push_str(extension.trim_start_matches('.'));

        video.parent().unwrap_or(Path::new("")).join(output_filename)
    }

    /// Subtitle files in the video's directory whose name starts with the video stem,
    /// e.g. `movie.zh.srt` and `movie.en.vtt` next to `movie.mkv`
    pub fn find_sibling_subtitles<P: AsRef<Path>>(video: P) -> Result<Vec<PathBuf>> {
        let video = video.as_ref();
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir = match video.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut result = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let is_subtitle = path
                .extension()
                .and_then(|ext| SubtitleFormat::from_extension(&ext.to_string_lossy()))
                .is_some();
            let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

            if is_subtitle && name.starts_with(&format!("{}.", stem)) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Lowercased name segments between the video stem and the extension,
    /// e.g. `["zh-hans", "forced"]` for `movie.zh-Hans.forced.srt` next to `movie.mkv`
    pub fn subtitle_name_tags<P: AsRef<Path>, Q: AsRef<Path>>(video: P, subtitle: Q) -> Vec<String> {
        let stem = video
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = subtitle
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match name.strip_prefix(&stem).and_then(|rest| rest.strip_prefix('.')) {
            Some(rest) => rest.split('.').filter(|t| !t.is_empty()).map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    /// Read a subtitle file as text: lossy UTF-8, BOM stripped, CRLF normalised
    pub fn read_subtitle_text<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').replace("\r\n", "\n"))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Detect whether a file is a subtitle (SRT/WebVTT) or a video
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();

            if let Some(format) = SubtitleFormat::from_extension(&ext_str) {
                return Ok(FileType::Subtitle(format));
            }

            if VIDEO_EXTENSIONS.contains(&ext_str.as_str()) {
                return Ok(FileType::Video);
            }
        }

        // Fall back to examining the first few KB
        let mut head = Vec::with_capacity(SNIFF_BYTES as usize);
        let read = fs::File::open(path).and_then(|file| file.take(SNIFF_BYTES).read_to_end(&mut head));
        if read.is_ok() {
            let text = String::from_utf8_lossy(&head);
            if let Some(format) = SubtitleTrack::sniff_format(&text) {
                return Ok(FileType::Subtitle(format));
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Text subtitle file
    Subtitle(SubtitleFormat),
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}
