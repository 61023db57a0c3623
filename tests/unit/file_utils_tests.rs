/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use dualsub::file_utils::{FileManager, FileType};
use dualsub::subtitle_processor::SubtitleFormat;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(FileManager::dir_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/video.mkv"), "dualsub", "mp4");
    assert_eq!(output_path, Path::new("/tmp/input/video.dualsub.mp4"));

    let no_suffix = FileManager::generate_output_path(Path::new("video.mkv"), "", ".mkv");
    assert_eq!(no_suffix, Path::new("video.mkv"));
}

/// Test file type detection by extension and content
#[test]
fn test_detect_file_type_withVariousFiles_shouldClassify() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "clip.MKV")?;
    let srt = common::create_english_subtitle(temp_dir.path(), "clip.en.srt")?;
    let vtt_no_ext = common::create_test_file(temp_dir.path(), "captions", "WEBVTT\n\n00:01.000 --> 00:02.000\nHi\n")?;
    let text = common::create_test_file(temp_dir.path(), "readme.txt", "hello")?;

    assert_eq!(FileManager::detect_file_type(&video)?, FileType::Video);
    assert_eq!(FileManager::detect_file_type(&srt)?, FileType::Subtitle(SubtitleFormat::Srt));
    assert_eq!(FileManager::detect_file_type(&vtt_no_ext)?, FileType::Subtitle(SubtitleFormat::WebVtt));
    assert_eq!(FileManager::detect_file_type(&text)?, FileType::Unknown);
    assert!(FileManager::detect_file_type(temp_dir.path().join("missing.mp4")).is_err());

    Ok(())
}

/// Test sniffing of large files without a known extension
#[test]
fn test_detect_file_type_withLargeUnknownFile_shouldOnlyInspectHead() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut srt = String::from("1\n00:00:01,000 --> 00:00:02,000\nHello\n\n");
    srt.push_str(&"x".repeat(64 * 1024));
    let subtitle = common::create_test_file(temp_dir.path(), "subs.data", &srt)?;

    let mut blob = "\0".repeat(64 * 1024);
    blob.push_str("\n1\n00:00:01,000 --> 00:00:02,000\nHidden\n");
    let binary = common::create_test_file(temp_dir.path(), "capture.raw", &blob)?;

    assert_eq!(FileManager::detect_file_type(&subtitle)?, FileType::Subtitle(SubtitleFormat::Srt));
    assert_eq!(FileManager::detect_file_type(&binary)?, FileType::Unknown);
    Ok(())
}

/// Test discovery of subtitle files named after the video
#[test]
fn test_find_sibling_subtitles_withMatchingFiles_shouldReturnSorted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "movie.mp4")?;
    common::create_english_subtitle(temp_dir.path(), "movie.en.srt")?;
    common::create_chinese_subtitle(temp_dir.path(), "movie.zh.srt")?;
    common::create_english_vtt(temp_dir.path(), "other.en.vtt")?;
    common::create_test_file(temp_dir.path(), "movie.nfo", "info")?;

    let found = FileManager::find_sibling_subtitles(&video)?;
    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["movie.en.srt", "movie.zh.srt"]);
    Ok(())
}

/// Test extraction of the name tags between the video stem and the extension
#[test]
fn test_subtitle_name_tags_withTaggedNames_shouldSplitSegments() {
    let video = Path::new("/v/Movie.mkv");
    assert_eq!(FileManager::subtitle_name_tags(video, "/v/movie.zh-Hans.forced.srt"), vec!["zh-hans", "forced"]);
    assert_eq!(FileManager::subtitle_name_tags(video, "/v/Movie.en.vtt"), vec!["en"]);
    assert!(FileManager::subtitle_name_tags(video, "/v/Movie.srt").is_empty());
    assert!(FileManager::subtitle_name_tags(video, "/v/other.en.srt").is_empty());
}

/// Test reading subtitle text with a BOM and CRLF endings
#[test]
fn test_read_subtitle_text_withBomAndCrlf_shouldNormalize() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "bom.srt", "\u{feff}a\r\nb\r\n")?;

    assert_eq!(FileManager::read_subtitle_text(&path)?, "a\nb\n");
    Ok(())
}

/// Test writing a file into a directory that does not exist yet
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("deeper").join("out.txt");

    FileManager::write_to_file(&path, "content")?;
    assert_eq!(std::fs::read_to_string(&path)?, "content");
    Ok(())
}
