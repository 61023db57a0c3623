/*!
 * Tests for ffmpeg and ffplay argument composition
 */

use std::path::{Path, PathBuf};
use dualsub::encoder::{preview_args, BurnRequest, ClipRange, EncoderPreference, HardwareEncoder};
use dualsub::errors::ExportError;

fn request(encoder: HardwareEncoder, clip: Option<ClipRange>) -> BurnRequest {
    BurnRequest {
        video: PathBuf::from("/videos/movie.mkv"),
        subtitle_files: vec![PathBuf::from("/tmp/w/sub1.ass"), PathBuf::from("/tmp/w/sub2.ass")],
        output: PathBuf::from("/videos/movie.dualsub.mp4"),
        clip,
        encoder,
        crf: 23,
    }
}

/// Test the full software command line
#[test]
fn test_to_args_withSoftwareEncoder_shouldComposeFullCommand() {
    let args = request(HardwareEncoder::Software, None).to_args().unwrap();

    assert_eq!(
        args,
        vec![
            "-i", "/videos/movie.mkv",
            "-c:v", "libx264", "-preset", "veryfast", "-crf", "23",
            "-vf", "ass='/tmp/w/sub1.ass',ass='/tmp/w/sub2.ass'",
            "-c:a", "copy", "-y", "/videos/movie.dualsub.mp4",
        ]
    );
}

/// Test that hardware encoders put -hwaccel before the input and a clip adds -ss/-t
#[test]
fn test_to_args_withNvencAndClip_shouldPlaceSeekBeforeInput() {
    let clip = ClipRange { start_ms: 62_500, duration_ms: 10_000 };
    let args = request(HardwareEncoder::Nvenc, Some(clip)).to_args().unwrap();

    assert_eq!(&args[..8], &["-hwaccel", "cuda", "-ss", "62.5", "-t", "10", "-i", "/videos/movie.mkv"]);
    assert_eq!(&args[8..14], &["-c:v", "h264_nvenc", "-preset", "fast", "-cq", "23"]);
}

/// Test the codec arguments of AMF and Quick Sync
#[test]
fn test_codec_args_withAmfAndQsv_shouldUseVendorPresets() {
    assert_eq!(HardwareEncoder::Amf.hwaccel(), Some("auto"));
    assert_eq!(HardwareEncoder::Amf.codec_args(23), vec!["-c:v", "h264_amf", "-usage", "lowlatency"]);
    assert_eq!(HardwareEncoder::Qsv.hwaccel(), Some("qsv"));
    assert_eq!(HardwareEncoder::Qsv.codec_args(23), vec!["-c:v", "h264_qsv", "-preset", "veryfast"]);
    assert_eq!(HardwareEncoder::Software.hwaccel(), None);
    assert_eq!(HardwareEncoder::Software.codec_args(18)[5], "18");
}

/// Test that a request without subtitle files is refused
#[test]
fn test_to_args_withoutSubtitles_shouldFail() {
    let mut req = request(HardwareEncoder::Software, None);
    req.subtitle_files.clear();

    let err = req.to_args().unwrap_err();
    assert!(matches!(err, ExportError::NoSubtitles));
    assert_eq!(err.to_string(), "No subtitles to export.");
}

/// Test the ffplay preview command line
#[test]
fn test_preview_args_withStartPosition_shouldSeekAndTitleWindow() {
    let files = vec![PathBuf::from("/tmp/w/sub2.ass")];
    let args = preview_args(Path::new("/videos/movie.mkv"), &files, 90_000, "dualsub - movie.mkv").unwrap();

    assert_eq!(
        args,
        vec![
            "-ss", "90",
            "-vf", "ass='/tmp/w/sub2.ass'",
            "-window_title", "dualsub - movie.mkv",
            "-autoexit",
            "-i", "/videos/movie.mkv",
        ]
    );

    let from_start = preview_args(Path::new("/videos/movie.mkv"), &files, 0, "t").unwrap();
    assert_eq!(from_start[0], "-vf");
}

/// Test parsing of encoder preferences
#[test]
fn test_encoder_preference_parse_withAliases_shouldResolve() {
    assert_eq!("AUTO".parse::<EncoderPreference>().unwrap(), EncoderPreference::Auto);
    assert_eq!("cpu".parse::<EncoderPreference>().unwrap(), EncoderPreference::Software);
    assert_eq!("nvenc".parse::<EncoderPreference>().unwrap().forced(), Some(HardwareEncoder::Nvenc));
    assert_eq!(EncoderPreference::Auto.forced(), None);
    assert!("vaapi".parse::<EncoderPreference>().is_err());
}
