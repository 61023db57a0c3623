/*!
 * Tests for the in-memory editing session
 */

use anyhow::Result;
use dualsub::errors::{SessionError, StyleError};
use dualsub::presets::Preset;
use dualsub::session::{Session, TrackSlot};
use dualsub::style::SubtitleStyle;
use crate::common;

fn default_session() -> Session {
    Session::new(SubtitleStyle::first_track_default(), SubtitleStyle::second_track_default())
}

/// Test that choosing a preset updates enabled flags and margins
#[test]
fn test_apply_preset_withChinese_shouldDisableFirstAndMoveSecond() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub1 = common::create_chinese_subtitle(temp_dir.path(), "movie.zh.srt")?;
    let mut session = default_session();
    session.load_subtitles(TrackSlot::First, &sub1)?;

    session.apply_preset(&Preset::chinese());

    assert_eq!(session.preset_name(), "chinese");
    assert!(!session.track(TrackSlot::First).enabled);
    assert!(session.track(TrackSlot::First).subtitles.is_none());
    assert!(session.track(TrackSlot::Second).enabled);
    assert_eq!(session.track(TrackSlot::Second).style.margin_v, 25);

    session.apply_preset(&Preset::none());
    assert!(session.track(TrackSlot::First).enabled);
    assert_eq!(session.track(TrackSlot::First).style.margin_v, 35);
    assert_eq!(session.track(TrackSlot::Second).style.margin_v, 5);

    Ok(())
}

/// Test that a disabled slot refuses subtitles and style edits
#[test]
fn test_load_subtitles_withDisabledSlot_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub2 = common::create_english_subtitle(temp_dir.path(), "movie.en.srt")?;
    let mut session = default_session();
    session.apply_preset(&Preset::english());

    let result = session.load_subtitles(TrackSlot::Second, &sub2);
    assert!(matches!(
        result,
        Err(SessionError::TrackDisabled { slot: TrackSlot::Second, ref preset }) if preset == "english"
    ));
    assert!(matches!(
        session.edit_style(TrackSlot::Second, "size", "20"),
        Err(SessionError::TrackDisabled { .. })
    ));

    Ok(())
}

/// Test that a failed edit leaves the style untouched
#[test]
fn test_edit_style_withInvalidValue_shouldKeepPreviousStyle() {
    let mut session = default_session();
    session.edit_style(TrackSlot::First, "size", "22").unwrap();

    let result = session.edit_style(TrackSlot::First, "size", "900");
    assert!(matches!(
        result,
        Err(SessionError::Style { slot: TrackSlot::First, source: StyleError::OutOfRange { .. } })
    ));
    assert_eq!(session.track(TrackSlot::First).style.font_size, 22);
}

/// Test the export readiness checks
#[test]
fn test_ensure_exportable_withMissingPieces_shouldExplainWhat() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "movie.mp4")?;
    let sub2 = common::create_english_subtitle(temp_dir.path(), "movie.en.srt")?;
    let mut session = default_session();

    assert!(matches!(session.ensure_exportable(), Err(SessionError::NoVideo)));

    session.load_video(&video)?;
    assert!(matches!(
        session.ensure_exportable(),
        Err(SessionError::MissingTrack { slot: TrackSlot::First, .. })
    ));

    session.apply_preset(&Preset::chinese());
    assert!(matches!(
        session.ensure_exportable(),
        Err(SessionError::MissingTrack { slot: TrackSlot::Second, .. })
    ));

    session.load_subtitles(TrackSlot::Second, &sub2)?;
    session.ensure_exportable()?;
    assert_eq!(session.ready_tracks().len(), 1);

    Ok(())
}

/// Test that a preset disabling both tracks leaves nothing to export
#[test]
fn test_ensure_exportable_withAllTracksDisabled_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "movie.mp4")?;
    let mut session = default_session();
    session.load_video(&video)?;

    let mut off = Preset::english();
    off.name = "off".to_string();
    off.first.enabled = false;
    session.apply_preset(&off);

    assert!(matches!(session.ensure_exportable(), Err(SessionError::NothingToExport)));
    Ok(())
}

/// Test video loading checks
#[test]
fn test_load_video_withWrongFiles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle = common::create_english_subtitle(temp_dir.path(), "movie.en.srt")?;
    let mut session = default_session();

    assert!(matches!(
        session.load_video(temp_dir.path().join("missing.mkv")),
        Err(SessionError::MissingFile(_))
    ));
    assert!(matches!(session.load_video(&subtitle), Err(SessionError::NotAVideo(_))));
    assert!(session.video().is_none());

    Ok(())
}

/// Test cursor clamping and the text shown at the cursor
#[test]
fn test_seek_withKnownDuration_shouldClampAndReportOverlay() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "movie.mkv")?;
    let sub1 = common::create_chinese_subtitle(temp_dir.path(), "movie.zh.srt")?;
    let sub2 = common::create_english_subtitle(temp_dir.path(), "movie.en.srt")?;

    let mut session = default_session();
    session.load_video(&video)?;
    session.load_subtitles(TrackSlot::First, &sub1)?;
    session.load_subtitles(TrackSlot::Second, &sub2)?;
    session.set_video_duration_ms(Some(20_000));

    assert_eq!(session.seek(60_000), 20_000);
    assert_eq!(session.seek(6_000), 6_000);

    let overlay = session.overlay_text();
    assert_eq!(
        overlay,
        vec![
            (TrackSlot::First, "这是第二句".to_string()),
            (TrackSlot::Second, "This is the second line".to_string()),
        ]
    );

    session.seek(10_000);
    assert!(session.overlay_text().iter().all(|(_, text)| text.is_empty()));

    Ok(())
}
