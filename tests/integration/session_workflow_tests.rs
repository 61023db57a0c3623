/*!
 * Integration tests for session preparation through the controller
 */

use anyhow::Result;
use std::path::Path;
use dualsub::app_config::Config;
use dualsub::app_controller::{Controller, SessionRequest, StyleEdit};
use dualsub::errors::SessionError;
use dualsub::media::mock::MockMedia;
use dualsub::session::TrackSlot;
use crate::common;

fn controller(backend: MockMedia) -> Result<Controller<MockMedia>> {
    Ok(Controller::with_backend(Config::default(), backend)?.without_progress())
}

fn request(dir: &Path) -> Result<SessionRequest> {
    Ok(SessionRequest {
        video: common::create_test_video(dir, "movie.mp4")?,
        subtitle1: Some(common::create_chinese_subtitle(dir, "movie.zh.srt")?),
        subtitle2: Some(common::create_english_subtitle(dir, "movie.en.srt")?),
        ..Default::default()
    })
}

/// Test a full session with both tracks
#[tokio::test]
async fn test_prepare_session_withBothTracks_shouldLoadEverything() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller(MockMedia::working())?;

    let session = controller.prepare_session(&request(temp_dir.path())?).await?;

    assert_eq!(session.preset_name(), "none");
    assert_eq!(session.video_duration_ms(), Some(60_000));
    assert_eq!(session.ready_tracks().len(), 2);
    assert_eq!(session.track(TrackSlot::First).subtitles.as_ref().map(|s| s.entries.len()), Some(3));
    assert_eq!(controller.backend().probe_count(), 1);
    Ok(())
}

/// Test that fonts missing from the system are replaced by the fallback font
#[tokio::test]
async fn test_prepare_session_withMissingFonts_shouldUseFallback() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let session = controller(MockMedia::working().with_fonts(&["Arial", "simsun"]))?
        .prepare_session(&request(temp_dir.path())?)
        .await?;

    assert_eq!(session.track(TrackSlot::First).style.font_name, "SimSun");
    assert_eq!(session.track(TrackSlot::Second).style.font_name, "Arial");
    Ok(())
}

/// Test that an unavailable font list keeps the configured fonts
#[tokio::test]
async fn test_prepare_session_withoutFontList_shouldKeepFonts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let session = controller(MockMedia::working().with_fonts(&[]))?
        .prepare_session(&request(temp_dir.path())?)
        .await?;

    assert_eq!(session.track(TrackSlot::Second).style.font_name, "Gotham Medium");
    Ok(())
}

/// Test the preset and style edits applied in order
#[tokio::test]
async fn test_prepare_session_withPresetAndEdits_shouldApplyEditsLast() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut req = request(temp_dir.path())?;
    req.subtitle1 = None;
    req.preset = Some("Chinese".to_string());
    req.style_edits = vec![
        StyleEdit::parse(TrackSlot::Second, "margin=40")?,
        StyleEdit::parse(TrackSlot::Second, "color = #FFFF00")?,
    ];

    let session = controller(MockMedia::working())?.prepare_session(&req).await?;

    assert_eq!(session.preset_name(), "chinese");
    assert!(!session.track(TrackSlot::First).enabled);
    assert_eq!(session.track(TrackSlot::Second).style.margin_v, 40);
    assert_eq!(session.track(TrackSlot::Second).style.primary_color.to_string(), "#FFFF00");
    Ok(())
}

/// Test that a subtitle for a disabled track is refused
#[tokio::test]
async fn test_prepare_session_withSubtitleForDisabledTrack_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut req = request(temp_dir.path())?;
    req.preset = Some("chinese".to_string());

    let result = controller(MockMedia::working())?.prepare_session(&req).await;
    assert!(matches!(result, Err(SessionError::TrackDisabled { slot: TrackSlot::First, .. })));
    Ok(())
}

/// Test unknown presets and bad edits
#[tokio::test]
async fn test_prepare_session_withUnknownPresetOrBadEdit_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller(MockMedia::working())?;

    let mut req = request(temp_dir.path())?;
    req.preset = Some("klingon".to_string());
    assert!(matches!(
        controller.prepare_session(&req).await,
        Err(SessionError::UnknownPreset(name)) if name == "klingon"
    ));

    let mut req = request(temp_dir.path())?;
    req.style_edits = vec![StyleEdit::parse(TrackSlot::First, "size=-3")?];
    assert!(matches!(
        controller.prepare_session(&req).await,
        Err(SessionError::Style { slot: TrackSlot::First, .. })
    ));

    assert!(StyleEdit::parse(TrackSlot::First, "size").is_err());
    assert!(StyleEdit::parse(TrackSlot::First, "=3").is_err());
    Ok(())
}

/// Test that the start position is clamped to the probed duration
#[tokio::test]
async fn test_prepare_session_withPositionPastEnd_shouldClamp() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut req = request(temp_dir.path())?;
    req.position_ms = 90_000;

    let session = controller(MockMedia::working())?.prepare_session(&req).await?;
    assert_eq!(session.position_ms(), 60_000);

    let mut req = request(temp_dir.path())?;
    req.position_ms = 90_000;
    let session = controller(MockMedia::working().with_duration(None))?
        .prepare_session(&req)
        .await?;
    assert_eq!(session.position_ms(), 90_000);
    Ok(())
}

/// Test that a missing tool chain does not prevent building a session
#[tokio::test]
async fn test_prepare_session_withMissingTools_shouldStillLoad() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let session = controller(MockMedia::missing_ffmpeg())?
        .prepare_session(&request(temp_dir.path())?)
        .await?;

    assert_eq!(session.video_duration_ms(), None);
    assert_eq!(session.ready_tracks().len(), 2);
    Ok(())
}

/// Test the session flow from a synchronous caller
#[test]
fn test_prepare_session_fromBlockingContext_shouldComplete() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller(MockMedia::working())?;
    let req = request(temp_dir.path())?;

    let session = tokio_test::block_on(async { controller.prepare_session(&req).await })?;
    assert_eq!(session.overlay_text().len(), 2);
    Ok(())
}

/// Test that sibling subtitle files are matched to tracks by language tag
#[test]
fn test_fill_sibling_subtitles_withLanguageTags_shouldMatchTracks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let video = common::create_test_video(dir, "movie.mp4")?;
    common::create_english_subtitle(dir, "movie.en.srt")?;
    common::create_chinese_subtitle(dir, "movie.zh.srt")?;
    common::create_english_subtitle(dir, "movie.fr.srt")?;
    let controller = controller(MockMedia::working())?;

    let mut req = SessionRequest { video: video.clone(), ..Default::default() };
    let unassigned = controller.fill_sibling_subtitles(&mut req)?;
    assert_eq!(req.subtitle1, Some(dir.join("movie.zh.srt")));
    assert_eq!(req.subtitle2, Some(dir.join("movie.en.srt")));
    assert_eq!(unassigned, vec![dir.join("movie.fr.srt")]);

    let mut req = SessionRequest {
        video: video.clone(),
        preset: Some("english".to_string()),
        ..Default::default()
    };
    controller.fill_sibling_subtitles(&mut req)?;
    assert_eq!(req.subtitle1, Some(dir.join("movie.zh.srt")));
    assert_eq!(req.subtitle2, None);

    let explicit = common::create_english_vtt(dir, "other.vtt")?;
    let mut req = SessionRequest {
        video,
        subtitle2: Some(explicit.clone()),
        ..Default::default()
    };
    controller.fill_sibling_subtitles(&mut req)?;
    assert_eq!(req.subtitle1, Some(dir.join("movie.zh.srt")));
    assert_eq!(req.subtitle2, Some(explicit));
    Ok(())
}

/// Test that a video without tagged siblings leaves the tracks empty
#[test]
fn test_fill_sibling_subtitles_withUntaggedFile_shouldLeaveTracksEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "clip.mkv")?;
    let untagged = common::create_english_subtitle(temp_dir.path(), "clip.srt")?;

    let mut req = SessionRequest { video, ..Default::default() };
    let unassigned = controller(MockMedia::working())?.fill_sibling_subtitles(&mut req)?;

    assert_eq!(req.subtitle1, None);
    assert_eq!(req.subtitle2, None);
    assert_eq!(unassigned, vec![untagged]);
    Ok(())
}
