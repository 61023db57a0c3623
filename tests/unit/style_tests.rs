/*!
 * Tests for subtitle style values
 */

use dualsub::errors::StyleError;
use dualsub::style::{Alignment, Color, SubtitleStyle};

/// Test the defaults of both tracks
#[test]
fn test_track_defaults_withNoEdits_shouldMatchDesktopDefaults() {
    let first = SubtitleStyle::first_track_default();
    assert_eq!(first.font_name, "SimSun");
    assert_eq!(first.font_size, 12);
    assert_eq!(first.margin_v, 35);

    let second = SubtitleStyle::second_track_default();
    assert_eq!(second.font_name, "Gotham Medium");
    assert_eq!(second.font_size, 16);
    assert_eq!(second.margin_v, 5);

    for style in [&first, &second] {
        assert_eq!(style.primary_color, Color::WHITE);
        assert_eq!(style.outline_color, Color::BLACK);
        assert_eq!(style.outline, 0.5);
        assert_eq!(style.shadow, 0.0);
        assert_eq!(style.border_style, 1);
        assert_eq!(style.alignment, Alignment::BOTTOM);
        assert!(style.validate().is_ok());
    }
}

/// Test ASS color forms
#[test]
fn test_color_to_ass_withYellow_shouldSwapToBgr() {
    let yellow: Color = "#FFFF00".parse().unwrap();
    assert_eq!(yellow.to_ass(), "&H0000FFFF");
    assert_eq!(yellow.to_ass_override(), "{\\c&H00FFFF&}");
    assert_eq!(yellow.to_string(), "#FFFF00");

    let named: Color = "Yellow".parse().unwrap();
    assert_eq!(named, yellow);
}

/// Test a handful of edits through apply_setting
#[test]
fn test_apply_setting_withValidEdits_shouldUpdateFields() {
    let mut style = SubtitleStyle::first_track_default();

    style.apply_setting("font", "Noto Sans CJK SC").unwrap();
    style.apply_setting("size", "20").unwrap();
    style.apply_setting("color", "#00ff00").unwrap();
    style.apply_setting("outline_color", "red").unwrap();
    style.apply_setting("margin", "40").unwrap();
    style.apply_setting("align", "top").unwrap();
    style.apply_setting("bold", "yes").unwrap();

    assert_eq!(style.font_name, "Noto Sans CJK SC");
    assert_eq!(style.font_size, 20);
    assert_eq!(style.primary_color, Color::rgb(0, 255, 0));
    assert_eq!(style.outline_color, Color::rgb(255, 0, 0));
    assert_eq!(style.margin_v, 40);
    assert_eq!(style.alignment, Alignment::TOP);
    assert!(style.bold);
}

/// Test the outline toggle
#[test]
fn test_apply_setting_withOutlineOffThenOn_shouldRestoreThickness() {
    let mut style = SubtitleStyle::second_track_default();

    style.apply_setting("outline", "off").unwrap();
    assert_eq!(style.outline, 0.0);

    style.apply_setting("outline", "on").unwrap();
    assert_eq!(style.outline, 0.5);

    style.apply_setting("outline", "2.5").unwrap();
    assert_eq!(style.outline, 2.5);
}

/// Test range checks on edits
#[test]
fn test_apply_setting_withOutOfRangeValues_shouldFail() {
    let fresh = SubtitleStyle::first_track_default;

    assert!(matches!(
        fresh().apply_setting("size", "0"),
        Err(StyleError::OutOfRange { field: "font size", .. })
    ));
    assert!(matches!(
        fresh().apply_setting("outline", "11"),
        Err(StyleError::OutOfRange { field: "outline", .. })
    ));
    assert!(matches!(
        fresh().apply_setting("margin", "1001"),
        Err(StyleError::OutOfRange { field: "margin", .. })
    ));
    assert!(matches!(
        fresh().apply_setting("align", "10"),
        Err(StyleError::OutOfRange { field: "alignment", .. })
    ));
}

/// Test unknown keys and unparsable values
#[test]
fn test_apply_setting_withBadInput_shouldReportError() {
    let mut style = SubtitleStyle::first_track_default();

    assert_eq!(
        style.apply_setting("glow", "1"),
        Err(StyleError::UnknownSetting("glow".to_string()))
    );
    assert_eq!(style.apply_setting("font", "  "), Err(StyleError::EmptyFont));
    assert!(matches!(
        style.apply_setting("size", "big"),
        Err(StyleError::InvalidValue { field: "font size", .. })
    ));
    assert!(matches!(
        style.apply_setting("color", "#12345"),
        Err(StyleError::InvalidValue { field: "color", .. })
    ));
}

/// Test that a font name cannot break the comma separated style line
#[test]
fn test_apply_setting_withCommaInFont_shouldFail() {
    let mut style = SubtitleStyle::second_track_default();

    assert!(matches!(
        style.apply_setting("font", "Noto Sans, Bold"),
        Err(StyleError::InvalidValue { field: "font name", .. })
    ));
    assert_eq!(style, SubtitleStyle::second_track_default());

    style.font_name = "Arial,Black".to_string();
    assert!(style.validate().is_err());
}

/// Test the V4+ style line
#[test]
fn test_to_ass_style_line_withDefaultStyle_shouldListAllFields() {
    let style = SubtitleStyle::first_track_default();
    let line = style.to_ass_style_line("Sub1");

    assert!(line.starts_with("Style: Sub1,SimSun,12,&H00FFFFFF,"));
    let fields: Vec<&str> = line.trim_start_matches("Style: ").split(',').collect();
    assert_eq!(fields.len(), 23);
    assert_eq!(fields[15], "1");
    assert_eq!(fields[16], "0.5");
    assert_eq!(fields[18], "2");
    assert_eq!(fields[21], "35");
}

/// Test that styles survive a JSON round trip with their string colors
#[test]
fn test_style_serialization_withCustomColor_shouldUseHexStrings() {
    let mut style = SubtitleStyle::second_track_default();
    style.primary_color = "#FFFF0080".parse().unwrap();

    let json = serde_json::to_string(&style).unwrap();
    assert!(json.contains("\"#FFFF0080\""));

    let back: SubtitleStyle = serde_json::from_str(&json).unwrap();
    assert_eq!(back, style);
}
