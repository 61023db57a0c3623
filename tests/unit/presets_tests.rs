/*!
 * Tests for position presets
 */

use dualsub::presets::{Preset, PresetRegistry, TrackPreset};
use dualsub::style::{Alignment, SubtitleStyle};

/// Test the three built-in presets
#[test]
fn test_builtins_withDefaultRegistry_shouldMatchDesktopPresets() {
    let registry = PresetRegistry::default();
    assert_eq!(registry.names(), vec!["none", "chinese", "english"]);

    let none = registry.get("none").unwrap();
    assert!(none.first.enabled && none.second.enabled);
    assert_eq!(none.first.margin_v, Some(35));
    assert_eq!(none.second.margin_v, Some(5));

    let chinese = registry.get("chinese").unwrap();
    assert!(!chinese.first.enabled);
    assert!(chinese.second.enabled);
    assert_eq!(chinese.second.margin_v, Some(25));

    let english = registry.get("english").unwrap();
    assert!(english.first.enabled);
    assert_eq!(english.first.margin_v, Some(35));
    assert!(!english.second.enabled);
}

/// Test case-insensitive lookup
#[test]
fn test_get_withMixedCase_shouldFindPreset() {
    let registry = PresetRegistry::default();
    assert_eq!(registry.get(" Chinese ").map(|p| p.name.as_str()), Some("chinese"));
    assert!(registry.get("klingon").is_none());
}

/// Test user presets replacing and extending the built-ins
#[test]
fn test_with_user_presets_withOverrideAndNewPreset_shouldMerge() {
    let top = Preset {
        name: "top".to_string(),
        description: "Subtitle 1 at the top".to_string(),
        first: TrackPreset {
            enabled: true,
            margin_v: Some(10),
            alignment: Some(Alignment::TOP),
            font_size: None,
        },
        second: TrackPreset::at_margin(5),
    };
    let english = Preset {
        name: "English".to_string(),
        description: "Custom english".to_string(),
        first: TrackPreset::at_margin(50),
        second: TrackPreset::disabled(),
    };

    let registry = PresetRegistry::with_user_presets(&[top.clone(), english]);

    assert_eq!(registry.list().len(), 4);
    assert_eq!(registry.names(), vec!["none", "chinese", "English", "top"]);
    assert_eq!(registry.get("english").unwrap().first.margin_v, Some(50));
    assert_eq!(registry.get("top").unwrap(), &top);
}

/// Test copying overrides into a style
#[test]
fn test_apply_to_withOverrides_shouldOnlyTouchGivenFields() {
    let mut style = SubtitleStyle::first_track_default();
    let preset = TrackPreset {
        enabled: true,
        margin_v: Some(80),
        alignment: None,
        font_size: Some(18),
    };

    preset.apply_to(&mut style);

    assert_eq!(style.margin_v, 80);
    assert_eq!(style.font_size, 18);
    assert_eq!(style.alignment, Alignment::BOTTOM);
    assert_eq!(style.font_name, "SimSun");
}

/// Test the JSON form used in the configuration file
#[test]
fn test_preset_deserialize_withMinimalJson_shouldDefaultEnabled() {
    let json = r#"{
        "name": "low",
        "first": { "margin_v": 60 },
        "second": { "enabled": false }
    }"#;
    let preset: Preset = serde_json::from_str(json).unwrap();

    assert!(preset.first.enabled);
    assert_eq!(preset.first.margin_v, Some(60));
    assert!(!preset.second.enabled);
    assert!(preset.description.is_empty());
}
