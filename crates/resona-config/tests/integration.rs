//! Integration tests for resona-config.
//!
//! File round-trips and validation through the public API.

use resona_config::{
    CalibrationSource, CaptureConfig, ChannelGroup, ConfigError, DeviceCapabilities,
    ValidationError,
};
use tempfile::TempDir;

/// Save then load restores an identical configuration.
#[test]
fn save_load_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("capture.toml");

    let config = CaptureConfig::new("Out", 3, "In", 3)
        .with_capabilities(
            DeviceCapabilities::Known {
                sample_rate: 48000,
                bit_depth: 24,
            },
            DeviceCapabilities::Known {
                sample_rate: 48000,
                bit_depth: 24,
            },
        )
        .with_calibration(CalibrationSource::Id("ecm8000.cal".to_string()));

    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = CaptureConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.channel_name(2), "Center");
}

/// A hand-edited file that breaks invariants fails to load.
#[test]
fn load_rejects_inconsistent_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("capture.toml");
    std::fs::write(
        &path,
        r#"
[playback]
device = "Out"
channels = 2

[[playback.channel_groups]]
id = "sub"
name = "Subwoofer"
channels = [4]

[recording]
device = "In"
channels = 2
channel_mapping = [0]
"#,
    )
    .unwrap();

    match CaptureConfig::load(&path) {
        Err(ConfigError::Validation(ValidationError::Multiple(errors))) => {
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

/// Missing files report the path.
#[test]
fn load_missing_file() {
    let err = CaptureConfig::load("/nonexistent/resona/capture.toml").unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

/// Malformed TOML is a parse error, not a validation error.
#[test]
fn malformed_toml() {
    assert!(matches!(
        CaptureConfig::from_toml("[playback\ndevice ="),
        Err(ConfigError::TomlParse(_))
    ));
}

/// Custom groups can merge several physical channels.
#[test]
fn multi_channel_group() {
    let mut config = CaptureConfig::new("Out", 4, "In", 1);
    config.playback.channel_groups = vec![
        ChannelGroup::new("mains", "Mains", [0, 1]),
        ChannelGroup::new("subs", "Subs", [2, 3]),
    ];
    config.validate().unwrap();
    assert_eq!(config.group_for_channel(3).map(|g| g.id.as_str()), Some("subs"));

    let text = config.to_toml().unwrap();
    let parsed = CaptureConfig::from_toml(&text).unwrap();
    assert_eq!(parsed.playback.channel_groups, config.playback.channel_groups);
}
