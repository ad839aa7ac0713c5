//! Capture configuration file format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::validation::validate_capture_config;

/// What is known about a device's native format.
///
/// Devices that do not report a format stay `Unknown`; no default rate or
/// bit depth is ever substituted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceCapabilities {
    /// The device did not report its format.
    #[default]
    Unknown,
    /// The device reported its native format.
    Known {
        /// Sample rate in Hz.
        sample_rate: u32,
        /// Bits per sample.
        bit_depth: u16,
    },
}

impl DeviceCapabilities {
    /// Sample rate, if known.
    pub fn sample_rate(&self) -> Option<u32> {
        match self {
            DeviceCapabilities::Known { sample_rate, .. } => Some(*sample_rate),
            DeviceCapabilities::Unknown => None,
        }
    }

    /// Bit depth, if known.
    pub fn bit_depth(&self) -> Option<u16> {
        match self {
            DeviceCapabilities::Known { bit_depth, .. } => Some(*bit_depth),
            DeviceCapabilities::Unknown => None,
        }
    }
}

/// A named set of playback channels, e.g. "Left" or "LFE".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGroup {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Physical playback channel indices (0-based).
    #[serde(default)]
    pub channels: BTreeSet<u16>,
}

/// Standard surround names, in interface channel order.
const STANDARD_GROUPS: [(&str, &str); 6] = [
    ("left", "Left"),
    ("right", "Right"),
    ("center", "Center"),
    ("lfe", "LFE"),
    ("surround_left", "Surround Left"),
    ("surround_right", "Surround Right"),
];

impl ChannelGroup {
    /// Create a group.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        channels: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channels: channels.into_iter().collect(),
        }
    }

    /// One group per channel: L, R, C, LFE, SL, SR, then "Channel N".
    pub fn standard_layout(channels: u16) -> Vec<Self> {
        (0..channels)
            .map(|ch| match STANDARD_GROUPS.get(usize::from(ch)) {
                Some((id, name)) => Self::new(*id, *name, [ch]),
                None => Self::new(format!("channel_{}", ch + 1), format!("Channel {}", ch + 1), [ch]),
            })
            .collect()
    }
}

/// Output side of the measurement chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Device name.
    pub device: String,
    /// Number of output channels in use.
    pub channels: u16,
    /// Native format.
    #[serde(default)]
    pub capabilities: DeviceCapabilities,
    /// Logical channel groups.
    #[serde(default)]
    pub channel_groups: Vec<ChannelGroup>,
}

/// Input side of the measurement chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Device name.
    pub device: String,
    /// Number of logical recording channels.
    pub channels: u16,
    /// Native format.
    #[serde(default)]
    pub capabilities: DeviceCapabilities,
    /// Logical recording channel to physical interface channel (0-based).
    #[serde(default)]
    pub channel_mapping: Vec<u16>,
}

impl RecordingConfig {
    /// Physical input channel that records playback channel `index`.
    ///
    /// Uses the mapping entry at `index` when there is one, otherwise the first
    /// entry (a single reference microphone shared by every channel).
    pub fn destination_channel(&self, index: usize) -> Option<u16> {
        self.channel_mapping
            .get(index)
            .or_else(|| self.channel_mapping.first())
            .copied()
    }
}

/// Where the measurement microphone calibration comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationSource {
    /// A calibration file on disk.
    Path(PathBuf),
    /// A file name inside the user calibration directory.
    Id(String),
}

impl CalibrationSource {
    /// Resolve to a file path, looking identifiers up in `calibration_dir`.
    pub fn resolve(&self, calibration_dir: &Path) -> PathBuf {
        match self {
            CalibrationSource::Path(path) => path.clone(),
            CalibrationSource::Id(id) => calibration_dir.join(id),
        }
    }
}

/// Devices, channel layout and calibration for a measurement session.
///
/// # TOML Format
///
/// ```toml
/// microphone_calibration = { path = "/home/me/umik-1.txt" }
///
/// [playback]
/// device = "Scarlett 2i2"
/// channels = 2
///
/// [playback.capabilities]
/// kind = "known"
/// sample_rate = 48000
/// bit_depth = 24
///
/// [[playback.channel_groups]]
/// id = "left"
/// name = "Left"
/// channels = [0]
///
/// [[playback.channel_groups]]
/// id = "right"
/// name = "Right"
/// channels = [1]
///
/// [recording]
/// device = "Scarlett 2i2"
/// channels = 1
/// channel_mapping = [0]
///
/// [recording.capabilities]
/// kind = "unknown"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Output device.
    pub playback: PlaybackConfig,
    /// Input device.
    pub recording: RecordingConfig,
    /// Optional microphone calibration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microphone_calibration: Option<CalibrationSource>,
}

impl CaptureConfig {
    /// Create a configuration with the standard channel layout and an
    /// identity recording mapping.
    pub fn new(
        playback_device: impl Into<String>,
        playback_channels: u16,
        recording_device: impl Into<String>,
        recording_channels: u16,
    ) -> Self {
        Self {
            playback: PlaybackConfig {
                device: playback_device.into(),
                channels: playback_channels,
                capabilities: DeviceCapabilities::Unknown,
                channel_groups: ChannelGroup::standard_layout(playback_channels),
            },
            recording: RecordingConfig {
                device: recording_device.into(),
                channels: recording_channels,
                capabilities: DeviceCapabilities::Unknown,
                channel_mapping: (0..recording_channels).collect(),
            },
            microphone_calibration: None,
        }
    }

    /// Set the microphone calibration.
    pub fn with_calibration(mut self, source: CalibrationSource) -> Self {
        self.microphone_calibration = Some(source);
        self
    }

    /// Set the capabilities of both devices.
    pub fn with_capabilities(
        mut self,
        playback: DeviceCapabilities,
        recording: DeviceCapabilities,
    ) -> Self {
        self.playback.capabilities = playback;
        self.recording.capabilities = recording;
        self
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            playback_channels = config.playback.channels,
            recording_channels = config.recording.channels,
            "loaded capture config"
        );
        Ok(config)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: CaptureConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_capture_config(self)?;
        Ok(())
    }

    /// The group that owns playback channel `index`, if any.
    pub fn group_for_channel(&self, index: u16) -> Option<&ChannelGroup> {
        self.playback
            .channel_groups
            .iter()
            .find(|g| g.channels.contains(&index))
    }

    /// Display name of playback channel `index`.
    pub fn channel_name(&self, index: u16) -> String {
        match self.group_for_channel(index) {
            Some(group) => group.name.clone(),
            None => format!("Channel {}", index + 1),
        }
    }

    /// Sample rate reported by either device, recording side first.
    pub fn known_sample_rate(&self) -> Option<u32> {
        self.recording
            .capabilities
            .sample_rate()
            .or_else(|| self.playback.capabilities.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
microphone_calibration = { id = "umik-1.txt" }

[playback]
device = "Scarlett 2i2"
channels = 2

[playback.capabilities]
kind = "known"
sample_rate = 48000
bit_depth = 24

[[playback.channel_groups]]
id = "left"
name = "Left"
channels = [0]

[[playback.channel_groups]]
id = "right"
name = "Right"
channels = [1]

[recording]
device = "Scarlett 2i2"
channels = 1
channel_mapping = [1]
"#;

    #[test]
    fn parses_documented_format() {
        let config = CaptureConfig::from_toml(EXAMPLE).unwrap();
        assert_eq!(config.playback.channels, 2);
        assert_eq!(config.playback.capabilities.sample_rate(), Some(48000));
        assert_eq!(config.playback.capabilities.bit_depth(), Some(24));
        assert_eq!(config.recording.capabilities, DeviceCapabilities::Unknown);
        assert_eq!(config.recording.channel_mapping, vec![1]);
        assert_eq!(
            config.microphone_calibration,
            Some(CalibrationSource::Id("umik-1.txt".to_string()))
        );
    }

    #[test]
    fn from_toml_validates() {
        let broken = EXAMPLE.replace("channel_mapping = [1]", "channel_mapping = []");
        assert!(matches!(
            CaptureConfig::from_toml(&broken),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let config = CaptureConfig::new("Out", 6, "In", 2)
            .with_capabilities(
                DeviceCapabilities::Known {
                    sample_rate: 96000,
                    bit_depth: 32,
                },
                DeviceCapabilities::Unknown,
            )
            .with_calibration(CalibrationSource::Path(PathBuf::from("/tmp/cal.txt")));
        let text = config.to_toml().unwrap();
        assert_eq!(CaptureConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn standard_layout_names() {
        let groups = ChannelGroup::standard_layout(8);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Left",
                "Right",
                "Center",
                "LFE",
                "Surround Left",
                "Surround Right",
                "Channel 7",
                "Channel 8"
            ]
        );
        assert!(groups[3].channels.contains(&3));
    }

    #[test]
    fn destination_falls_back_to_first_mapping() {
        let config = CaptureConfig::from_toml(EXAMPLE).unwrap();
        assert_eq!(config.recording.destination_channel(0), Some(1));
        assert_eq!(config.recording.destination_channel(1), Some(1));

        let mut empty = config.recording.clone();
        empty.channel_mapping.clear();
        assert_eq!(empty.destination_channel(0), None);
    }

    #[test]
    fn channel_names_follow_groups() {
        let config = CaptureConfig::from_toml(EXAMPLE).unwrap();
        assert_eq!(config.channel_name(1), "Right");
        assert_eq!(config.channel_name(5), "Channel 6");
    }

    #[test]
    fn known_sample_rate_prefers_recording() {
        let config = CaptureConfig::new("Out", 2, "In", 1).with_capabilities(
            DeviceCapabilities::Known {
                sample_rate: 44100,
                bit_depth: 16,
            },
            DeviceCapabilities::Known {
                sample_rate: 48000,
                bit_depth: 24,
            },
        );
        assert_eq!(config.known_sample_rate(), Some(48000));
        assert_eq!(CaptureConfig::new("Out", 2, "In", 1).known_sample_rate(), None);
    }

    #[test]
    fn calibration_source_resolves() {
        let dir = Path::new("/cal");
        assert_eq!(
            CalibrationSource::Id("a.txt".to_string()).resolve(dir),
            PathBuf::from("/cal/a.txt")
        );
        assert_eq!(
            CalibrationSource::Path(PathBuf::from("/x/b.txt")).resolve(dir),
            PathBuf::from("/x/b.txt")
        );
    }
}
