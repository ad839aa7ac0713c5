//! Capture configuration validation.
//!
//! Every check runs and all failures are reported together, so a user fixing
//! a hand-edited file sees the whole list at once.
//!
//! # Example
//!
//! ```rust
//! use resona_config::{CaptureConfig, validate_capture_config};
//!
//! let config = CaptureConfig::new("Interface", 2, "Interface", 1);
//! validate_capture_config(&config).expect("stereo default is valid");
//! ```

use std::collections::BTreeSet;
use thiserror::Error;

use crate::capture::CaptureConfig;
use crate::session::SessionSettings;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A device name is empty.
    #[error("{role} device name is empty")]
    EmptyDeviceName {
        /// `"playback"` or `"recording"`.
        role: String,
    },

    /// A device declares no channels.
    #[error("{role} device has zero channels")]
    ZeroChannels {
        /// `"playback"` or `"recording"`.
        role: String,
    },

    /// The recording channel mapping does not cover every recording channel.
    #[error("channel mapping has {actual} entries but the recording device has {expected} channels")]
    MappingLength {
        /// `recording.channels`.
        expected: u16,
        /// `channel_mapping.len()`.
        actual: usize,
    },

    /// A channel group references a channel the playback device does not have.
    #[error("group '{group}' references channel {channel} but playback has {channels} channels")]
    GroupChannelOutOfRange {
        /// Group id.
        group: String,
        /// Offending channel index.
        channel: u16,
        /// `playback.channels`.
        channels: u16,
    },

    /// Two channel groups share an id.
    #[error("duplicate channel group id '{0}'")]
    DuplicateGroupId(String),

    /// A channel group has an empty display name.
    #[error("channel group '{0}' has an empty name")]
    EmptyGroupName(String),

    /// A session parameter is out of range.
    #[error("invalid session setting '{field}': {reason}")]
    InvalidSession {
        /// Setting name.
        field: String,
        /// Description of the problem.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Collapse collected errors into a single result.
fn into_result(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Check every [`CaptureConfig`] invariant.
pub fn validate_capture_config(config: &CaptureConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    for (role, device, channels) in [
        ("playback", &config.playback.device, config.playback.channels),
        ("recording", &config.recording.device, config.recording.channels),
    ] {
        if device.trim().is_empty() {
            errors.push(ValidationError::EmptyDeviceName {
                role: role.to_string(),
            });
        }
        if channels == 0 {
            errors.push(ValidationError::ZeroChannels {
                role: role.to_string(),
            });
        }
    }

    let mapping_len = config.recording.channel_mapping.len();
    if mapping_len != usize::from(config.recording.channels) {
        errors.push(ValidationError::MappingLength {
            expected: config.recording.channels,
            actual: mapping_len,
        });
    }

    let mut seen = BTreeSet::new();
    for group in &config.playback.channel_groups {
        if !seen.insert(group.id.as_str()) {
            errors.push(ValidationError::DuplicateGroupId(group.id.clone()));
        }
        if group.name.trim().is_empty() {
            errors.push(ValidationError::EmptyGroupName(group.id.clone()));
        }
        for &channel in group.channels.iter().filter(|&&c| c >= config.playback.channels) {
            errors.push(ValidationError::GroupChannelOutOfRange {
                group: group.id.clone(),
                channel,
                channels: config.playback.channels,
            });
        }
    }

    into_result(errors)
}

/// Check the per-run [`SessionSettings`].
pub fn validate_session(settings: &SessionSettings) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if !(settings.duration_secs.is_finite() && settings.duration_secs > 0.0) {
        errors.push(ValidationError::InvalidSession {
            field: "duration_secs".to_string(),
            reason: format!("{} is not a positive number of seconds", settings.duration_secs),
        });
    }
    if settings.sample_rate_override == Some(0) {
        errors.push(ValidationError::InvalidSession {
            field: "sample_rate_override".to_string(),
            reason: "sample rate must be non-zero".to_string(),
        });
    }

    into_result(errors)
}
