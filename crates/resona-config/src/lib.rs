//! Capture configuration for resona measurement sessions.
//!
//! Describes the measurement chain (playback and recording devices, how
//! playback channels are grouped, which interface input each recording
//! channel uses, which microphone calibration applies) and the per-run
//! session settings.
//!
//! # Features
//!
//! - **Capture config**: load and save [`CaptureConfig`] as TOML
//! - **Layouts**: standard surround channel groups
//! - **Validation**: every invariant checked, all failures reported together
//! - **Paths**: platform-specific config and calibration directories
//!
//! # Example
//!
//! ```rust,no_run
//! use resona_config::{CalibrationSource, CaptureConfig, paths};
//!
//! let config = CaptureConfig::new("Scarlett 2i2", 2, "Scarlett 2i2", 1)
//!     .with_calibration(CalibrationSource::Id("umik-1.txt".to_string()));
//! config.save(paths::default_config_path()).unwrap();
//! ```

mod capture;
mod error;
mod session;

/// Platform-specific paths for configuration and calibration files.
pub mod paths;

/// Capture configuration validation.
pub mod validation;

pub use capture::{
    CalibrationSource, CaptureConfig, ChannelGroup, DeviceCapabilities, PlaybackConfig,
    RecordingConfig,
};
pub use error::ConfigError;
pub use paths::{calibration_dir, default_config_path, user_config_dir};
pub use session::{DEFAULT_DURATION_SECS, SessionSettings, SignalType};
pub use validation::{ValidationError, ValidationResult, validate_capture_config, validate_session};
