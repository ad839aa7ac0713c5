//! Per-run measurement settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Excitation signal played on each channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalType {
    /// Logarithmic sine sweep.
    #[default]
    Sweep,
    /// White noise.
    #[serde(alias = "white")]
    WhiteNoise,
    /// Pink noise.
    #[serde(alias = "pink")]
    PinkNoise,
}

impl SignalType {
    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Sweep => "sweep",
            SignalType::WhiteNoise => "white-noise",
            SignalType::PinkNoise => "pink-noise",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sweep" => Ok(SignalType::Sweep),
            "white" | "white-noise" | "white_noise" | "whitenoise" => Ok(SignalType::WhiteNoise),
            "pink" | "pink-noise" | "pink_noise" | "pinknoise" => Ok(SignalType::PinkNoise),
            other => Err(format!(
                "unknown signal type '{other}' (expected sweep, white-noise or pink-noise)"
            )),
        }
    }
}

/// Default excitation length in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 5.0;

/// Settings for one measurement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Excitation signal.
    #[serde(default)]
    pub signal: SignalType,
    /// Excitation length in seconds.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,
    /// Forces a sample rate instead of the device-reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate_override: Option<u32>,
    /// Directory receiving per-channel capture files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_duration_secs() -> f64 {
    DEFAULT_DURATION_SECS
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("resona")
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            signal: SignalType::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            sample_rate_override: None,
            output_dir: default_output_dir(),
        }
    }
}

impl SessionSettings {
    /// Excitation length. Invalid durations map to zero.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::ZERO)
    }

    /// Set the signal.
    pub fn with_signal(mut self, signal: SignalType) -> Self {
        self.signal = signal;
        self
    }

    /// Set the excitation length in seconds.
    pub fn with_duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Force a sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate_override = Some(sample_rate);
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_aliases() {
        assert_eq!("sweep".parse::<SignalType>(), Ok(SignalType::Sweep));
        assert_eq!("White_Noise".parse::<SignalType>(), Ok(SignalType::WhiteNoise));
        assert_eq!("pinknoise".parse::<SignalType>(), Ok(SignalType::PinkNoise));
        assert_eq!("white".parse::<SignalType>(), Ok(SignalType::WhiteNoise));
        assert_eq!(" Pink ".parse::<SignalType>(), Ok(SignalType::PinkNoise));
        assert!("chirp".parse::<SignalType>().is_err());
        assert!("noise".parse::<SignalType>().is_err());
    }

    #[test]
    fn signal_display_round_trips() {
        for s in [SignalType::Sweep, SignalType::WhiteNoise, SignalType::PinkNoise] {
            assert_eq!(s.to_string().parse::<SignalType>(), Ok(s));
        }
    }

    #[test]
    fn defaults() {
        let s = SessionSettings::default();
        assert_eq!(s.signal, SignalType::Sweep);
        assert_eq!(s.duration(), Duration::from_secs(5));
        assert_eq!(s.sample_rate_override, None);
    }

    #[test]
    fn invalid_duration_is_zero() {
        let s = SessionSettings::default().with_duration_secs(-1.0);
        assert_eq!(s.duration(), Duration::ZERO);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let s: SessionSettings = toml::from_str("signal = \"pink-noise\"").unwrap();
        assert_eq!(s.signal, SignalType::PinkNoise);
        assert_eq!(s.duration_secs, DEFAULT_DURATION_SECS);
    }

    #[test]
    fn short_signal_names_deserialize() {
        let s: SessionSettings = toml::from_str("signal = \"white\"").unwrap();
        assert_eq!(s.signal, SignalType::WhiteNoise);
        let s: SessionSettings = toml::from_str("signal = \"pink\"").unwrap();
        assert_eq!(s.signal, SignalType::PinkNoise);
    }
}
