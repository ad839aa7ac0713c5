//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use resona_analysis::{CalibrationCurve, FrequencyResponse};
use resona_config::{CaptureConfig, calibration_dir, default_config_path};
use std::path::{Path, PathBuf};

/// Octave-band centres used for level summaries.
pub const OCTAVE_CENTERS_HZ: [f64; 10] = [
    31.5, 63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Config path given on the command line, or the user default.
pub fn config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(default_config_path)
}

/// Load and validate a capture configuration.
pub fn load_config(path: &Path) -> anyhow::Result<CaptureConfig> {
    match CaptureConfig::load(path) {
        Ok(config) => Ok(config),
        Err(e) if e.is_not_found() => anyhow::bail!(
            "No capture config at '{}'. Use 'resona config init' to create one.",
            path.display()
        ),
        Err(e) => Err(e.into()),
    }
}

/// Load the microphone calibration a configuration refers to, if any.
///
/// Identifiers resolve against the user calibration directory.
pub fn config_calibration(config: &CaptureConfig) -> anyhow::Result<Option<CalibrationCurve>> {
    let Some(source) = &config.microphone_calibration else {
        return Ok(None);
    };
    let path = source.resolve(&calibration_dir());
    let curve = CalibrationCurve::load(&path)
        .with_context(|| format!("Cannot load calibration '{}'", path.display()))?;
    Ok(Some(curve))
}

/// Sample a curve at each octave centre inside its range.
pub fn octave_levels(frequencies: &[f64], magnitudes_db: &[f64]) -> Vec<(f64, f64)> {
    let (Some(&lo), Some(&hi)) = (frequencies.first(), frequencies.last()) else {
        return Vec::new();
    };
    let Ok(curve) = FrequencyResponse::new(frequencies.to_vec(), magnitudes_db.to_vec(), None)
    else {
        return Vec::new();
    };
    OCTAVE_CENTERS_HZ
        .iter()
        .filter(|&&f| f >= lo && f <= hi)
        .filter_map(|&f| Some((f, curve.magnitude_at(f)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_levels_stay_in_range() {
        let levels = octave_levels(&[100.0, 1000.0, 5000.0], &[-6.0, 0.0, -3.0]);
        let freqs: Vec<f64> = levels.iter().map(|(f, _)| *f).collect();
        assert_eq!(freqs, [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0]);
        assert_eq!(levels[3].1, 0.0);
    }

    #[test]
    fn octave_levels_of_empty_curve() {
        assert!(octave_levels(&[], &[]).is_empty());
    }
}
