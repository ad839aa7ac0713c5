//! Reference-band normalization.
//!
//! Curves captured at different gains are made comparable by subtracting the
//! mean level inside a reference band (100 Hz to 10 kHz by default) from every
//! point. Normalization runs after calibration and is applied separately to
//! each curve variant (raw, smoothed) from its own calibrated source.

use crate::error::{AnalysisError, Result};

/// Lower edge of the default reference band in Hz.
pub const REFERENCE_BAND_LOW_HZ: f64 = 100.0;
/// Upper edge of the default reference band in Hz.
pub const REFERENCE_BAND_HIGH_HZ: f64 = 10_000.0;

/// Outcome of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The normalized (or, when unavailable, copied) magnitudes.
    pub magnitudes_db: Vec<f64>,
    /// Mean level that was subtracted, `None` if the band held no samples.
    pub reference_level_db: Option<f64>,
}

/// Subtracts a reference-band mean from magnitude curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumNormalizer {
    low_hz: f64,
    high_hz: f64,
}

impl Default for SpectrumNormalizer {
    fn default() -> Self {
        Self::new(REFERENCE_BAND_LOW_HZ, REFERENCE_BAND_HIGH_HZ)
    }
}

impl SpectrumNormalizer {
    /// Create a normalizer for the inclusive band `[low_hz, high_hz]`.
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// The inclusive reference band.
    pub fn band(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }

    /// Mean of the finite magnitudes whose frequency lies in the band.
    pub fn reference_level(&self, frequencies: &[f64], magnitudes_db: &[f64]) -> Option<f64> {
        let (sum, count) = frequencies
            .iter()
            .zip(magnitudes_db)
            .filter(|&(&f, &m)| f >= self.low_hz && f <= self.high_hz && m.is_finite())
            .fold((0.0, 0usize), |(s, n), (_, &m)| (s + m, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Normalize, failing when the band is empty.
    pub fn try_normalize(&self, frequencies: &[f64], magnitudes_db: &[f64]) -> Result<Vec<f64>> {
        let level = self
            .reference_level(frequencies, magnitudes_db)
            .ok_or(AnalysisError::NormalizationUnavailable {
                low: self.low_hz,
                high: self.high_hz,
            })?;
        Ok(magnitudes_db.iter().map(|m| m - level).collect())
    }

    /// Normalize, degrading to an unmodified copy when the band is empty.
    pub fn normalize(&self, frequencies: &[f64], magnitudes_db: &[f64]) -> Normalized {
        match self.reference_level(frequencies, magnitudes_db) {
            Some(level) => Normalized {
                magnitudes_db: magnitudes_db.iter().map(|m| m - level).collect(),
                reference_level_db: Some(level),
            },
            None => {
                tracing::warn!(
                    low_hz = self.low_hz,
                    high_hz = self.high_hz,
                    points = magnitudes_db.len(),
                    "no samples in reference band, curve left unnormalized"
                );
                Normalized {
                    magnitudes_db: magnitudes_db.to_vec(),
                    reference_level_db: None,
                }
            }
        }
    }
}

/// Normalize against the default 100 Hz - 10 kHz band.
pub fn normalize(frequencies: &[f64], magnitudes_db: &[f64]) -> Normalized {
    SpectrumNormalizer::default().normalize(frequencies, magnitudes_db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_band_mean_everywhere() {
        let freqs = [50.0, 100.0, 1000.0, 10000.0, 15000.0];
        let mags = [-20.0, -12.0, -13.0, -14.0, 0.0];
        let out = normalize(&freqs, &mags);
        assert_eq!(out.reference_level_db, Some(-13.0));
        assert_eq!(out.magnitudes_db, vec![-7.0, 1.0, 0.0, -1.0, 13.0]);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let n = SpectrumNormalizer::default();
        assert_eq!(n.reference_level(&[100.0], &[4.0]), Some(4.0));
        assert_eq!(n.reference_level(&[10000.0], &[4.0]), Some(4.0));
        assert_eq!(n.reference_level(&[99.999, 10000.001], &[4.0, 4.0]), None);
    }

    #[test]
    fn empty_band_returns_copy() {
        let freqs = [20.0, 50.0, 15000.0];
        let mags = [1.0, 2.0, 3.0];
        let out = normalize(&freqs, &mags);
        assert_eq!(out.reference_level_db, None);
        assert_eq!(out.magnitudes_db, mags.to_vec());
    }

    #[test]
    fn try_normalize_reports_unavailable() {
        let err = SpectrumNormalizer::default()
            .try_normalize(&[20.0], &[0.0])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NormalizationUnavailable { .. }));
    }

    #[test]
    fn non_finite_band_values_are_ignored() {
        let out = normalize(&[200.0, 300.0], &[f64::NEG_INFINITY, -6.0]);
        assert_eq!(out.reference_level_db, Some(-6.0));
        assert_eq!(out.magnitudes_db[1], 0.0);
    }

    #[test]
    fn empty_input() {
        let out = normalize(&[], &[]);
        assert!(out.magnitudes_db.is_empty());
        assert_eq!(out.reference_level_db, None);
    }
}
