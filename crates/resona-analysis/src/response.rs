//! Measured frequency response container.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{AnalysisError, Result};

/// A measured frequency response: magnitude in dB and optional phase in degrees,
/// sampled on a strictly increasing frequency grid.
///
/// Construct through [`FrequencyResponse::new`] to have the invariants checked.
/// Deserialized values should be re-checked with [`FrequencyResponse::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponse {
    /// Frequency points in Hz, strictly increasing.
    pub frequencies: Vec<f64>,
    /// Magnitude at each frequency in dB.
    pub magnitudes_db: Vec<f64>,
    /// Phase at each frequency in degrees, wrapped to ±180.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases_deg: Option<Vec<f64>>,
}

impl FrequencyResponse {
    /// Build a response, checking lengths and frequency ordering.
    pub fn new(
        frequencies: Vec<f64>,
        magnitudes_db: Vec<f64>,
        phases_deg: Option<Vec<f64>>,
    ) -> Result<Self> {
        let response = Self {
            frequencies,
            magnitudes_db,
            phases_deg,
        };
        response.validate()?;
        Ok(response)
    }

    /// Check the parallel-array and ordering invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.frequencies.len();
        if self.magnitudes_db.len() != n {
            return Err(AnalysisError::LengthMismatch {
                frequencies: n,
                values: self.magnitudes_db.len(),
            });
        }
        if let Some(phases) = &self.phases_deg
            && phases.len() != n
        {
            return Err(AnalysisError::LengthMismatch {
                frequencies: n,
                values: phases.len(),
            });
        }
        check_strictly_increasing(&self.frequencies)
    }

    /// Number of frequency points.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// True if the response has no points.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Magnitude at `freq_hz`, interpolated in log-frequency and clamped at the ends.
    ///
    /// Returns `None` when there are no frequency or magnitude points.
    pub fn magnitude_at(&self, freq_hz: f64) -> Option<f64> {
        if self.frequencies.is_empty() || self.magnitudes_db.is_empty() {
            return None;
        }
        Some(crate::interp::interpolate_log(
            &self.frequencies,
            &self.magnitudes_db,
            freq_hz,
        ))
    }
}

/// Fails with [`AnalysisError::NotIncreasing`] on the first non-increasing step.
pub(crate) fn check_strictly_increasing(frequencies: &[f64]) -> Result<()> {
    for (i, pair) in frequencies.windows(2).enumerate() {
        // NaN compares as unordered and is rejected as well.
        if pair[1].partial_cmp(&pair[0]) != Some(Ordering::Greater) {
            return Err(AnalysisError::NotIncreasing {
                index: i + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_aligned_arrays() {
        let r = FrequencyResponse::new(
            vec![20.0, 1000.0, 20000.0],
            vec![-3.0, 0.0, -6.0],
            Some(vec![10.0, 0.0, -45.0]),
        )
        .unwrap();
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn new_rejects_short_magnitudes() {
        let err = FrequencyResponse::new(vec![20.0, 40.0], vec![0.0], None).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LengthMismatch {
                frequencies: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn new_rejects_short_phases() {
        let err =
            FrequencyResponse::new(vec![20.0, 40.0], vec![0.0, 0.0], Some(vec![1.0])).unwrap_err();
        assert!(matches!(err, AnalysisError::LengthMismatch { .. }));
    }

    #[test]
    fn new_rejects_repeated_frequency() {
        let err =
            FrequencyResponse::new(vec![20.0, 40.0, 40.0], vec![0.0; 3], None).unwrap_err();
        assert!(matches!(err, AnalysisError::NotIncreasing { index: 2, .. }));
    }

    #[test]
    fn new_rejects_nan_frequency() {
        assert!(FrequencyResponse::new(vec![20.0, f64::NAN], vec![0.0; 2], None).is_err());
    }

    #[test]
    fn magnitude_at_interpolates_in_log_frequency() {
        let r = FrequencyResponse::new(vec![100.0, 10000.0], vec![0.0, 20.0], None).unwrap();
        // 1 kHz is the log-midpoint of 100 Hz and 10 kHz
        assert!((r.magnitude_at(1000.0).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(r.magnitude_at(10.0), Some(0.0));
    }

    #[test]
    fn empty_response_has_no_magnitude() {
        let r = FrequencyResponse::new(vec![], vec![], None).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.magnitude_at(1000.0), None);
    }

    #[test]
    fn unchecked_response_without_magnitudes_has_no_magnitude() {
        // Public fields allow building a response that skipped `new`.
        let r = FrequencyResponse {
            frequencies: vec![100.0, 200.0],
            magnitudes_db: vec![],
            phases_deg: None,
        };
        assert!(r.validate().is_err());
        assert_eq!(r.magnitude_at(150.0), None);
    }

    #[test]
    fn unchecked_short_magnitudes_use_common_prefix() {
        let r = FrequencyResponse {
            frequencies: vec![100.0, 400.0, 1600.0],
            magnitudes_db: vec![0.0, 6.0],
            phases_deg: None,
        };
        assert_eq!(r.magnitude_at(1000.0), Some(6.0));
    }
}
