//! Microphone calibration correction.
//!
//! A calibration curve describes the known deviation of a measurement
//! microphone (or any transducer in the chain) from flat. Correcting a
//! measurement subtracts that deviation, interpolated in log-frequency space:
//!
//! ```text
//! t      = (log10 f - log10 f1) / (log10 f2 - log10 f1)
//! offset = m1 + t * (m2 - m1)
//! out    = magnitude - offset
//! ```
//!
//! Frequencies outside the curve take the nearest endpoint's offset; the curve
//! is never extrapolated.
//!
//! # Example
//!
//! ```rust
//! use resona_analysis::{CalibrationCurve, apply_calibration};
//!
//! let cal = CalibrationCurve::new(vec![20.0, 1000.0, 20000.0], vec![0.0, 3.0, 0.0]).unwrap();
//! let corrected = apply_calibration(Some(&cal), &[1000.0], &[-10.0]);
//! assert_eq!(corrected, vec![-13.0]);
//! ```

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::interp::interpolate_log;
use crate::response::check_strictly_increasing;

/// A frequency-indexed magnitude correction curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    frequencies: Vec<f64>,
    offsets_db: Vec<f64>,
}

impl CalibrationCurve {
    /// Build a curve from parallel arrays.
    ///
    /// Frequencies must be positive, finite and strictly increasing, offsets
    /// finite, and both arrays the same non-zero length.
    pub fn new(frequencies: Vec<f64>, offsets_db: Vec<f64>) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(AnalysisError::InvalidCalibration(
                "curve has no points".to_string(),
            ));
        }
        if frequencies.len() != offsets_db.len() {
            return Err(AnalysisError::LengthMismatch {
                frequencies: frequencies.len(),
                values: offsets_db.len(),
            });
        }
        if let Some(f) = frequencies.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(AnalysisError::InvalidCalibration(format!(
                "frequency {f} is not a positive finite value"
            )));
        }
        if let Some(m) = offsets_db.iter().find(|m| !m.is_finite()) {
            return Err(AnalysisError::InvalidCalibration(format!(
                "offset {m} is not finite"
            )));
        }
        check_strictly_increasing(&frequencies)?;

        Ok(Self {
            frequencies,
            offsets_db,
        })
    }

    /// Parse a calibration text file.
    ///
    /// Accepts the layout used by common measurement microphone vendors: one
    /// point per line, frequency then offset in dB, separated by whitespace,
    /// commas or semicolons. Further columns (e.g. phase) are ignored. Lines
    /// starting with `*`, `#` or `"`, and header lines that do not start with
    /// a number, are skipped. Rows are sorted by frequency and repeated
    /// frequencies keep their first occurrence.
    pub fn parse(text: &str) -> Result<Self> {
        let mut points: Vec<(f64, f64)> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty()
                || line.starts_with('*')
                || line.starts_with('#')
                || line.starts_with('"')
            {
                continue;
            }

            let mut fields = line
                .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .filter(|s| !s.is_empty());

            let Some(freq) = fields.next().and_then(|s| s.parse::<f64>().ok()) else {
                // Column headers such as "Freq(Hz) SPL(dB)"
                continue;
            };
            let offset = fields
                .next()
                .ok_or_else(|| AnalysisError::Parse {
                    line: idx + 1,
                    reason: "missing magnitude column".to_string(),
                })?
                .parse::<f64>()
                .map_err(|e| AnalysisError::Parse {
                    line: idx + 1,
                    reason: format!("invalid magnitude: {e}"),
                })?;

            if !(freq.is_finite() && freq > 0.0) {
                return Err(AnalysisError::Parse {
                    line: idx + 1,
                    reason: format!("frequency {freq} must be positive"),
                });
            }
            points.push((freq, offset));
        }

        if points.is_empty() {
            return Err(AnalysisError::InvalidCalibration(
                "no data rows found".to_string(),
            ));
        }

        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let before = points.len();
        points.dedup_by(|b, a| a.0 == b.0);
        if points.len() != before {
            tracing::warn!(
                dropped = before - points.len(),
                "calibration file has repeated frequencies"
            );
        }

        let (frequencies, offsets_db) = points.into_iter().unzip();
        Self::new(frequencies, offsets_db)
    }

    /// Load and parse a calibration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let curve = Self::parse(&text)?;
        tracing::debug!(
            path = %path.display(),
            points = curve.len(),
            "loaded calibration curve"
        );
        Ok(curve)
    }

    /// Calibration offset at `freq_hz`.
    pub fn offset_at(&self, freq_hz: f64) -> f64 {
        interpolate_log(&self.frequencies, &self.offsets_db, freq_hz)
    }

    /// Subtract the curve from `magnitudes_db` sampled at `frequencies`.
    ///
    /// Returns a new vector the length of `magnitudes_db`. Magnitudes with no
    /// corresponding frequency are copied through unchanged.
    pub fn apply(&self, frequencies: &[f64], magnitudes_db: &[f64]) -> Vec<f64> {
        magnitudes_db
            .iter()
            .enumerate()
            .map(|(i, &m)| match frequencies.get(i) {
                Some(&f) => m - self.offset_at(f),
                None => m,
            })
            .collect()
    }

    /// Calibration frequencies in Hz.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Calibration offsets in dB.
    pub fn offsets_db(&self) -> &[f64] {
        &self.offsets_db
    }

    /// Number of points in the curve.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Always false; a curve has at least one point.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Apply an optional calibration curve.
///
/// With no curve the magnitudes are copied unchanged. Inputs are never mutated.
pub fn apply_calibration(
    curve: Option<&CalibrationCurve>,
    frequencies: &[f64],
    magnitudes_db: &[f64],
) -> Vec<f64> {
    match curve {
        Some(curve) => curve.apply(frequencies, magnitudes_db),
        None => magnitudes_db.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_curve() -> CalibrationCurve {
        CalibrationCurve::new(vec![20.0, 1000.0, 20000.0], vec![0.0, 3.0, 0.0]).unwrap()
    }

    #[test]
    fn correction_at_node_is_exact() {
        let cal = example_curve();
        let out = cal.apply(&[20.0, 1000.0, 20000.0], &[-10.0, -10.0, -10.0]);
        assert_eq!(out, vec![-10.0, -13.0, -10.0]);
    }

    #[test]
    fn clamps_below_and_above() {
        let cal = example_curve();
        assert_eq!(cal.offset_at(5.0), cal.offset_at(20.0));
        assert_eq!(cal.offset_at(40000.0), cal.offset_at(20000.0));
    }

    #[test]
    fn interpolates_in_log_frequency() {
        let cal = CalibrationCurve::new(vec![100.0, 10000.0], vec![0.0, 4.0]).unwrap();
        assert!((cal.offset_at(1000.0) - 2.0).abs() < 1e-9);
        // Linear-frequency interpolation would give ~0.36 dB here instead
        assert!((cal.offset_at(1000.0) - 0.36).abs() > 1.0);
    }

    #[test]
    fn no_calibration_is_a_copy() {
        let mags = vec![1.0, 2.0, 3.0];
        let out = apply_calibration(None, &[10.0, 20.0, 30.0], &mags);
        assert_eq!(out, mags);
    }

    #[test]
    fn output_length_follows_magnitudes() {
        let cal = example_curve();
        let out = cal.apply(&[1000.0], &[-10.0, 5.0]);
        assert_eq!(out, vec![-13.0, 5.0]);

        let out = cal.apply(&[1000.0, 2000.0, 3000.0], &[-10.0]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn new_rejects_invalid_input() {
        assert!(CalibrationCurve::new(vec![], vec![]).is_err());
        assert!(CalibrationCurve::new(vec![20.0], vec![0.0, 1.0]).is_err());
        assert!(CalibrationCurve::new(vec![0.0, 20.0], vec![0.0, 1.0]).is_err());
        assert!(CalibrationCurve::new(vec![20.0, 10.0], vec![0.0, 1.0]).is_err());
        assert!(CalibrationCurve::new(vec![20.0], vec![f64::NAN]).is_err());
    }

    #[test]
    fn parse_vendor_format() {
        let text = r#""Sens Factor =-1.378dB, SERNO: 7023270"
Freq(Hz)  SPL(dB)  Phase
* comment
10.054	-0.4595	-3.2
20.0 -0.1 0
1000,0.0
20000;1.5
"#;
        let cal = CalibrationCurve::parse(text).unwrap();
        assert_eq!(cal.len(), 4);
        assert_eq!(cal.frequencies()[0], 10.054);
        assert_eq!(cal.offsets_db()[3], 1.5);
    }

    #[test]
    fn parse_sorts_and_drops_repeats() {
        let cal = CalibrationCurve::parse("1000 1\n100 2\n1000 3\n").unwrap();
        assert_eq!(cal.frequencies(), &[100.0, 1000.0]);
        assert_eq!(cal.offsets_db(), &[2.0, 1.0]);
    }

    #[test]
    fn parse_reports_line_of_bad_magnitude() {
        let err = CalibrationCurve::parse("# header\n100 1\n200 abc\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 3, .. }));
    }

    #[test]
    fn parse_rejects_empty_file() {
        assert!(matches!(
            CalibrationCurve::parse("# nothing here\n"),
            Err(AnalysisError::InvalidCalibration(_))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = CalibrationCurve::load("/nonexistent/cal.txt").unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
