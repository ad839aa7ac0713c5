//! Error types for analysis operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building or loading analysis inputs.
///
/// The numeric transforms themselves ([`apply_calibration`](crate::apply_calibration),
/// [`OctaveSmoother`](crate::OctaveSmoother), [`normalize`](fn@crate::normalize)) never
/// fail; these errors come from constructors that validate data and from file import.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A calibration curve could not be built.
    #[error("invalid calibration curve: {0}")]
    InvalidCalibration(String),

    /// Parallel arrays have different lengths.
    #[error("length mismatch: {frequencies} frequencies but {values} values")]
    LengthMismatch {
        /// Number of frequency points.
        frequencies: usize,
        /// Number of value points.
        values: usize,
    },

    /// Frequencies are not strictly increasing.
    #[error("frequencies must be strictly increasing (index {index}: {previous} Hz then {current} Hz)")]
    NotIncreasing {
        /// Index of the offending point.
        index: usize,
        /// Frequency before the offending point.
        previous: f64,
        /// The offending frequency.
        current: f64,
    },

    /// No magnitude samples lie inside the normalization reference band.
    #[error("no samples in the {low}-{high} Hz reference band")]
    NormalizationUnavailable {
        /// Lower band edge in Hz.
        low: f64,
        /// Upper band edge in Hz.
        high: f64,
    },

    /// A response or calibration file line could not be parsed.
    #[error("parse error at line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Failed to read or write a file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
