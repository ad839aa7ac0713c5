//! Fractional-octave smoothing of magnitude and phase responses.
//!
//! For every point with centre frequency `f`, all samples whose frequency lies
//! in `[f * 2^(-1/(2N)), f * 2^(+1/(2N))]` are averaged, where `N` is the
//! octave fraction (3 for third-octave smoothing).
//!
//! - Magnitude is averaged as linear amplitude (`10^(dB/20)`) and converted
//!   back to dB. Averaging dB values directly biases the result toward dips.
//! - Phase is averaged as a circular mean, `atan2(mean sin, mean cos)`, so that
//!   values straddling ±180° average near ±180° and not near 0°.
//!
//! Points whose window holds no usable sample keep their original value.
//!
//! # Example
//!
//! ```rust
//! use resona_analysis::OctaveSmoother;
//!
//! let freqs = [100.0, 110.0, 120.0, 1000.0];
//! let mags = [-6.0, -6.0, -6.0, -6.0];
//! let smoothed = OctaveSmoother::new(3.0).smooth_magnitude(&freqs, &mags);
//! assert!(smoothed.iter().all(|m| (m + 6.0).abs() < 1e-9));
//! ```

use std::ops::Range;

/// Common octave fractions offered to users.
pub const COMMON_FRACTIONS: [f64; 7] = [1.0, 2.0, 3.0, 6.0, 12.0, 24.0, 48.0];

/// Fractional-octave smoother.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveSmoother {
    octave_fraction: f64,
}

impl Default for OctaveSmoother {
    /// Third-octave smoothing.
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl OctaveSmoother {
    /// Create a smoother for `1/octave_fraction` octave windows.
    ///
    /// A non-positive or non-finite fraction makes every call a pass-through.
    pub fn new(octave_fraction: f64) -> Self {
        Self { octave_fraction }
    }

    /// The configured octave fraction.
    pub fn octave_fraction(&self) -> f64 {
        self.octave_fraction
    }

    /// Window half-width in octaves, `1 / (2N)`.
    pub fn half_width_octaves(&self) -> f64 {
        1.0 / (2.0 * self.octave_fraction)
    }

    /// Lower and upper window edges around `center_hz`.
    pub fn window(&self, center_hz: f64) -> (f64, f64) {
        let ratio = 2f64.powf(self.half_width_octaves());
        (center_hz / ratio, center_hz * ratio)
    }

    fn is_usable(&self) -> bool {
        self.octave_fraction.is_finite() && self.octave_fraction > 0.0
    }

    /// Smooth a magnitude curve in dB using linear-amplitude averaging.
    ///
    /// The output has the length of `magnitudes_db`.
    pub fn smooth_magnitude(&self, frequencies: &[f64], magnitudes_db: &[f64]) -> Vec<f64> {
        self.smooth_with(frequencies, magnitudes_db, |window| {
            let (sum, count) = window
                .iter()
                .filter(|m| m.is_finite())
                .fold((0.0, 0usize), |(s, n), &m| (s + db_to_amplitude(m), n + 1));
            if count == 0 {
                return None;
            }
            let mean = sum / count as f64;
            (mean > 0.0).then(|| 20.0 * mean.log10())
        })
    }

    /// Smooth a phase curve in degrees using the circular mean.
    ///
    /// The output is wrapped to `[-180, 180]` and has the length of `phases_deg`.
    pub fn smooth_phase(&self, frequencies: &[f64], phases_deg: &[f64]) -> Vec<f64> {
        self.smooth_with(frequencies, phases_deg, |window| {
            let (sin, cos, count) = window.iter().filter(|p| p.is_finite()).fold(
                (0.0, 0.0, 0usize),
                |(s, c, n), &p| {
                    let rad = p.to_radians();
                    (s + rad.sin(), c + rad.cos(), n + 1)
                },
            );
            if count == 0 {
                return None;
            }
            let n = count as f64;
            Some((sin / n).atan2(cos / n).to_degrees())
        })
    }

    /// Run `reduce` over the window of every point.
    ///
    /// `reduce` sees the values inside one window and returns `None` when it
    /// cannot produce a finite result, in which case the input value is kept.
    fn smooth_with<F>(&self, frequencies: &[f64], values: &[f64], reduce: F) -> Vec<f64>
    where
        F: Fn(&[f64]) -> Option<f64>,
    {
        if !self.is_usable() {
            tracing::warn!(
                octave_fraction = self.octave_fraction,
                "invalid octave fraction, smoothing skipped"
            );
            return values.to_vec();
        }

        let n = frequencies.len().min(values.len());
        let freqs = &frequencies[..n];
        let sorted = freqs.windows(2).all(|w| w[0] < w[1]);

        let mut out = values.to_vec();
        let mut scratch = Vec::new();

        for i in 0..n {
            let center = freqs[i];
            if !(center.is_finite() && center > 0.0) {
                continue;
            }
            let (lo, hi) = self.window(center);

            let smoothed = if sorted {
                reduce(&values[window_range(freqs, lo, hi)])
            } else {
                scratch.clear();
                scratch.extend(
                    freqs
                        .iter()
                        .zip(values)
                        .filter(|&(&f, _)| f >= lo && f <= hi)
                        .map(|(_, &v)| v),
                );
                reduce(&scratch)
            };

            if let Some(v) = smoothed
                && v.is_finite()
            {
                out[i] = v;
            }
        }

        out
    }
}

/// Index range of sorted `frequencies` inside `[lo, hi]`.
fn window_range(frequencies: &[f64], lo: f64, hi: f64) -> Range<usize> {
    let start = frequencies.partition_point(|&f| f < lo);
    let end = frequencies.partition_point(|&f| f <= hi);
    start..end.max(start)
}

/// Convert dB to linear amplitude.
#[inline]
pub fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Convert linear amplitude to dB.
#[inline]
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    20.0 * amplitude.log10()
}

/// Wrap an angle in degrees to `(-180, 180]`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}
