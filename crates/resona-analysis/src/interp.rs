//! Log-frequency interpolation shared by calibration and resampling.

/// Interpolate `y` at `target` linearly in log10-frequency space.
///
/// `x` must be positive and strictly increasing; only the first
/// `min(x.len(), y.len())` points are used, and with none of them the result
/// is NaN. Targets at or below `x[0]` (including NaN and non-positive values)
/// return `y[0]`; targets at or above the last point return the last value. A
/// target equal to a node returns that node's value exactly.
pub(crate) fn interpolate_log(x: &[f64], y: &[f64], target: f64) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return f64::NAN;
    }

    if target.is_nan() || target <= x[0] {
        return y[0];
    }
    if target >= x[n - 1] {
        return y[n - 1];
    }

    // First index whose frequency is >= target; 1..n-1 after the clamps above.
    let hi = x[..n].partition_point(|&f| f < target);
    if x[hi] == target {
        return y[hi];
    }
    let lo = hi - 1;

    let (f1, f2) = (x[lo].log10(), x[hi].log10());
    let t = (target.log10() - f1) / (f2 - f1);
    y[lo] + t * (y[hi] - y[lo])
}

/// Resample `y` (on grid `x`) onto `targets` with [`interpolate_log`].
///
/// An empty source grid yields an empty vector.
pub(crate) fn resample_log(x: &[f64], y: &[f64], targets: &[f64]) -> Vec<f64> {
    if x.is_empty() || y.is_empty() {
        return Vec::new();
    }
    targets.iter().map(|&t| interpolate_log(x, y, t)).collect()
}
