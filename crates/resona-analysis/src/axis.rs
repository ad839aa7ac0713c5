//! Chart axis projection.
//!
//! Every chart panel maps data to the plot through these definitions so that
//! curves, grid lines and draggable handles agree. Each axis has a forward
//! map (value to normalized position in `[0, 1]`) and an inverse map using the
//! same constants.
//!
//! | Axis      | Scale  | Domain                          |
//! |-----------|--------|---------------------------------|
//! | Frequency | log10  | 20 Hz – 20 kHz                  |
//! | Magnitude | linear | -40 – +10 dB, or data-driven    |
//! | Phase     | linear | -180° – +180°                   |

/// Lower edge of the frequency axis in Hz.
pub const FREQ_MIN_HZ: f64 = 20.0;
/// Upper edge of the frequency axis in Hz.
pub const FREQ_MAX_HZ: f64 = 20_000.0;
/// Default lower edge of the magnitude axis in dB.
pub const MAGNITUDE_MIN_DB: f64 = -40.0;
/// Default upper edge of the magnitude axis in dB.
pub const MAGNITUDE_MAX_DB: f64 = 10.0;
/// Lower edge of the phase axis in degrees.
pub const PHASE_MIN_DEG: f64 = -180.0;
/// Upper edge of the phase axis in degrees.
pub const PHASE_MAX_DEG: f64 = 180.0;
/// Padding added on each side of a data-driven magnitude domain.
pub const DYNAMIC_PADDING_DB: f64 = 1.0;

/// Logarithmic frequency axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogAxis {
    min: f64,
    max: f64,
}

impl Default for LogAxis {
    fn default() -> Self {
        Self::frequency()
    }
}

impl LogAxis {
    /// The standard 20 Hz – 20 kHz frequency axis.
    pub fn frequency() -> Self {
        Self {
            min: FREQ_MIN_HZ,
            max: FREQ_MAX_HZ,
        }
    }

    /// Axis bounds.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Normalized position of `value`, clamped to `[0, 1]`.
    pub fn to_position(&self, value: f64) -> f64 {
        if value.is_nan() || value <= self.min {
            return 0.0;
        }
        let (lo, hi) = (self.min.log10(), self.max.log10());
        ((value.log10() - lo) / (hi - lo)).clamp(0.0, 1.0)
    }

    /// Value at normalized `position` (clamped to `[0, 1]`).
    pub fn from_position(&self, position: f64) -> f64 {
        let p = clamp_unit(position);
        let (lo, hi) = (self.min.log10(), self.max.log10());
        10f64.powf(lo + p * (hi - lo))
    }
}

/// Linear axis for dB or degree values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAxis {
    min: f64,
    max: f64,
}

impl LinearAxis {
    /// Axis over `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min <= max, "axis min {min} above max {max}");
        Self { min, max }
    }

    /// The default capture magnitude axis, -40 to +10 dB.
    pub fn magnitude() -> Self {
        Self::new(MAGNITUDE_MIN_DB, MAGNITUDE_MAX_DB)
    }

    /// The phase axis, -180 to +180 degrees.
    pub fn phase() -> Self {
        Self::new(PHASE_MIN_DEG, PHASE_MAX_DEG)
    }

    /// Axis spanning `[min - 1, max + 1]` of the finite `values`.
    ///
    /// Falls back to [`LinearAxis::magnitude`] when no finite value is given.
    pub fn from_data<'a>(values: impl IntoIterator<Item = &'a f64>) -> Self {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if lo > hi {
            return Self::magnitude();
        }
        Self::new(lo - DYNAMIC_PADDING_DB, hi + DYNAMIC_PADDING_DB)
    }

    /// Axis bounds.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Normalized position of `value`. Not clamped; values outside the domain
    /// land outside `[0, 1]`.
    pub fn to_position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.5;
        }
        (value - self.min) / span
    }

    /// Value at normalized `position`.
    pub fn from_position(&self, position: f64) -> f64 {
        self.min + position * (self.max - self.min)
    }
}

/// How the magnitude domain is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MagnitudeDomain {
    /// Fixed `-40..+10` dB, used by capture displays.
    #[default]
    Fixed,
    /// `[min - 1, max + 1]` of the plotted data, used by filter response views.
    Dynamic,
}

/// Pixel rectangle of a plot area. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PlotRect {
    /// Create a plot rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The vertical quantity being plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueAxis {
    /// Magnitude in dB.
    Magnitude,
    /// Phase in degrees.
    Phase,
}

/// Axis set shared by every chart surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisProjector {
    frequency: LogAxis,
    magnitude: LinearAxis,
    phase: LinearAxis,
}

impl Default for AxisProjector {
    fn default() -> Self {
        Self {
            frequency: LogAxis::frequency(),
            magnitude: LinearAxis::magnitude(),
            phase: LinearAxis::phase(),
        }
    }
}

impl AxisProjector {
    /// Projector with the fixed capture-display domains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projector whose magnitude domain follows `domain`, using `magnitudes`
    /// when the domain is dynamic.
    pub fn with_domain<'a>(
        domain: MagnitudeDomain,
        magnitudes: impl IntoIterator<Item = &'a f64>,
    ) -> Self {
        let magnitude = match domain {
            MagnitudeDomain::Fixed => LinearAxis::magnitude(),
            MagnitudeDomain::Dynamic => LinearAxis::from_data(magnitudes),
        };
        Self {
            magnitude,
            ..Self::default()
        }
    }

    /// The frequency axis.
    pub fn frequency_axis(&self) -> &LogAxis {
        &self.frequency
    }

    /// The magnitude axis.
    pub fn magnitude_axis(&self) -> &LinearAxis {
        &self.magnitude
    }

    /// The phase axis.
    pub fn phase_axis(&self) -> &LinearAxis {
        &self.phase
    }

    fn value_axis(&self, axis: ValueAxis) -> &LinearAxis {
        match axis {
            ValueAxis::Magnitude => &self.magnitude,
            ValueAxis::Phase => &self.phase,
        }
    }

    /// Normalized x position of a frequency.
    pub fn frequency_to_position(&self, freq_hz: f64) -> f64 {
        self.frequency.to_position(freq_hz)
    }

    /// Frequency at a normalized x position.
    pub fn position_to_frequency(&self, position: f64) -> f64 {
        self.frequency.from_position(position)
    }

    /// Normalized y position of a magnitude (0 = bottom of domain).
    pub fn magnitude_to_position(&self, db: f64) -> f64 {
        self.magnitude.to_position(db)
    }

    /// Magnitude at a normalized y position.
    pub fn position_to_magnitude(&self, position: f64) -> f64 {
        self.magnitude.from_position(position)
    }

    /// Normalized y position of a phase (0 = -180°).
    pub fn phase_to_position(&self, deg: f64) -> f64 {
        self.phase.to_position(deg)
    }

    /// Phase at a normalized y position.
    pub fn position_to_phase(&self, position: f64) -> f64 {
        self.phase.from_position(position)
    }

    /// Pixel coordinates of a `(frequency, value)` point inside `rect`.
    pub fn project(&self, rect: &PlotRect, axis: ValueAxis, freq_hz: f64, value: f64) -> (f64, f64) {
        let px = self.frequency.to_position(freq_hz);
        let py = self.value_axis(axis).to_position(value);
        (rect.x + px * rect.width, rect.y + (1.0 - py) * rect.height)
    }

    /// `(frequency, value)` under pixel coordinates inside `rect`.
    pub fn unproject(&self, rect: &PlotRect, axis: ValueAxis, x: f64, y: f64) -> (f64, f64) {
        let px = if rect.width == 0.0 {
            0.0
        } else {
            (x - rect.x) / rect.width
        };
        let py = if rect.height == 0.0 {
            0.0
        } else {
            1.0 - (y - rect.y) / rect.height
        };
        (
            self.frequency.from_position(px),
            self.value_axis(axis).from_position(py),
        )
    }

    /// Grid frequencies at 1-2-5 steps per decade inside the axis domain.
    pub fn frequency_grid(&self) -> Vec<f64> {
        let (lo, hi) = self.frequency.bounds();
        let mut lines = Vec::new();
        let mut decade = 10f64.powf(lo.log10().floor());
        while decade <= hi {
            for step in [1.0, 2.0, 5.0] {
                let f = decade * step;
                if f >= lo && f <= hi {
                    lines.push(f);
                }
            }
            decade *= 10.0;
        }
        lines
    }
}

fn clamp_unit(position: f64) -> f64 {
    if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_endpoints() {
        let p = AxisProjector::new();
        assert_eq!(p.frequency_to_position(20.0), 0.0);
        assert!((p.frequency_to_position(20000.0) - 1.0).abs() < 1e-12);
        assert!((p.frequency_to_position(632.455532) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn frequency_clamps_outside_domain() {
        let p = AxisProjector::new();
        assert_eq!(p.frequency_to_position(5.0), 0.0);
        assert_eq!(p.frequency_to_position(0.0), 0.0);
        assert_eq!(p.frequency_to_position(48000.0), 1.0);
        assert_eq!(p.frequency_to_position(f64::NAN), 0.0);
    }

    #[test]
    fn frequency_inverse() {
        let p = AxisProjector::new();
        for f in [20.0, 63.0, 1000.0, 12345.0, 20000.0] {
            let back = p.position_to_frequency(p.frequency_to_position(f));
            assert!((back - f).abs() / f < 1e-9, "{f} -> {back}");
        }
    }

    #[test]
    fn magnitude_fixed_domain() {
        let p = AxisProjector::new();
        assert_eq!(p.magnitude_to_position(-40.0), 0.0);
        assert_eq!(p.magnitude_to_position(10.0), 1.0);
        assert_eq!(p.magnitude_to_position(-15.0), 0.5);
        assert_eq!(p.position_to_magnitude(0.5), -15.0);
    }

    #[test]
    fn dynamic_domain_pads_by_one_db() {
        let data = [-3.0, 2.0, f64::NAN, 6.5];
        let p = AxisProjector::with_domain(MagnitudeDomain::Dynamic, &data);
        assert_eq!(p.magnitude_axis().bounds(), (-4.0, 7.5));
    }

    #[test]
    fn dynamic_domain_without_data_falls_back() {
        let p = AxisProjector::with_domain(MagnitudeDomain::Dynamic, &[]);
        assert_eq!(p.magnitude_axis().bounds(), (MAGNITUDE_MIN_DB, MAGNITUDE_MAX_DB));
    }

    #[test]
    fn dynamic_domain_of_constant_data_has_span() {
        let axis = LinearAxis::from_data(&[3.0, 3.0]);
        assert_eq!(axis.bounds(), (2.0, 4.0));
        assert_eq!(axis.to_position(3.0), 0.5);
    }

    #[test]
    fn phase_domain() {
        let p = AxisProjector::new();
        assert_eq!(p.phase_to_position(-180.0), 0.0);
        assert_eq!(p.phase_to_position(0.0), 0.5);
        assert_eq!(p.phase_to_position(180.0), 1.0);
        assert_eq!(p.position_to_phase(0.25), -90.0);
    }

    #[test]
    fn degenerate_linear_axis_is_centred() {
        assert_eq!(LinearAxis::new(1.0, 1.0).to_position(5.0), 0.5);
    }

    #[test]
    fn project_and_unproject_in_pixels() {
        let p = AxisProjector::new();
        let rect = PlotRect::new(10.0, 20.0, 800.0, 400.0);

        let (x, y) = p.project(&rect, ValueAxis::Magnitude, 20.0, 10.0);
        assert_eq!((x, y), (10.0, 20.0));

        let (x, y) = p.project(&rect, ValueAxis::Phase, 20000.0, -180.0);
        assert!((x - 810.0).abs() < 1e-9);
        assert!((y - 420.0).abs() < 1e-9);

        let (f, db) = p.unproject(&rect, ValueAxis::Magnitude, 410.0, 220.0);
        assert!((f - 632.455532).abs() < 1e-3);
        assert!((db + 15.0).abs() < 1e-9);
    }

    #[test]
    fn grid_lines_cover_domain() {
        let grid = AxisProjector::new().frequency_grid();
        assert_eq!(grid.first(), Some(&20.0));
        assert_eq!(grid.last(), Some(&20000.0));
        assert!(grid.contains(&1000.0));
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }
}
