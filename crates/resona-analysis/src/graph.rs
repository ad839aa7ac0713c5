//! Render-ready curve sets.
//!
//! [`GraphData`] is the value handed to a chart for one render pass. It is
//! rebuilt from measured responses and the current [`PipelineSettings`]
//! whenever a display parameter changes (smoothing, calibration, phase
//! visibility). Each source response is run through the same pipeline:
//!
//! ```text
//! raw ──► calibrate ──► normalize ─────────────────► Trace::raw
//!              │
//!              └──► smooth ──► normalize ──────────► Trace::smoothed
//! ```
//!
//! Raw and smoothed curves are normalized independently from their own
//! calibrated source, so the smoothed curve is never a smoothed copy of an
//! already normalized raw curve.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::calibration::{CalibrationCurve, apply_calibration};
use crate::interp::resample_log;
use crate::normalize::SpectrumNormalizer;
use crate::response::FrequencyResponse;
use crate::smoothing::{OctaveSmoother, amplitude_to_db, db_to_amplitude};

/// Which channel a set of curves belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelView {
    /// A single measurement or an already combined response.
    Combined,
    /// Left channel.
    Left,
    /// Right channel.
    Right,
    /// Average of the other views.
    Average,
}

impl ChannelView {
    /// Legend label.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelView::Combined => "Combined",
            ChannelView::Left => "Left",
            ChannelView::Right => "Right",
            ChannelView::Average => "Average",
        }
    }
}

impl fmt::Display for ChannelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One quantity as a raw curve plus an optional smoothed curve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trace {
    /// Unsmoothed values.
    pub raw: Vec<f64>,
    /// Smoothed values, present when smoothing is enabled.
    pub smoothed: Option<Vec<f64>>,
}

/// Magnitude and phase traces of one channel view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelTraces {
    /// Magnitude in dB.
    pub magnitude: Trace,
    /// Phase in degrees, present when phase display is on and the source had phase.
    pub phase: Option<Trace>,
}

/// Display parameters that drive a pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Correction subtracted from every magnitude curve.
    pub calibration: Option<CalibrationCurve>,
    /// Smoother for the `smoothed` traces; `None` leaves them empty.
    pub smoothing: Option<OctaveSmoother>,
    /// Whether to subtract the reference-band mean.
    pub normalize: bool,
    /// Whether to carry phase traces.
    pub show_phase: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            calibration: None,
            smoothing: Some(OctaveSmoother::default()),
            normalize: true,
            show_phase: false,
        }
    }
}

impl PipelineSettings {
    /// Run the pipeline over one response.
    pub fn process(&self, response: &FrequencyResponse) -> ChannelTraces {
        let freqs = &response.frequencies;
        let normalizer = SpectrumNormalizer::default();
        let finish = |mags: Vec<f64>| {
            if self.normalize {
                normalizer.normalize(freqs, &mags).magnitudes_db
            } else {
                mags
            }
        };

        let calibrated =
            apply_calibration(self.calibration.as_ref(), freqs, &response.magnitudes_db);
        let smoothed = self
            .smoothing
            .map(|s| finish(s.smooth_magnitude(freqs, &calibrated)));
        let magnitude = Trace {
            raw: finish(calibrated),
            smoothed,
        };

        let phase = match (&response.phases_deg, self.show_phase) {
            (Some(phases), true) => Some(Trace {
                raw: phases.clone(),
                smoothed: self.smoothing.map(|s| s.smooth_phase(freqs, phases)),
            }),
            _ => None,
        };

        ChannelTraces { magnitude, phase }
    }
}

/// Curves for one render pass, all sampled on a shared frequency grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphData {
    frequencies: Vec<f64>,
    views: BTreeMap<ChannelView, ChannelTraces>,
    visible: BTreeSet<ChannelView>,
    output_channel: Option<String>,
}

impl GraphData {
    /// Build curves from `(view, response)` sources.
    ///
    /// The first non-empty source defines the frequency grid; the others are
    /// resampled onto it in log frequency before processing. Empty sources are
    /// skipped. A view given twice keeps the last source. Every built view
    /// starts visible.
    pub fn build<'a>(
        settings: &PipelineSettings,
        sources: impl IntoIterator<Item = (ChannelView, &'a FrequencyResponse)>,
    ) -> Self {
        let mut data = GraphData::default();

        for (view, response) in sources {
            if response.is_empty() {
                tracing::warn!(view = %view, "skipping empty response");
                continue;
            }
            let traces = if data.frequencies.is_empty() {
                data.frequencies = response.frequencies.clone();
                settings.process(response)
            } else if data.frequencies == response.frequencies {
                settings.process(response)
            } else {
                settings.process(&resample_response(response, &data.frequencies))
            };
            data.views.insert(view, traces);
            data.visible.insert(view);
        }

        data
    }

    /// Build curves for a single response shown as [`ChannelView::Combined`].
    pub fn single(settings: &PipelineSettings, response: &FrequencyResponse) -> Self {
        Self::build(settings, [(ChannelView::Combined, response)])
    }

    /// Add an [`ChannelView::Average`] view over every other view.
    ///
    /// Magnitudes are averaged as linear amplitude and phases as a circular
    /// mean. A smoothed or phase trace is averaged only when every view has
    /// one. Fewer than two views leaves the data unchanged.
    pub fn with_average(mut self) -> Self {
        let members: Vec<&ChannelTraces> = self
            .views
            .iter()
            .filter(|(view, _)| **view != ChannelView::Average)
            .map(|(_, traces)| traces)
            .collect();
        if members.len() < 2 {
            return self;
        }

        let magnitude = Trace {
            raw: average_columns(members.iter().map(|t| t.magnitude.raw.as_slice()), mean_db),
            smoothed: collect_all(members.iter().map(|t| t.magnitude.smoothed.as_deref()))
                .map(|curves| average_columns(curves.into_iter(), mean_db)),
        };

        let phase = collect_all(members.iter().map(|t| t.phase.as_ref())).map(|phases| Trace {
            raw: average_columns(phases.iter().map(|p| p.raw.as_slice()), circular_mean_deg),
            smoothed: collect_all(phases.iter().map(|p| p.smoothed.as_deref()))
                .map(|curves| average_columns(curves.into_iter(), circular_mean_deg)),
        });

        self.views
            .insert(ChannelView::Average, ChannelTraces { magnitude, phase });
        self.visible.insert(ChannelView::Average);
        self
    }

    /// Tag the data with the output channel name used in legends.
    pub fn with_output_channel(mut self, name: impl Into<String>) -> Self {
        self.output_channel = Some(name.into());
        self
    }

    /// Shared frequency grid in Hz.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Output channel legend tag.
    pub fn output_channel(&self) -> Option<&str> {
        self.output_channel.as_deref()
    }

    /// Traces of one view, visible or not.
    pub fn view(&self, view: ChannelView) -> Option<&ChannelTraces> {
        self.views.get(&view)
    }

    /// All built views in display order.
    pub fn views(&self) -> impl Iterator<Item = (ChannelView, &ChannelTraces)> {
        self.views.iter().map(|(v, t)| (*v, t))
    }

    /// Show or hide a view. Hiding a view that was never built is a no-op.
    pub fn set_visible(&mut self, view: ChannelView, visible: bool) {
        if visible && self.views.contains_key(&view) {
            self.visible.insert(view);
        } else {
            self.visible.remove(&view);
        }
    }

    /// Whether `view` is built and shown.
    pub fn is_visible(&self, view: ChannelView) -> bool {
        self.visible.contains(&view)
    }

    /// Visible views in display order.
    pub fn visible_views(&self) -> impl Iterator<Item = (ChannelView, &ChannelTraces)> {
        self.views
            .iter()
            .filter(|(v, _)| self.visible.contains(*v))
            .map(|(v, t)| (*v, t))
    }

    /// Legend text for a view, e.g. `"Left (Front L)"`.
    pub fn legend_label(&self, view: ChannelView) -> String {
        match &self.output_channel {
            Some(name) => format!("{view} ({name})"),
            None => view.to_string(),
        }
    }

    /// Every magnitude value of the visible views, for data-driven axes.
    pub fn visible_magnitudes(&self) -> impl Iterator<Item = &f64> {
        self.visible_views().flat_map(|(_, t)| {
            t.magnitude
                .raw
                .iter()
                .chain(t.magnitude.smoothed.iter().flatten())
        })
    }
}

/// Resample a response onto `grid`, interpolating phase through sin/cos.
fn resample_response(response: &FrequencyResponse, grid: &[f64]) -> FrequencyResponse {
    let src = &response.frequencies;
    let phases_deg = response.phases_deg.as_ref().map(|phases| {
        let (sin, cos): (Vec<f64>, Vec<f64>) = phases
            .iter()
            .map(|p| {
                let rad = p.to_radians();
                (rad.sin(), rad.cos())
            })
            .unzip();
        resample_log(src, &sin, grid)
            .into_iter()
            .zip(resample_log(src, &cos, grid))
            .map(|(s, c)| s.atan2(c).to_degrees())
            .collect()
    });

    FrequencyResponse {
        frequencies: grid.to_vec(),
        magnitudes_db: resample_log(src, &response.magnitudes_db, grid),
        phases_deg,
    }
}

/// `Some` of every item when none is `None`.
fn collect_all<T>(items: impl Iterator<Item = Option<T>>) -> Option<Vec<T>> {
    items.collect()
}

/// Column-wise reduction over curves of possibly different lengths.
///
/// The result is as long as the shortest curve.
fn average_columns<'a>(
    curves: impl Iterator<Item = &'a [f64]>,
    reduce: fn(&[f64]) -> f64,
) -> Vec<f64> {
    let curves: Vec<&[f64]> = curves.collect();
    let len = curves.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut column = Vec::with_capacity(curves.len());
    (0..len)
        .map(|i| {
            column.clear();
            column.extend(curves.iter().map(|c| c[i]));
            reduce(&column)
        })
        .collect()
}

fn mean_db(values: &[f64]) -> f64 {
    let mean = values.iter().map(|&v| db_to_amplitude(v)).sum::<f64>() / values.len() as f64;
    amplitude_to_db(mean)
}

fn circular_mean_deg(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let (sin, cos) = values.iter().fold((0.0, 0.0), |(s, c), v| {
        let rad = v.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    (sin / n).atan2(cos / n).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(mags: Vec<f64>) -> FrequencyResponse {
        let freqs = vec![50.0, 100.0, 1000.0, 10000.0, 15000.0];
        FrequencyResponse::new(freqs, mags, None).unwrap()
    }

    fn plain() -> PipelineSettings {
        PipelineSettings {
            calibration: None,
            smoothing: None,
            normalize: false,
            show_phase: false,
        }
    }

    #[test]
    fn plain_settings_pass_magnitudes_through() {
        let r = response(vec![-1.0, -2.0, -3.0, -4.0, -5.0]);
        let g = GraphData::single(&plain(), &r);
        let t = g.view(ChannelView::Combined).unwrap();
        assert_eq!(t.magnitude.raw, r.magnitudes_db);
        assert!(t.magnitude.smoothed.is_none());
        assert!(t.phase.is_none());
        assert_eq!(g.frequencies(), r.frequencies.as_slice());
    }

    #[test]
    fn calibration_then_normalization() {
        let cal =
            CalibrationCurve::new(vec![20.0, 1000.0, 20000.0], vec![0.0, 3.0, 0.0]).unwrap();
        let settings = PipelineSettings {
            calibration: Some(cal),
            normalize: true,
            ..plain()
        };
        let r = FrequencyResponse::new(vec![1000.0], vec![-10.0], None).unwrap();
        let g = GraphData::single(&settings, &r);
        let raw = &g.view(ChannelView::Combined).unwrap().magnitude.raw;
        assert!(raw[0].abs() < 1e-12);
    }

    #[test]
    fn smoothed_trace_normalized_from_its_own_source() {
        let settings = PipelineSettings {
            smoothing: Some(OctaveSmoother::new(3.0)),
            normalize: true,
            ..plain()
        };
        let r = response(vec![-6.0; 5]);
        let g = GraphData::single(&settings, &r);
        let t = g.view(ChannelView::Combined).unwrap();
        for v in t.magnitude.raw.iter().chain(t.magnitude.smoothed.as_ref().unwrap()) {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn phase_follows_show_phase() {
        let r = FrequencyResponse::new(vec![100.0, 200.0], vec![0.0, 0.0], Some(vec![10.0, 20.0]))
            .unwrap();
        let hidden = GraphData::single(&plain(), &r);
        assert!(hidden.view(ChannelView::Combined).unwrap().phase.is_none());

        let shown = GraphData::single(
            &PipelineSettings {
                show_phase: true,
                ..plain()
            },
            &r,
        );
        let phase = shown.view(ChannelView::Combined).unwrap().phase.as_ref().unwrap();
        assert_eq!(phase.raw, vec![10.0, 20.0]);
    }

    #[test]
    fn later_sources_are_resampled_onto_first_grid() {
        let left = FrequencyResponse::new(vec![100.0, 200.0, 400.0], vec![0.0; 3], None).unwrap();
        let right = FrequencyResponse::new(vec![100.0, 400.0], vec![0.0, 6.0], None).unwrap();
        let g = GraphData::build(
            &plain(),
            [(ChannelView::Left, &left), (ChannelView::Right, &right)],
        );
        let r = &g.view(ChannelView::Right).unwrap().magnitude.raw;
        assert_eq!(r.len(), 3);
        assert!((r[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_sources_are_skipped() {
        let empty = FrequencyResponse::new(vec![], vec![], None).unwrap();
        let r = response(vec![0.0; 5]);
        let g = GraphData::build(
            &plain(),
            [(ChannelView::Left, &empty), (ChannelView::Right, &r)],
        );
        assert!(g.view(ChannelView::Left).is_none());
        assert_eq!(g.frequencies().len(), 5);
    }

    #[test]
    fn average_is_linear_amplitude_and_circular() {
        let freqs = vec![100.0, 200.0];
        let left =
            FrequencyResponse::new(freqs.clone(), vec![0.0, 0.0], Some(vec![179.0, 10.0])).unwrap();
        let right =
            FrequencyResponse::new(freqs, vec![-120.0, 0.0], Some(vec![-179.0, 30.0])).unwrap();
        let settings = PipelineSettings {
            show_phase: true,
            ..plain()
        };
        let g = GraphData::build(
            &settings,
            [(ChannelView::Left, &left), (ChannelView::Right, &right)],
        )
        .with_average();

        let avg = g.view(ChannelView::Average).unwrap();
        let expected = 20.0 * ((1.0 + 1e-6) / 2.0f64).log10();
        assert!((avg.magnitude.raw[0] - expected).abs() < 1e-9);
        assert!(avg.magnitude.raw[1].abs() < 1e-9);

        let phase = &avg.phase.as_ref().unwrap().raw;
        assert!(phase[0].abs() > 179.0);
        assert!((phase[1] - 20.0).abs() < 1e-9);
        assert!(g.is_visible(ChannelView::Average));
    }

    #[test]
    fn average_needs_two_views() {
        let r = response(vec![0.0; 5]);
        let g = GraphData::single(&plain(), &r).with_average();
        assert!(g.view(ChannelView::Average).is_none());
    }

    #[test]
    fn visibility_toggles() {
        let r = response(vec![0.0; 5]);
        let mut g = GraphData::build(&plain(), [(ChannelView::Left, &r), (ChannelView::Right, &r)]);
        g.set_visible(ChannelView::Left, false);
        let shown: Vec<_> = g.visible_views().map(|(v, _)| v).collect();
        assert_eq!(shown, vec![ChannelView::Right]);

        g.set_visible(ChannelView::Average, true);
        assert!(!g.is_visible(ChannelView::Average));
    }

    #[test]
    fn legend_uses_output_channel() {
        let r = response(vec![0.0; 5]);
        let g = GraphData::single(&plain(), &r).with_output_channel("Front L");
        assert_eq!(g.output_channel(), Some("Front L"));
        assert_eq!(g.legend_label(ChannelView::Combined), "Combined (Front L)");
    }

    #[test]
    fn visible_magnitudes_feed_dynamic_axis() {
        let r = response(vec![-5.0, 0.0, 1.0, 2.0, 3.0]);
        let g = GraphData::single(&plain(), &r);
        let axis = crate::axis::LinearAxis::from_data(g.visible_magnitudes());
        assert_eq!(axis.bounds(), (-6.0, 4.0));
    }
}
