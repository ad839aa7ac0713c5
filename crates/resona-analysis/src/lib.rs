//! Resona Analysis - response post-processing for loudspeaker and room measurements
//!
//! Everything here is a pure function of its inputs: no I/O except the explicit
//! file loaders, no shared state, safe to call from any thread while a capture
//! is running elsewhere.
//!
//! - [`calibration`] - microphone calibration curves and correction
//! - [`smoothing`] - fractional-octave smoothing (linear amplitude, circular phase)
//! - [`normalize`] - reference-band level normalization
//! - [`axis`] - log-frequency / dB / degree chart projection
//! - [`graph`] - render-ready curve sets built from the steps above
//! - [`export`] - FRD text import and export
//!
//! ## Example Pipeline
//!
//! ```rust
//! use resona_analysis::{
//!     CalibrationCurve, ChannelView, FrequencyResponse, GraphData, OctaveSmoother,
//!     PipelineSettings,
//! };
//!
//! let response = FrequencyResponse::new(
//!     vec![100.0, 1000.0, 10000.0],
//!     vec![-12.0, -10.0, -17.0],
//!     None,
//! )
//! .unwrap();
//! let cal = CalibrationCurve::new(vec![20.0, 1000.0, 20000.0], vec![0.0, 3.0, 0.0]).unwrap();
//!
//! let settings = PipelineSettings {
//!     calibration: Some(cal),
//!     smoothing: Some(OctaveSmoother::new(6.0)),
//!     normalize: true,
//!     show_phase: false,
//! };
//! let graph = GraphData::single(&settings, &response);
//! let traces = graph.view(ChannelView::Combined).unwrap();
//! assert_eq!(traces.magnitude.raw.len(), 3);
//! ```

pub mod axis;
pub mod calibration;
pub mod error;
pub mod export;
pub mod graph;
mod interp;
pub mod normalize;
pub mod response;
pub mod smoothing;

pub use axis::{AxisProjector, LinearAxis, LogAxis, MagnitudeDomain, PlotRect, ValueAxis};
pub use calibration::{CalibrationCurve, apply_calibration};
pub use error::{AnalysisError, Result};
pub use export::{export_frd, import_frd, parse_frd, to_frd_string};
pub use graph::{ChannelTraces, ChannelView, GraphData, PipelineSettings, Trace};
pub use normalize::{Normalized, SpectrumNormalizer, normalize};
pub use response::FrequencyResponse;
pub use smoothing::OctaveSmoother;
