//! Measurement backend abstraction.
//!
//! A [`MeasurementBackend`] plays an excitation signal on one playback channel,
//! records it on one input channel, and returns the analysed response. The
//! orchestrator only sequences these calls; signal generation, device I/O and
//! deconvolution live behind the trait.
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │  ChannelRecordingOrchestrator    │
//! │  (sequencing, state, events)     │
//! └──────────────┬───────────────────┘
//!                │ MeasurementRequest
//!                ▼
//! ┌──────────────────────────────────┐
//! │     MeasurementBackend trait     │
//! └──────────────┬───────────────────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ReplayBackend│  │ hardware    │
//! │ (FRD files) │  │ backends    │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Progress is reported through a boxed callback so the trait stays usable
//! with any closure type.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use resona_analysis::FrequencyResponse;
use resona_config::SignalType;

use crate::error::BackendError;

/// Progress callback, called with completion in `[0, 1]`.
pub type ProgressCallback = Box<dyn FnMut(f32) + Send>;

/// Everything a backend needs to capture one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRequest {
    /// Output device name.
    pub playback_device: String,
    /// Input device name.
    pub recording_device: String,
    /// Playback channel the signal is sent to.
    pub source_channel: u16,
    /// Physical input channel the microphone is on.
    pub destination_channel: u16,
    /// Excitation signal.
    pub signal: SignalType,
    /// Excitation length.
    pub duration: Duration,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Where the backend may write its capture artifacts.
    pub output_path: PathBuf,
}

/// What a backend returns for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredChannel {
    /// Analysed response.
    pub response: FrequencyResponse,
    /// Raw recorded samples, if the backend kept them.
    pub samples: Option<Vec<f32>>,
}

/// Plays, records and analyses one channel at a time.
pub trait MeasurementBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Capture one channel.
    ///
    /// Called for one channel at a time. Must not return before the signal
    /// has finished playing.
    fn measure(
        &self,
        request: MeasurementRequest,
        progress: ProgressCallback,
    ) -> impl Future<Output = Result<MeasuredChannel, BackendError>> + Send;
}
