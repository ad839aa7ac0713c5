//! Resona Capture - sequential per-channel measurement sessions
//!
//! Drives a [`MeasurementBackend`] over every playback channel of a setup, one
//! channel at a time, and keeps the per-channel results:
//!
//! - [`orchestrator`] - sequencing, cancellation, per-channel state machine
//! - [`backend`] - the seam to whatever plays and records audio
//! - [`replay`] - a backend that replays stored FRD files
//! - [`events`] - broadcast session events for presentation layers
//! - [`archive`] - save and reload a session's results
//!
//! ## Example
//!
//! ```rust,no_run
//! use resona_capture::{ChannelRecordingOrchestrator, ReplayBackend, SequenceOutcome};
//! use resona_config::{CaptureConfig, DeviceCapabilities, SessionSettings};
//!
//! # async fn run() -> resona_capture::Result<()> {
//! let config = CaptureConfig::new("Out", 2, "Mic", 1).with_capabilities(
//!     DeviceCapabilities::Known { sample_rate: 48000, bit_depth: 24 },
//!     DeviceCapabilities::Unknown,
//! );
//! let orchestrator =
//!     ChannelRecordingOrchestrator::new(ReplayBackend::new("measurements"), SessionSettings::default());
//! orchestrator.declare_from_config(&config)?;
//!
//! let outcome = orchestrator.record_all_channels(Some(&config)).await?;
//! assert_eq!(outcome, SequenceOutcome::Completed);
//! orchestrator.archive().save("session.zip")?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod backend;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod recording;
pub mod replay;
mod wav;

pub use archive::{ARCHIVE_VERSION, RecordingArchive};
pub use backend::{MeasuredChannel, MeasurementBackend, MeasurementRequest, ProgressCallback};
pub use error::{ArchiveError, BackendError, CaptureError, Result};
pub use events::{EVENT_CAPACITY, SessionEvent};
pub use orchestrator::{CancelHandle, ChannelRecordingOrchestrator, SETTLE_DELAY, SequenceOutcome};
pub use recording::{CaptureMetadata, ChannelRecording, RecordingResult, RecordingState};
pub use replay::ReplayBackend;
pub use wav::{decode_mono_wav, encode_mono_wav, read_mono_wav, write_mono_wav};
