//! Error types for capture sessions and recording archives.

use std::path::PathBuf;
use thiserror::Error;

use resona_analysis::AnalysisError;
use resona_config::ConfigError;

/// Errors returned by [`ChannelRecordingOrchestrator`](crate::ChannelRecordingOrchestrator).
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A sequence was started without a capture configuration.
    #[error("no capture configuration provided")]
    ConfigurationMissing,

    /// The capture configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Channel declaration was inconsistent.
    #[error("invalid channel declaration: {0}")]
    InvalidChannels(String),

    /// A channel index outside the declared range.
    #[error("channel {index} out of range ({count} channels declared)")]
    ChannelOutOfRange {
        /// Requested index.
        index: usize,
        /// Declared channel count.
        count: usize,
    },

    /// Another capture holds the session.
    #[error("a capture is already in progress")]
    CaptureInProgress,

    /// Neither the session nor the devices provide a sample rate.
    #[error("sample rate unknown: set an override or declare device capabilities")]
    UnknownSampleRate,

    /// The measurement backend failed on a channel.
    #[error("capture failed on channel {channel}: {message}")]
    DeviceCaptureFailure {
        /// Channel that failed.
        channel: usize,
        /// Backend error message.
        message: String,
    },

    /// A recording result broke its invariants.
    #[error("invalid recording for channel {channel}: {source}")]
    InvalidRecording {
        /// Channel the result was for.
        channel: usize,
        /// Underlying validation failure.
        #[source]
        source: AnalysisError,
    },

    /// Archive read or write failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Errors from saving or loading a [`RecordingArchive`](crate::RecordingArchive).
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be created or opened.
    #[error("archive I/O error on '{path}': {source}")]
    Io {
        /// Archive file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The ZIP container is malformed or could not be written.
    #[error("archive container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry listed in the metadata is not in the archive.
    #[error("archive entry '{0}' is missing")]
    MissingEntry(String),

    /// `metadata.json` could not be read or written.
    #[error("archive metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A WAV entry could not be encoded or decoded.
    #[error("WAV error in '{entry}': {source}")]
    Wav {
        /// Entry name inside the archive.
        entry: String,
        /// Underlying hound error.
        #[source]
        source: hound::Error,
    },

    /// An analysis entry was malformed.
    #[error("analysis data error: {0}")]
    Analysis(#[from] AnalysisError),

    /// The archive format version is not supported.
    #[error("unsupported archive version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in metadata.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },
}

impl ArchiveError {
    /// Create an I/O error for the archive file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a WAV error for an archive entry.
    pub fn wav(entry: impl Into<String>, source: hound::Error) -> Self {
        ArchiveError::Wav {
            entry: entry.into(),
            source,
        }
    }
}

/// Error reported by a [`MeasurementBackend`](crate::MeasurementBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The requested device is not available.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The device stream failed.
    #[error("stream error: {0}")]
    Stream(String),

    /// No response data for the requested channel.
    #[error("no data for channel {0}")]
    MissingData(u16),

    /// Reading or analysing the capture failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Other backend failure.
    #[error("{0}")]
    Other(String),
}

/// Convenience result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
