//! Per-channel capture state and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use resona_analysis::{AnalysisError, FrequencyResponse};
use resona_config::SignalType;

/// Lifecycle of one channel's capture.
///
/// ```text
/// Empty ──► Recording ──► Done
///   ▲           │          │
///   │           ▼          │ re-record
///   └─────── Error ◄───────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    /// Declared, nothing captured.
    #[default]
    Empty,
    /// Capture in flight.
    Recording,
    /// Captured successfully.
    Done,
    /// The last capture failed.
    Error,
}

impl RecordingState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: RecordingState) -> bool {
        use RecordingState::{Done, Empty, Error, Recording};
        matches!(
            (self, next),
            (Empty, Recording)
                | (Done, Recording)
                | (Recording, Done)
                | (Recording, Error)
                | (Recording, Empty)
                | (Done | Error, Empty)
                | (Empty, Done)
                | (Done, Done)
                | (Error, Done)
        )
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordingState::Empty => "empty",
            RecordingState::Recording => "recording",
            RecordingState::Done => "done",
            RecordingState::Error => "error",
        })
    }
}

/// One declared playback channel and its capture status.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecording {
    /// Playback channel index.
    pub channel_index: usize,
    /// Display name.
    pub channel_name: String,
    /// Current state.
    pub state: RecordingState,
    /// Raw captured samples, when the backend returned them.
    pub samples: Option<Vec<f32>>,
    /// When the last successful capture finished.
    pub recorded_at: Option<SystemTime>,
    /// Message of the last failure, cleared on success or redo.
    pub last_error: Option<String>,
}

impl ChannelRecording {
    /// A fresh `Empty` channel.
    pub fn new(channel_index: usize, channel_name: impl Into<String>) -> Self {
        Self {
            channel_index,
            channel_name: channel_name.into(),
            state: RecordingState::Empty,
            samples: None,
            recorded_at: None,
            last_error: None,
        }
    }

    /// Back to `Empty`, dropping captured data.
    pub(crate) fn clear(&mut self) {
        self.state = RecordingState::Empty;
        self.samples = None;
        self.recorded_at = None;
        self.last_error = None;
    }
}

/// How a result was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    /// Excitation signal.
    pub signal: SignalType,
    /// Excitation length in seconds.
    pub duration_secs: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Analysed response of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    /// Playback channel index.
    pub channel: usize,
    /// Measured response.
    pub response: FrequencyResponse,
    /// Capture parameters.
    pub metadata: CaptureMetadata,
}

impl RecordingResult {
    /// Check the response invariants.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.response.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        use RecordingState::*;
        assert!(Empty.can_transition_to(Recording));
        assert!(Recording.can_transition_to(Done));
        assert!(Recording.can_transition_to(Error));
        assert!(Done.can_transition_to(Recording));
        assert!(Error.can_transition_to(Empty));
        assert!(!Error.can_transition_to(Recording));
        assert!(!Empty.can_transition_to(Error));
    }

    #[test]
    fn clear_drops_data() {
        let mut ch = ChannelRecording::new(0, "Left");
        ch.state = RecordingState::Error;
        ch.samples = Some(vec![0.0; 4]);
        ch.last_error = Some("boom".to_string());
        ch.clear();
        assert_eq!(ch, ChannelRecording::new(0, "Left"));
    }

    #[test]
    fn validate_catches_misaligned_response() {
        let result = RecordingResult {
            channel: 0,
            response: FrequencyResponse {
                frequencies: vec![20.0, 40.0],
                magnitudes_db: vec![0.0],
                phases_deg: None,
            },
            metadata: CaptureMetadata {
                signal: SignalType::Sweep,
                duration_secs: 1.0,
                sample_rate: 48000,
            },
        };
        assert!(result.validate().is_err());
    }
}
