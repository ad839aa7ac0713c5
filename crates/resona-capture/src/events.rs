//! Session events.
//!
//! The orchestrator publishes immutable events on a `tokio` broadcast channel.
//! Any number of presentation layers subscribe independently; a slow
//! subscriber lags and misses events without blocking capture.

use tokio::sync::broadcast;

use crate::recording::RecordingState;

/// Buffered events per subscriber before it starts lagging.
pub const EVENT_CAPACITY: usize = 256;

/// Something that happened in a capture session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A channel changed state.
    ChannelStateChanged {
        /// Channel index.
        channel: usize,
        /// Previous state.
        old: RecordingState,
        /// New state.
        new: RecordingState,
        /// Failure message when `new` is `Error`.
        error: Option<String>,
    },
    /// Backend progress for the channel being captured.
    Progress {
        /// Channel index.
        channel: usize,
        /// Completion in `[0, 1]`.
        fraction: f32,
    },
    /// Every channel of a sequence was captured.
    SequenceCompleted {
        /// Number of channels captured.
        channels: usize,
    },
    /// A sequence stopped at a channel boundary after `cancel()`.
    SequenceCancelled {
        /// First channel that was not started.
        next_channel: usize,
    },
    /// A capture failed.
    CaptureError {
        /// Channel index.
        channel: usize,
        /// Failure message.
        message: String,
    },
}

/// Sending half shared by the orchestrator and progress callbacks.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}
