//! Sequential per-channel capture.
//!
//! [`ChannelRecordingOrchestrator`] walks the declared playback channels in
//! order, asks the [`MeasurementBackend`] to capture each one, and tracks every
//! channel through `Empty -> Recording -> Done | Error`.
//!
//! - One capture at a time: starting while another sequence or single capture
//!   holds the session fails with [`CaptureError::CaptureInProgress`].
//! - [`SETTLE_DELAY`] separates consecutive channels so relays settle and the
//!   previous signal's tail decays.
//! - Cancellation is cooperative and checked only between channels; a capture
//!   in flight always runs to completion.
//! - A failure marks only that channel `Error` and stops the sequence.
//!
//! State lives behind a mutex that is never held across an `.await`, so
//! snapshots and event subscriptions work while a sequence is running.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use resona_config::{CaptureConfig, ConfigError, SessionSettings, validate_session};
use tokio::sync::broadcast;

use crate::archive::RecordingArchive;
use crate::backend::{MeasurementBackend, MeasurementRequest, ProgressCallback};
use crate::error::{CaptureError, Result};
use crate::events::{EventBus, SessionEvent};
use crate::recording::{CaptureMetadata, ChannelRecording, RecordingResult, RecordingState};

/// Pause between consecutive channels of a sequence.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// How a sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every declared channel was captured.
    Completed,
    /// Stopped by [`CancelHandle::cancel`] before `next_channel` started.
    Cancelled {
        /// First channel left untouched.
        next_channel: usize,
    },
}

/// Cooperative cancellation flag for a running sequence.
///
/// Cloneable and usable from any thread, e.g. a Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct SessionState {
    recordings: Vec<ChannelRecording>,
    results: BTreeMap<usize, RecordingResult>,
    busy: bool,
}

impl SessionState {
    /// Move `index` to `new`, publishing the change.
    fn transition(
        &mut self,
        events: &EventBus,
        index: usize,
        new: RecordingState,
        error: Option<String>,
    ) {
        let Some(rec) = self.recordings.get_mut(index) else {
            return;
        };
        let old = rec.state;
        if old == new {
            return;
        }
        debug_assert!(old.can_transition_to(new), "illegal transition {old} -> {new}");
        rec.state = new;
        if new == RecordingState::Error {
            rec.last_error.clone_from(&error);
        }
        tracing::debug!(channel = index, %old, %new, "channel state changed");
        events.emit(SessionEvent::ChannelStateChanged {
            channel: index,
            old,
            new,
            error,
        });
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.recordings.len() {
            Ok(())
        } else {
            Err(CaptureError::ChannelOutOfRange {
                index,
                count: self.recordings.len(),
            })
        }
    }
}

/// Holds the single capture slot; releasing it resets abandoned captures.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
    events: &'a EventBus,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.state.lock();
        st.busy = false;
        // Only reachable when the capture future was dropped mid-flight
        let abandoned: Vec<usize> = st
            .recordings
            .iter()
            .filter(|r| r.state == RecordingState::Recording)
            .map(|r| r.channel_index)
            .collect();
        for index in abandoned {
            tracing::warn!(channel = index, "capture abandoned");
            st.transition(self.events, index, RecordingState::Empty, None);
        }
    }
}

/// Parameters resolved once per sequence.
#[derive(Debug, Clone, Copy)]
struct CapturePlan {
    sample_rate: u32,
}

/// Drives per-channel captures through a [`MeasurementBackend`].
pub struct ChannelRecordingOrchestrator<B> {
    backend: B,
    settings: SessionSettings,
    state: Mutex<SessionState>,
    cancel: CancelHandle,
    events: EventBus,
}

impl<B: MeasurementBackend> ChannelRecordingOrchestrator<B> {
    /// Create an orchestrator with no channels declared.
    pub fn new(backend: B, settings: SessionSettings) -> Self {
        Self {
            backend,
            settings,
            state: Mutex::new(SessionState::default()),
            cancel: CancelHandle::default(),
            events: EventBus::new(),
        }
    }

    /// The measurement backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current session settings.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Replace the session settings.
    pub fn set_settings(&mut self, settings: SessionSettings) {
        self.settings = settings;
    }

    /// Receive every future [`SessionEvent`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Handle that cancels the running sequence from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stop the running sequence before its next channel.
    pub fn cancel(&self) {
        tracing::info!("cancellation requested");
        self.cancel.cancel();
    }

    /// Whether a capture currently holds the session.
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Declare `count` channels, all `Empty`, discarding previous results.
    ///
    /// `names` is either empty (channels are named "Channel N") or has exactly
    /// `count` entries.
    pub fn set_channels(&self, count: usize, names: Vec<String>) -> Result<()> {
        if !names.is_empty() && names.len() != count {
            return Err(CaptureError::InvalidChannels(format!(
                "{} names given for {count} channels",
                names.len()
            )));
        }

        let mut st = self.state.lock();
        if st.busy {
            return Err(CaptureError::CaptureInProgress);
        }

        let mut names = names.into_iter();
        st.recordings = (0..count)
            .map(|i| {
                let name = names
                    .next()
                    .unwrap_or_else(|| format!("Channel {}", i + 1));
                ChannelRecording::new(i, name)
            })
            .collect();
        st.results.clear();

        tracing::info!(channels = count, "channels declared");
        Ok(())
    }

    /// Declare one channel per playback channel, named after its group.
    pub fn declare_from_config(&self, config: &CaptureConfig) -> Result<()> {
        config.validate()?;
        let names = (0..config.playback.channels)
            .map(|ch| config.channel_name(ch))
            .collect();
        self.set_channels(usize::from(config.playback.channels), names)
    }

    /// Number of declared channels.
    pub fn channel_count(&self) -> usize {
        self.state.lock().recordings.len()
    }

    /// Snapshot of every channel.
    pub fn recordings(&self) -> Vec<ChannelRecording> {
        self.state.lock().recordings.clone()
    }

    /// Snapshot of one channel.
    pub fn recording(&self, index: usize) -> Option<ChannelRecording> {
        self.state.lock().recordings.get(index).cloned()
    }

    /// Snapshot of every result, ordered by channel.
    pub fn results(&self) -> Vec<RecordingResult> {
        self.state.lock().results.values().cloned().collect()
    }

    /// Snapshot of one channel's result.
    pub fn result(&self, index: usize) -> Option<RecordingResult> {
        self.state.lock().results.get(&index).cloned()
    }

    /// Reset a channel to `Empty` and drop its result.
    pub fn redo_channel(&self, index: usize) -> Result<()> {
        let mut st = self.state.lock();
        if st.busy {
            return Err(CaptureError::CaptureInProgress);
        }
        st.check_index(index)?;
        st.transition(&self.events, index, RecordingState::Empty, None);
        st.results.remove(&index);
        if let Some(rec) = st.recordings.get_mut(index) {
            rec.clear();
        }
        Ok(())
    }

    /// Replace all results with `results`.
    ///
    /// Imported channels become `Done`, every other channel `Empty`. All
    /// results are checked before anything changes; on error the session is
    /// left as it was.
    pub fn import_results(&self, results: Vec<RecordingResult>) -> Result<()> {
        self.import_archive(RecordingArchive::new(results))
    }

    /// Replace all results and raw samples with an archive's content.
    pub fn import_archive(&self, archive: RecordingArchive) -> Result<()> {
        let mut st = self.state.lock();
        if st.busy {
            return Err(CaptureError::CaptureInProgress);
        }
        for result in &archive.results {
            st.check_index(result.channel)?;
            result
                .validate()
                .map_err(|source| CaptureError::InvalidRecording {
                    channel: result.channel,
                    source,
                })?;
        }

        let RecordingArchive {
            results,
            mut samples,
        } = archive;
        let imported: BTreeMap<usize, RecordingResult> =
            results.into_iter().map(|r| (r.channel, r)).collect();

        for index in 0..st.recordings.len() {
            if imported.contains_key(&index) {
                st.transition(&self.events, index, RecordingState::Done, None);
                if let Some(rec) = st.recordings.get_mut(index) {
                    rec.samples = samples.remove(&index);
                    rec.last_error = None;
                }
            } else {
                st.transition(&self.events, index, RecordingState::Empty, None);
                if let Some(rec) = st.recordings.get_mut(index) {
                    rec.clear();
                }
            }
        }

        tracing::info!(channels = imported.len(), "imported recording results");
        st.results = imported;
        Ok(())
    }

    /// Results plus raw samples, ready for [`RecordingArchive::save`].
    pub fn archive(&self) -> RecordingArchive {
        let st = self.state.lock();
        RecordingArchive {
            results: st.results.values().cloned().collect(),
            samples: st
                .recordings
                .iter()
                .filter_map(|r| Some((r.channel_index, r.samples.clone()?)))
                .collect(),
        }
    }

    /// Capture every declared channel in order.
    ///
    /// Returns after the last channel, at the first failure, or at the first
    /// channel boundary after [`cancel`](Self::cancel). With no channels
    /// declared the sequence completes immediately.
    pub async fn record_all_channels(
        &self,
        config: Option<&CaptureConfig>,
    ) -> Result<SequenceOutcome> {
        let config = config.ok_or(CaptureError::ConfigurationMissing)?;
        let _guard = self.claim()?;
        let plan = self.plan(config)?;
        let count = self.channel_count();

        self.cancel.reset();
        tracing::info!(
            backend = self.backend.name(),
            channels = count,
            sample_rate = plan.sample_rate,
            signal = %self.settings.signal,
            "capture sequence started"
        );

        for index in 0..count {
            if index > 0 {
                if self.cancel.is_cancelled() {
                    return Ok(self.cancelled(index));
                }
                tokio::time::sleep(SETTLE_DELAY).await;
            }
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(index));
            }
            self.capture_channel(index, config, plan).await?;
        }

        tracing::info!(channels = count, "capture sequence completed");
        self.events
            .emit(SessionEvent::SequenceCompleted { channels: count });
        Ok(SequenceOutcome::Completed)
    }

    /// Capture one channel in place, replacing any previous result.
    pub async fn record_single_channel(
        &self,
        index: usize,
        config: Option<&CaptureConfig>,
    ) -> Result<()> {
        let config = config.ok_or(CaptureError::ConfigurationMissing)?;
        let _guard = self.claim()?;
        self.state.lock().check_index(index)?;
        let plan = self.plan(config)?;
        self.capture_channel(index, config, plan).await
    }

    fn cancelled(&self, next_channel: usize) -> SequenceOutcome {
        tracing::info!(next_channel, "capture sequence cancelled");
        self.events
            .emit(SessionEvent::SequenceCancelled { next_channel });
        SequenceOutcome::Cancelled { next_channel }
    }

    fn claim(&self) -> Result<BusyGuard<'_>> {
        let mut st = self.state.lock();
        if st.busy {
            return Err(CaptureError::CaptureInProgress);
        }
        st.busy = true;
        Ok(BusyGuard {
            state: &self.state,
            events: &self.events,
        })
    }

    /// Validate inputs and resolve the sample rate.
    fn plan(&self, config: &CaptureConfig) -> Result<CapturePlan> {
        config.validate()?;
        validate_session(&self.settings).map_err(ConfigError::from)?;

        let count = self.channel_count();
        if count > usize::from(config.playback.channels) {
            return Err(CaptureError::InvalidChannels(format!(
                "{count} channels declared but '{}' has {}",
                config.playback.device, config.playback.channels
            )));
        }

        let sample_rate = self
            .settings
            .sample_rate_override
            .or_else(|| config.known_sample_rate())
            .ok_or(CaptureError::UnknownSampleRate)?;
        Ok(CapturePlan { sample_rate })
    }

    async fn capture_channel(
        &self,
        index: usize,
        config: &CaptureConfig,
        plan: CapturePlan,
    ) -> Result<()> {
        let source_channel = u16::try_from(index).map_err(|_| CaptureError::ChannelOutOfRange {
            index,
            count: usize::from(config.playback.channels),
        })?;
        let destination_channel = config.recording.destination_channel(index).ok_or_else(|| {
            CaptureError::InvalidChannels("recording channel mapping is empty".to_string())
        })?;

        let request = MeasurementRequest {
            playback_device: config.playback.device.clone(),
            recording_device: config.recording.device.clone(),
            source_channel,
            destination_channel,
            signal: self.settings.signal,
            duration: self.settings.duration(),
            sample_rate: plan.sample_rate,
            output_path: self
                .settings
                .output_dir
                .join(format!("channel_{index}_recorded.wav")),
        };

        {
            let mut st = self.state.lock();
            st.check_index(index)?;
            if st.recordings[index].state == RecordingState::Error {
                st.transition(&self.events, index, RecordingState::Empty, None);
            }
            st.transition(&self.events, index, RecordingState::Recording, None);
        }

        let events = self.events.clone();
        let progress: ProgressCallback = Box::new(move |fraction| {
            events.emit(SessionEvent::Progress {
                channel: index,
                fraction: fraction.clamp(0.0, 1.0),
            });
        });

        tracing::debug!(
            channel = index,
            source = source_channel,
            destination = destination_channel,
            "capturing channel"
        );
        let outcome = self.backend.measure(request, progress).await;

        let mut st = self.state.lock();
        let measured = match outcome {
            Ok(measured) => measured,
            Err(e) => {
                let message = e.to_string();
                tracing::error!(channel = index, error = %message, "capture failed");
                st.transition(
                    &self.events,
                    index,
                    RecordingState::Error,
                    Some(message.clone()),
                );
                self.events.emit(SessionEvent::CaptureError {
                    channel: index,
                    message: message.clone(),
                });
                return Err(CaptureError::DeviceCaptureFailure {
                    channel: index,
                    message,
                });
            }
        };

        if let Err(source) = measured.response.validate() {
            let message = source.to_string();
            tracing::error!(channel = index, error = %message, "backend returned invalid response");
            st.transition(
                &self.events,
                index,
                RecordingState::Error,
                Some(message.clone()),
            );
            self.events.emit(SessionEvent::CaptureError {
                channel: index,
                message,
            });
            return Err(CaptureError::InvalidRecording {
                channel: index,
                source,
            });
        }

        st.results.insert(
            index,
            RecordingResult {
                channel: index,
                response: measured.response,
                metadata: CaptureMetadata {
                    signal: self.settings.signal,
                    duration_secs: self.settings.duration_secs,
                    sample_rate: plan.sample_rate,
                },
            },
        );
        if let Some(rec) = st.recordings.get_mut(index) {
            rec.samples = measured.samples;
            rec.recorded_at = Some(SystemTime::now());
            rec.last_error = None;
        }
        st.transition(&self.events, index, RecordingState::Done, None);
        Ok(())
    }
}
