//! Backend that replays previously measured responses.
//!
//! Looks for `channel_{n}.frd` (and optionally `channel_{n}.wav`) in a
//! directory, `n` being the playback channel. Useful for re-running the
//! analysis pipeline on existing data and for exercising the orchestrator
//! without audio hardware.

use std::path::{Path, PathBuf};

use resona_analysis::import_frd;

use crate::backend::{MeasuredChannel, MeasurementBackend, MeasurementRequest, ProgressCallback};
use crate::error::BackendError;
use crate::wav::read_mono_wav;

/// Progress ticks reported while simulating playback time.
const PROGRESS_STEPS: u32 = 20;

/// Replays FRD files from a directory.
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    dir: PathBuf,
    realtime: bool,
}

impl ReplayBackend {
    /// Replay responses stored in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            realtime: false,
        }
    }

    /// Wait for the request duration before returning, like a real capture.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Directory being replayed.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Response file for playback channel `channel`.
    pub fn response_path(&self, channel: u16) -> PathBuf {
        self.dir.join(format!("channel_{channel}.frd"))
    }

    fn samples_path(&self, channel: u16) -> PathBuf {
        self.dir.join(format!("channel_{channel}.wav"))
    }
}

impl MeasurementBackend for ReplayBackend {
    fn name(&self) -> &str {
        "replay"
    }

    async fn measure(
        &self,
        request: MeasurementRequest,
        mut progress: ProgressCallback,
    ) -> Result<MeasuredChannel, BackendError> {
        progress(0.0);

        if self.realtime && !request.duration.is_zero() {
            let step = request.duration / PROGRESS_STEPS;
            for i in 1..=PROGRESS_STEPS {
                tokio::time::sleep(step).await;
                progress(i as f32 / PROGRESS_STEPS as f32);
            }
        }

        let response_path = self.response_path(request.source_channel);
        if !response_path.exists() {
            return Err(BackendError::MissingData(request.source_channel));
        }
        let samples_path = self.samples_path(request.source_channel);

        let (response, samples) = tokio::task::spawn_blocking(move || {
            let response = import_frd(&response_path)?;
            let samples = if samples_path.exists() {
                let (samples, _) = read_mono_wav(&samples_path)
                    .map_err(|e| BackendError::Other(format!("{}: {e}", samples_path.display())))?;
                Some(samples)
            } else {
                None
            };
            Ok::<_, BackendError>((response, samples))
        })
        .await
        .map_err(|e| BackendError::Other(e.to_string()))??;

        tracing::debug!(
            channel = request.source_channel,
            points = response.len(),
            has_samples = samples.is_some(),
            "replayed response"
        );
        progress(1.0);
        Ok(MeasuredChannel { response, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_analysis::{FrequencyResponse, export_frd};
    use resona_config::SignalType;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn request(source_channel: u16) -> MeasurementRequest {
        MeasurementRequest {
            playback_device: "Out".to_string(),
            recording_device: "In".to_string(),
            source_channel,
            destination_channel: 0,
            signal: SignalType::Sweep,
            duration: Duration::from_secs(2),
            sample_rate: 48000,
            output_path: PathBuf::from("/tmp/unused.wav"),
        }
    }

    #[tokio::test]
    async fn replays_frd_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let response = FrequencyResponse::new(vec![20.0, 200.0], vec![-1.0, -2.0], None).unwrap();
        export_frd(&response, dir.path().join("channel_1.frd")).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let backend = ReplayBackend::new(dir.path());
        let measured = backend
            .measure(request(1), Box::new(move |p| sink.lock().unwrap().push(p)))
            .await
            .unwrap();

        assert_eq!(measured.response, response);
        assert!(measured.samples.is_none());
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn missing_file_is_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReplayBackend::new(dir.path())
            .measure(request(3), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingData(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn realtime_waits_for_duration() {
        let dir = tempfile::tempdir().unwrap();
        let response = FrequencyResponse::new(vec![20.0], vec![0.0], None).unwrap();
        export_frd(&response, dir.path().join("channel_0.frd")).unwrap();

        let backend = ReplayBackend::new(dir.path()).with_realtime(true);
        let start = tokio::time::Instant::now();
        backend.measure(request(0), Box::new(|_| {})).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
