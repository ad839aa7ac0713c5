//! Capture session command.
//!
//! Drives the orchestrator over every channel of a configuration, replaying
//! stored responses through the [`ReplayBackend`], and archives the results.

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use resona_analysis::{SpectrumNormalizer, apply_calibration};
use resona_capture::{
    CaptureError, ChannelRecordingOrchestrator, RecordingState, ReplayBackend, SequenceOutcome, SessionEvent,
};
use resona_config::{DEFAULT_DURATION_SECS, SessionSettings, SignalType};
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::RecvError};

use super::common::{config_calibration, config_path, load_config};

/// Progress bar ticks per channel.
const TICKS_PER_CHANNEL: u64 = 100;

#[derive(Args)]
pub struct SessionArgs {
    /// Capture config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding channel_N.frd responses to replay
    #[arg(long, value_name = "DIR")]
    responses: PathBuf,

    /// ZIP archive to write the results to
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Excitation signal (sweep, white-noise, pink-noise)
    #[arg(long, default_value = "sweep")]
    signal: SignalType,

    /// Excitation length in seconds
    #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
    duration: f64,

    /// Sample rate override in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Capture only this channel (1-based)
    #[arg(long)]
    channel: Option<usize>,

    /// Take as long as a real capture would
    #[arg(long)]
    realtime: bool,
}

pub fn run(args: SessionArgs) -> anyhow::Result<()> {
    let single = args
        .channel
        .map(|n| n.checked_sub(1).context("Channels are numbered from 1"))
        .transpose()?;
    let path = config_path(args.config);
    let config = load_config(&path)?;
    let calibration = config_calibration(&config)?;

    let mut settings = SessionSettings::default()
        .with_signal(args.signal)
        .with_duration_secs(args.duration);
    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        settings = settings.with_output_dir(dir);
    }
    if let Some(rate) = args.sample_rate {
        settings = settings.with_sample_rate(rate);
    }

    let backend = ReplayBackend::new(&args.responses).with_realtime(args.realtime);
    let orchestrator = ChannelRecordingOrchestrator::new(backend, settings);
    orchestrator.declare_from_config(&config)?;
    let names: Vec<String> = orchestrator
        .recordings()
        .into_iter()
        .map(|r| r.channel_name)
        .collect();

    println!(
        "Capturing {} channel(s): {} -> {}",
        names.len(),
        config.playback.device,
        config.recording.device
    );
    println!(
        "  Signal: {}, {:.1}s, responses from {}",
        args.signal,
        args.duration,
        args.responses.display()
    );
    println!("\nPress Ctrl+C to stop after the current channel...\n");

    let cancel = orchestrator.cancel_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nStopping after the current channel...");
        cancel.cancel();
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let pb = progress_bar(names.len());
    let outcome = runtime.block_on(async {
        let reporter = tokio::spawn(report_progress(
            orchestrator.subscribe(),
            names.clone(),
            pb.clone(),
        ));
        let outcome = match single {
            Some(index) => orchestrator
                .record_single_channel(index, Some(&config))
                .await
                .map(|()| SequenceOutcome::Completed),
            None => orchestrator.record_all_channels(Some(&config)).await,
        };
        reporter.abort();
        outcome
    });
    finish_progress(&pb, &outcome);

    println!();
    let normalizer = SpectrumNormalizer::default();
    for rec in orchestrator.recordings() {
        let level = orchestrator.result(rec.channel_index).and_then(|r| {
            let f = &r.response.frequencies;
            normalizer.reference_level(
                f,
                &apply_calibration(calibration.as_ref(), f, &r.response.magnitudes_db),
            )
        });
        let detail = match (rec.state, level, &rec.last_error) {
            (RecordingState::Done, Some(level), _) => format!("{level:.1} dB"),
            (RecordingState::Error, _, Some(e)) => e.clone(),
            _ => String::new(),
        };
        println!(
            "  {:>2}  {:<16} {:<9} {}",
            rec.channel_index + 1,
            rec.channel_name,
            rec.state,
            detail
        );
    }

    let archive = orchestrator.archive();
    if !archive.results.is_empty() {
        archive
            .save(&args.output)
            .with_context(|| format!("Cannot write archive '{}'", args.output.display()))?;
        tracing::info!(
            path = %args.output.display(),
            channels = archive.results.len(),
            "session archived"
        );
        println!(
            "\nSaved {} channel(s) to {}",
            archive.results.len(),
            args.output.display()
        );
    }

    match outcome {
        Ok(SequenceOutcome::Completed) => {
            tracing::info!("session complete");
            println!("Session complete");
        }
        Ok(SequenceOutcome::Cancelled { next_channel }) => {
            tracing::info!(next_channel, "session cancelled");
            println!("Session cancelled before channel {}", next_channel + 1);
        }
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            return Err(e.into());
        }
    }
    Ok(())
}

/// Clear the bar after a full run; leave it visible where the run stopped.
fn finish_progress(pb: &ProgressBar, outcome: &Result<SequenceOutcome, CaptureError>) {
    match outcome {
        Ok(SequenceOutcome::Completed) => pb.finish_and_clear(),
        Ok(SequenceOutcome::Cancelled { .. }) | Err(_) => pb.abandon(),
    }
}

fn progress_bar(channels: usize) -> ProgressBar {
    let pb = ProgressBar::new(channels as u64 * TICKS_PER_CHANNEL);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

/// Mirrors session events onto `pb` until the sequence ends.
///
/// The caller owns finishing the bar, since single-channel runs and failed
/// sequences never emit a terminal event.
async fn report_progress(
    mut events: broadcast::Receiver<SessionEvent>,
    names: Vec<String>,
    pb: ProgressBar,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };
        match event {
            SessionEvent::ChannelStateChanged {
                channel,
                new: RecordingState::Recording,
                ..
            } => {
                pb.set_message(names.get(channel).cloned().unwrap_or_default());
                pb.set_position(channel as u64 * TICKS_PER_CHANNEL);
            }
            SessionEvent::Progress { channel, fraction } => {
                let within = (f64::from(fraction) * TICKS_PER_CHANNEL as f64) as u64;
                pb.set_position(channel as u64 * TICKS_PER_CHANNEL + within);
            }
            SessionEvent::CaptureError { channel, message } => {
                tracing::warn!(channel, %message, "capture failed");
                pb.println(format!("channel {} failed: {message}", channel + 1));
            }
            SessionEvent::SequenceCompleted { .. } | SessionEvent::SequenceCancelled { .. } => {
                break;
            }
            SessionEvent::ChannelStateChanged { .. } => {}
        }
    }
}
