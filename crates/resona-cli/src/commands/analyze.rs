//! Response post-processing command.

use anyhow::Context;
use clap::Args;
use resona_analysis::{
    CalibrationCurve, ChannelView, FrequencyResponse, GraphData, OctaveSmoother, PipelineSettings,
    SpectrumNormalizer, apply_calibration, export_frd, import_frd,
};
use std::path::{Path, PathBuf};

use super::common::octave_levels;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Measured response (FRD text file)
    #[arg(value_name = "RESPONSE")]
    input: PathBuf,

    /// Second response; input becomes Left, this becomes Right, and an average is added
    #[arg(long, value_name = "RESPONSE")]
    right: Option<PathBuf>,

    /// Microphone calibration file
    #[arg(short, long)]
    calibration: Option<PathBuf>,

    /// Smoothing as 1/N octave (0 disables)
    #[arg(long, default_value = "3")]
    smoothing: f64,

    /// Skip level normalization
    #[arg(long)]
    no_normalize: bool,

    /// Include phase in the exported curve
    #[arg(long)]
    phase: bool,

    /// Write the processed curve as FRD
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let left = load_response(&args.input)?;
    let right = args.right.as_deref().map(load_response).transpose()?;

    let calibration = args
        .calibration
        .as_ref()
        .map(|path| {
            CalibrationCurve::load(path)
                .with_context(|| format!("Cannot load calibration '{}'", path.display()))
        })
        .transpose()?;
    if let (Some(cal), Some(path)) = (&calibration, &args.calibration) {
        println!("  Calibration: {} ({} points)", path.display(), cal.len());
    }

    if let Some(level) = SpectrumNormalizer::default().reference_level(
        &left.frequencies,
        &apply_calibration(calibration.as_ref(), &left.frequencies, &left.magnitudes_db),
    ) {
        println!("  Reference level (100 Hz - 10 kHz): {level:.2} dB");
    }

    let settings = PipelineSettings {
        calibration,
        smoothing: (args.smoothing > 0.0).then(|| OctaveSmoother::new(args.smoothing)),
        normalize: !args.no_normalize,
        show_phase: args.phase,
    };

    let graph = match &right {
        Some(right) => GraphData::build(
            &settings,
            [(ChannelView::Left, &left), (ChannelView::Right, right)],
        )
        .with_average(),
        None => GraphData::single(&settings, &left),
    };

    print_levels(&graph);

    if let Some(path) = &args.output {
        let exported = processed_response(&graph)?;
        export_frd(&exported, path)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), points = exported.len(), "exported response");
        println!("\nWrote {} points to {}", exported.len(), path.display());
    }

    Ok(())
}

fn load_response(path: &Path) -> anyhow::Result<FrequencyResponse> {
    println!("Loading {}...", path.display());
    let response =
        import_frd(path).with_context(|| format!("Cannot read response '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), points = response.len(), "loaded response");
    if let (Some(lo), Some(hi)) = (response.frequencies.first(), response.frequencies.last()) {
        println!("  {} points, {lo:.1} - {hi:.1} Hz", response.len());
    }
    Ok(response)
}

fn print_levels(graph: &GraphData) {
    for (view, traces) in graph.visible_views() {
        println!("\n{}", graph.legend_label(view));
        println!("  {:>9}  {:>9}  {:>9}", "Freq (Hz)", "Raw (dB)", "Smoothed");

        let raw = octave_levels(graph.frequencies(), &traces.magnitude.raw);
        let smoothed = traces
            .magnitude
            .smoothed
            .as_deref()
            .map(|s| octave_levels(graph.frequencies(), s));
        for (i, (freq, level)) in raw.iter().enumerate() {
            match smoothed.as_ref().and_then(|s| s.get(i)) {
                Some((_, s)) => println!("  {freq:>9.1}  {level:>9.2}  {s:>9.2}"),
                None => println!("  {freq:>9.1}  {level:>9.2}  {:>9}", "-"),
            }
        }
    }
}

/// The curve worth exporting: the average when present, smoothed when available.
fn processed_response(graph: &GraphData) -> anyhow::Result<FrequencyResponse> {
    let traces = graph
        .view(ChannelView::Average)
        .or_else(|| graph.views().next().map(|(_, t)| t))
        .context("No data to export")?;

    let magnitudes = traces
        .magnitude
        .smoothed
        .clone()
        .unwrap_or_else(|| traces.magnitude.raw.clone());
    let phases = traces
        .phase
        .as_ref()
        .map(|p| p.smoothed.clone().unwrap_or_else(|| p.raw.clone()));

    Ok(FrequencyResponse::new(
        graph.frequencies().to_vec(),
        magnitudes,
        phases,
    )?)
}
