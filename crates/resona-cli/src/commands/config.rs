//! Capture configuration commands.

use anyhow::Context;
use clap::{Args, Subcommand};
use resona_config::paths::{calibration_dir, ensure_dir, list_calibration_files};
use resona_config::{CalibrationSource, CaptureConfig, DeviceCapabilities};
use std::path::PathBuf;

use super::common::{config_path, load_config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a new capture configuration with the standard channel layout
    Init {
        /// Output device name
        #[arg(long)]
        playback_device: String,

        /// Output channel count
        #[arg(long, default_value = "2")]
        playback_channels: u16,

        /// Input device name (defaults to the output device)
        #[arg(long)]
        recording_device: Option<String>,

        /// Input channel count
        #[arg(long, default_value = "1")]
        recording_channels: u16,

        /// Native sample rate of both devices, if known
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Native bit depth, used with --sample-rate
        #[arg(long, default_value = "24")]
        bit_depth: u16,

        /// Calibration file path or identifier in the calibration directory
        #[arg(long)]
        calibration: Option<String>,

        /// Config file (defaults to the user config directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print a configuration and its channel layout
    Show {
        /// Config file (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Check a configuration for consistency
    Validate {
        /// Config file (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// List calibration files in the calibration directory
    Calibrations,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Init {
            playback_device,
            playback_channels,
            recording_device,
            recording_channels,
            sample_rate,
            bit_depth,
            calibration,
            output,
            force,
        } => {
            let path = config_path(output);
            if path.exists() && !force {
                anyhow::bail!(
                    "'{}' already exists (use --force to overwrite)",
                    path.display()
                );
            }

            let recording_device = recording_device.unwrap_or_else(|| playback_device.clone());
            let capabilities = match sample_rate {
                Some(sample_rate) => DeviceCapabilities::Known {
                    sample_rate,
                    bit_depth,
                },
                None => DeviceCapabilities::Unknown,
            };
            let mut config = CaptureConfig::new(
                playback_device,
                playback_channels,
                recording_device,
                recording_channels,
            )
            .with_capabilities(capabilities, capabilities);
            if let Some(cal) = calibration {
                config = config.with_calibration(calibration_source(cal));
            }

            config.validate()?;
            config
                .save(&path)
                .with_context(|| format!("Cannot write '{}'", path.display()))?;
            tracing::info!(path = %path.display(), "wrote capture config");
            println!("Wrote capture config to {}", path.display());
        }

        ConfigCommand::Show { path } => {
            let path = config_path(path);
            let config = load_config(&path)?;

            println!("# {}", path.display());
            print!("{}", config.to_toml()?);

            println!("\nChannels:");
            for ch in 0..config.playback.channels {
                let input = config
                    .recording
                    .destination_channel(usize::from(ch))
                    .map_or_else(|| "-".to_string(), |d| (d + 1).to_string());
                println!(
                    "  {:>2}  {:<16} mic input {}",
                    ch + 1,
                    config.channel_name(ch),
                    input
                );
            }
            match config.known_sample_rate() {
                Some(rate) => println!("\nSample rate: {rate} Hz"),
                None => println!("\nSample rate: unknown (pass --sample-rate to sessions)"),
            }
        }

        ConfigCommand::Validate { path } => {
            let path = config_path(path);
            load_config(&path)?;
            println!("{}: OK", path.display());
        }

        ConfigCommand::Calibrations => {
            let dir = calibration_dir();
            ensure_dir(&dir)?;
            let files = list_calibration_files(&dir);
            println!("Calibration files in {}:", dir.display());
            if files.is_empty() {
                println!("  (none)");
            }
            for file in files {
                if let Some(name) = file.file_name() {
                    println!("  {}", name.to_string_lossy());
                }
            }
        }
    }

    Ok(())
}

/// Existing paths are kept as paths; anything else is an identifier.
fn calibration_source(value: String) -> CalibrationSource {
    let path = PathBuf::from(&value);
    if path.exists() {
        CalibrationSource::Path(path)
    } else {
        CalibrationSource::Id(value)
    }
}
