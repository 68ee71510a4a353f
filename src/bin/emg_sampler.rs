use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use posture_tools::config::{self, SamplerConfig, SAMPLER_CONFIG_FILE};
use posture_tools::sampler::{IioChannel, RecordMode, SampleRegister, Sampler};

/// Sample two analog EMG channels and record them to a text register
#[derive(Parser, Debug)]
#[command(name = "emg_sampler")]
struct Args {
    /// TOML configuration file (defaults to the per-user config, if any)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of samples to take
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// Register file to create or truncate
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// IIO device directory exposing in_voltage<N>_raw
    #[arg(long)]
    device: Option<PathBuf>,

    /// Record every sample instead of only the last one
    #[arg(long)]
    every_sample: bool,

    /// Do not echo each sample to stdout
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config: SamplerConfig = config::load_or_default(args.config.as_deref(), SAMPLER_CONFIG_FILE)
        .context("Failed to load configuration")?;

    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(device) = args.device {
        config.iio_device = device;
    }
    if args.every_sample {
        config.record_mode = RecordMode::EverySample;
    }

    let mut channel1 = IioChannel::new(&config.iio_device, config.channel1);
    let mut channel2 = IioChannel::new(&config.iio_device, config.channel2);
    tracing::info!(
        "Sampling {} and {} ({} samples, {:?})",
        channel1.path().display(),
        channel2.path().display(),
        config.samples,
        config.record_mode
    );

    let mut register = SampleRegister::create(&config.output_path)
        .with_context(|| format!("Failed to create {}", config.output_path.display()))?;

    let sampler = Sampler::from_config(&config);
    let quiet = args.quiet;
    let last = sampler.run(&mut channel1, &mut channel2, &mut register, |record| {
        if !quiet {
            println!("{}", record);
        }
    })?;
    register.finish()?;

    match last {
        Some(record) => tracing::info!("Wrote {} (last: {})", config.output_path.display(), record),
        None => tracing::info!("No samples taken, {} left empty", config.output_path.display()),
    }
    Ok(())
}
