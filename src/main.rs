// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use posture_tools::app::AssessmentApp;
use posture_tools::capture::{self, FrameSource};
use posture_tools::config::{self, AssessmentConfig, ASSESSMENT_CONFIG_FILE};
use posture_tools::pipeline::{self, FramePipeline};
use posture_tools::pose::{NullEstimator, PoseEstimator, ReplayEstimator};
use posture_tools::snapshot::SnapshotWriter;

/// Draw scoliosis screening reference lines and angles over a camera feed
#[derive(Parser, Debug)]
#[command(name = "scoliosis_assessment")]
#[command(about = "Visual posture assessment overlay", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to the per-user config, if any)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index
    #[arg(long)]
    camera: Option<u32>,

    /// Mirror camera frames horizontally
    #[arg(long)]
    mirror: bool,

    /// Read frames from a directory of PNG/JPEG stills instead of a camera
    #[arg(long)]
    stills: Option<PathBuf>,

    /// JSON-lines landmark stream produced by an external pose model
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Directory for snapshot images
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Pixels per centimetre used for distance readouts
    #[arg(long)]
    pixels_per_cm: Option<f64>,

    /// Annotate every frame into this directory without opening a window
    #[arg(long)]
    headless: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = effective_config(&args)?;

    if let Some(path) = &args.write_config {
        config::save(&config, path)?;
        tracing::info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let estimator: Box<dyn PoseEstimator> = match &args.landmarks {
        Some(path) => Box::new(ReplayEstimator::open(path).context("Failed to open landmark stream")?),
        None => {
            tracing::warn!("No landmark stream given; frames will be shown without annotations");
            Box::new(NullEstimator)
        }
    };

    let mut source = match &args.stills {
        Some(dir) => FrameSource::stills(dir).context("Failed to read stills directory")?,
        None => {
            capture::log_available_cameras();
            FrameSource::camera(config.camera_index, config.mirror).context("Failed to open camera")?
        }
    };

    let snapshots = SnapshotWriter::new(&config.snapshot_dir);
    let title = config.window_title.clone();
    let mut frame_pipeline = FramePipeline::new(estimator, config);

    if let Some(output_dir) = &args.headless {
        let summary = pipeline::run_batch(&mut source, &mut frame_pipeline, output_dir)?;
        println!(
            "Annotated {} frame(s) into {} ({} with a person)",
            summary.frames,
            output_dir.display(),
            summary.with_person
        );
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 960.0])
            .with_min_inner_size([640.0, 480.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(AssessmentApp::new(source, frame_pipeline, snapshots))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Error running application: {}", e))
}

fn effective_config(args: &Args) -> Result<AssessmentConfig> {
    let mut config: AssessmentConfig =
        config::load_or_default(args.config.as_deref(), ASSESSMENT_CONFIG_FILE)
            .context("Failed to load configuration")?;

    if let Some(camera) = args.camera {
        config.camera_index = camera;
    }
    if args.mirror {
        config.mirror = true;
    }
    if let Some(dir) = &args.snapshot_dir {
        config.snapshot_dir = dir.clone();
    }
    if let Some(scale) = args.pixels_per_cm {
        config.pixels_per_cm = scale;
    }

    config.validate()?;
    Ok(config)
}
