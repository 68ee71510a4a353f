// src/config.rs
use crate::error::{Error, Result};
use crate::sampler::{AdcConfig, RecordMode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ASSESSMENT_CONFIG_FILE: &str = "assessment.toml";
pub const SAMPLER_CONFIG_FILE: &str = "sampler.toml";

/// Pixel offset relative to a landmark or to the frame origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Layout constants for the overlay. These are tuned for a subject standing
/// roughly two metres from a 640x480 webcam and are not derived from the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayout {
    pub dot_radius: i32,
    pub line_thickness: u32,
    pub label_offset: Offset,
    pub label_scale: f32,
    pub readout_scale: f32,
    pub distance_scale: f32,
    pub first_readout: Offset,
    pub second_readout: Offset,
    pub left_distance_dx: i32,
    pub right_distance_dx: i32,
    pub hip_distance_dy: i32,
}

impl OverlayLayout {
    pub fn validate(&self) -> Result<()> {
        if self.dot_radius < 0 {
            return Err(Error::Config(format!(
                "dot_radius must not be negative, got {}",
                self.dot_radius
            )));
        }
        let scales = [
            ("label_scale", self.label_scale),
            ("readout_scale", self.readout_scale),
            ("distance_scale", self.distance_scale),
        ];
        for (name, scale) in scales {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, scale)));
            }
        }
        Ok(())
    }
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            dot_radius: 5,
            line_thickness: 2,
            label_offset: Offset::new(-10, -10),
            label_scale: 48.0,
            readout_scale: 32.0,
            distance_scale: 48.0,
            first_readout: Offset::new(10, 30),
            second_readout: Offset::new(10, 70),
            left_distance_dx: 100,
            right_distance_dx: -500,
            hip_distance_dy: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub camera_index: u32,
    pub mirror: bool,
    /// Shoulders closer than this horizontally mean the subject is side-on.
    pub sideways_threshold_px: i32,
    /// Shoulders within this vertical offset mean the subject shows their back.
    pub back_threshold_px: i32,
    pub pixels_per_cm: f64,
    pub snapshot_dir: PathBuf,
    pub font_path: Option<PathBuf>,
    pub window_title: String,
    pub layout: OverlayLayout,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirror: false,
            sideways_threshold_px: 50,
            back_threshold_px: 50,
            pixels_per_cm: 30.0,
            snapshot_dir: PathBuf::from("."),
            font_path: Some(PathBuf::from(
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            )),
            window_title: "Scoliosis Level Detection".to_string(),
            layout: OverlayLayout::default(),
        }
    }
}

impl AssessmentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.pixels_per_cm.is_finite() && self.pixels_per_cm > 0.0) {
            return Err(Error::Config(format!(
                "pixels_per_cm must be positive, got {}",
                self.pixels_per_cm
            )));
        }
        if self.sideways_threshold_px < 0 || self.back_threshold_px < 0 {
            return Err(Error::Config("view thresholds must not be negative".into()));
        }
        self.layout.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub samples: usize,
    pub interval_ms: u64,
    pub output_path: PathBuf,
    pub record_mode: RecordMode,
    /// Linux IIO device exposing `in_voltage<N>_raw` attributes.
    pub iio_device: PathBuf,
    pub channel1: AdcConfig,
    pub channel2: AdcConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            samples: 2000,
            interval_ms: 2,
            output_path: PathBuf::from("REGISTRO 1.txt"),
            record_mode: RecordMode::FinalSample,
            iio_device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            channel1: AdcConfig::on_pin(32),
            channel2: AdcConfig::on_pin(25),
        }
    }
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

pub fn save<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(value).map_err(|e| Error::Config(e.to_string()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn default_path(file_name: &str) -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "posturetools", "posture_tools")
        .map(|dirs| dirs.config_dir().join(file_name))
}

/// An explicit path must exist; otherwise the per-user config file is used
/// when present and built-in defaults when not.
pub fn load_or_default<T>(explicit: Option<&Path>, file_name: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if let Some(path) = explicit {
        return load(path);
    }

    match default_path(file_name) {
        Some(path) if path.exists() => {
            tracing::info!("Loading configuration from {}", path.display());
            load(&path)
        }
        _ => Ok(T::default()),
    }
}
