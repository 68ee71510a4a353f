//! Error types shared by the sampler and the posture pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("ADC channel on pin {pin} could not be read: {source}")]
    AdcRead {
        pin: u8,
        #[source]
        source: std::io::Error,
    },

    #[error("ADC channel on pin {pin} returned malformed value {value:?}")]
    AdcMalformed { pin: u8, value: String },

    #[error("ADC channel on pin {pin} returned {raw}, above the {max} full-scale limit")]
    AdcOutOfRange { pin: u8, raw: u32, max: u16 },

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Landmark stream error at line {line}: {message}")]
    LandmarkStream { line: usize, message: String },

    #[error("Failed to load font from {path}: {message}")]
    Font { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
