//! Scoliosis screening overlays for a live camera feed, plus the two-channel
//! EMG sampler that records to `REGISTRO 1.txt`.

pub mod analysis;
pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod overlay;
pub mod pipeline;
pub mod pose;
pub mod sampler;
pub mod snapshot;

pub use error::{Error, Result};
