// src/capture.rs - Frame acquisition from a webcam or a folder of stills
use crate::error::{Error, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub enum FrameSource {
    Camera(CameraSource),
    Stills(StillsSource),
}

impl FrameSource {
    pub fn camera(index: u32, mirror: bool) -> Result<Self> {
        Ok(FrameSource::Camera(CameraSource::open(index, mirror)?))
    }

    pub fn stills(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(FrameSource::Stills(StillsSource::scan(dir)?))
    }

    /// Next frame, or `None` once the stream has ended. Acquisition failures
    /// also end the stream.
    pub fn next_frame(&mut self) -> Option<RgbImage> {
        let result = match self {
            FrameSource::Camera(camera) => camera.read_frame().map(Some),
            FrameSource::Stills(stills) => stills.next_still(),
        };

        match result {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Frame acquisition failed, ending stream: {}", e);
                None
            }
        }
    }
}

pub struct CameraSource {
    camera: Camera,
    mirror: bool,
}

impl CameraSource {
    pub fn open(index: u32, mirror: bool) -> Result<Self> {
        tracing::debug!("Opening camera index {}", index);

        let format = CameraFormat::new(Resolution::new(640, 480), FrameFormat::MJPEG, 30);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| Error::Camera(format!("failed to open camera {}: {}", index, e)))?;
        camera
            .open_stream()
            .map_err(|e| Error::Camera(format!("failed to open camera stream: {}", e)))?;

        tracing::info!(
            "Camera {} streaming at {}x{}",
            index,
            camera.resolution().width(),
            camera.resolution().height()
        );
        Ok(Self { camera, mirror })
    }

    pub fn read_frame(&mut self) -> Result<RgbImage> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| Error::Camera(format!("failed to capture frame: {}", e)))?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::Camera(format!("failed to decode frame: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        let image = RgbImage::from_raw(width, height, decoded.into_vec())
            .ok_or_else(|| Error::Camera("decoded frame has an unexpected size".to_string()))?;

        if self.mirror {
            Ok(image::imageops::flip_horizontal(&image))
        } else {
            Ok(image)
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        } else {
            tracing::debug!("Camera released");
        }
    }
}

/// Sorted PNG/JPEG files from one directory, read one per frame.
pub struct StillsSource {
    pending: VecDeque<PathBuf>,
}

impl StillsSource {
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && is_still(&path) {
                files.push(path);
            }
        }
        files.sort();

        tracing::info!("Found {} still frame(s) in {}", files.len(), dir.as_ref().display());
        Ok(Self {
            pending: files.into(),
        })
    }

    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn next_still(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let image = image::open(&path)?;
        Ok(Some(image.to_rgb8()))
    }
}

fn is_still(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

pub fn log_available_cameras() {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => {
            tracing::info!("Found {} camera(s)", cameras.len());
            for (i, camera) in cameras.iter().enumerate() {
                tracing::info!("  [{}] {}", i, camera.human_name());
            }
        }
        Err(e) => tracing::warn!("Failed to query cameras: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stills_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn stills_are_read_in_name_order() {
        let dir = temp_dir();
        RgbImage::from_pixel(3, 2, Rgb([10, 0, 0])).save(dir.join("b.png")).unwrap();
        RgbImage::from_pixel(3, 2, Rgb([20, 0, 0])).save(dir.join("a.PNG")).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut source = FrameSource::stills(&dir).unwrap();
        if let FrameSource::Stills(stills) = &source {
            assert_eq!(stills.remaining(), 2);
        }

        let first = source.next_frame().unwrap();
        assert_eq!(first.dimensions(), (3, 2));
        assert_eq!(first.get_pixel(0, 0).0, [20, 0, 0]);
        assert_eq!(source.next_frame().unwrap().get_pixel(0, 0).0, [10, 0, 0]);
        assert!(source.next_frame().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_still_ends_the_stream() {
        let dir = temp_dir();
        std::fs::write(dir.join("broken.png"), b"definitely not png").unwrap();

        let mut source = FrameSource::stills(&dir).unwrap();
        assert!(source.next_frame().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(FrameSource::stills("/nonexistent/stills").is_err());
    }
}
