// src/pose.rs - Seam to the external body pose model
use crate::error::{Error, Result};
use crate::landmarks::NormalizedLandmark;
use image::RgbImage;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Body landmark detector. `Ok(None)` means nobody was found in the frame.
pub trait PoseEstimator {
    fn estimate(&mut self, frame: &RgbImage) -> Result<Option<Vec<NormalizedLandmark>>>;
}

/// Estimator that never detects anyone; frames pass through unannotated.
#[derive(Debug, Default)]
pub struct NullEstimator;

impl PoseEstimator for NullEstimator {
    fn estimate(&mut self, _frame: &RgbImage) -> Result<Option<Vec<NormalizedLandmark>>> {
        Ok(None)
    }
}

/// Replays landmarks written by an external pose model, one JSON value per
/// frame and per line: `null` or a BlazePose-ordered array of
/// `{"x": .., "y": .., "z": .., "visibility": ..}` objects.
pub struct ReplayEstimator<R: BufRead> {
    reader: R,
    line: usize,
    exhausted: bool,
}

impl ReplayEstimator<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::info!("Replaying pose landmarks from {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayEstimator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            exhausted: false,
        }
    }
}

impl<R: BufRead> PoseEstimator for ReplayEstimator<R> {
    fn estimate(&mut self, _frame: &RgbImage) -> Result<Option<Vec<NormalizedLandmark>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            tracing::info!("Landmark stream ended after {} frames", self.line);
            self.exhausted = true;
            return Ok(None);
        }
        self.line += 1;

        let text = buf.trim();
        if text.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(text).map_err(|e| Error::LandmarkStream {
            line: self.line,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn null_estimator_never_detects() {
        let frame = RgbImage::new(4, 4);
        assert_eq!(NullEstimator.estimate(&frame).unwrap(), None);
    }

    #[test]
    fn replays_frames_in_order() {
        let stream = "null\n[{\"x\":0.25,\"y\":0.5}]\n\n[]\n";
        let mut estimator = ReplayEstimator::new(Cursor::new(stream));
        let frame = RgbImage::new(4, 4);

        assert_eq!(estimator.estimate(&frame).unwrap(), None);

        let second = estimator.estimate(&frame).unwrap().unwrap();
        assert_eq!(second, vec![NormalizedLandmark::new(0.25, 0.5)]);

        assert_eq!(estimator.estimate(&frame).unwrap(), None);
        assert_eq!(estimator.estimate(&frame).unwrap(), Some(vec![]));

        // past the end every frame is empty
        assert_eq!(estimator.estimate(&frame).unwrap(), None);
        assert_eq!(estimator.estimate(&frame).unwrap(), None);
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let mut estimator = ReplayEstimator::new(Cursor::new("null\n{oops\n"));
        let frame = RgbImage::new(4, 4);

        estimator.estimate(&frame).unwrap();
        let err = estimator.estimate(&frame).unwrap_err();
        assert!(matches!(err, Error::LandmarkStream { line: 2, .. }));
    }
}
