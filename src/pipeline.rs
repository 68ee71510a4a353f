// src/pipeline.rs - Estimator -> geometry -> overlay, one frame at a time
use crate::analysis::FrameAnalysis;
use crate::capture::FrameSource;
use crate::config::AssessmentConfig;
use crate::error::Result;
use crate::landmarks::extract_coordinates;
use crate::overlay::{draw_overlay, load_font, Canvas, ImageCanvas};
use crate::pose::PoseEstimator;
use ab_glyph::FontVec;
use image::RgbImage;
use std::path::{Path, PathBuf};

pub struct FramePipeline {
    estimator: Box<dyn PoseEstimator>,
    config: AssessmentConfig,
    font: Option<FontVec>,
}

impl FramePipeline {
    pub fn new(estimator: Box<dyn PoseEstimator>, config: AssessmentConfig) -> Self {
        let font = match &config.font_path {
            Some(path) => match load_font(path) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!("{}; text overlays disabled", e);
                    None
                }
            },
            None => None,
        };

        Self {
            estimator,
            config,
            font,
        }
    }

    #[cfg(test)]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Runs the estimator and derives the geometry. `None` when no person is
    /// in the frame.
    pub fn analyze(&mut self, frame: &RgbImage) -> Result<Option<FrameAnalysis>> {
        let Some(raw) = self.estimator.estimate(frame)? else {
            return Ok(None);
        };

        let (width, height) = frame.dimensions();
        match extract_coordinates(&raw, height, width) {
            Some(landmarks) => Ok(Some(FrameAnalysis::new(landmarks, &self.config))),
            None => {
                tracing::debug!("Pose output had {} landmarks, treating frame as empty", raw.len());
                Ok(None)
            }
        }
    }

    pub fn annotate<C: Canvas + ?Sized>(
        &mut self,
        frame: &RgbImage,
        canvas: &mut C,
    ) -> Result<Option<FrameAnalysis>> {
        let analysis = self.analyze(frame)?;
        if let Some(analysis) = &analysis {
            draw_overlay(canvas, analysis, &self.config);
        }
        Ok(analysis)
    }

    /// Annotates `frame` in place. Frames without a person are left untouched.
    pub fn process(&mut self, frame: &mut RgbImage) -> Result<Option<FrameAnalysis>> {
        let analysis = self.analyze(frame)?;
        if let Some(analysis) = &analysis {
            let mut canvas = ImageCanvas::new(frame, self.font.as_ref());
            draw_overlay(&mut canvas, analysis, &self.config);
        }
        Ok(analysis)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub frames: usize,
    pub with_person: usize,
    pub outputs: Vec<PathBuf>,
}

/// Window-less run: annotates every frame and writes `annotated_{n}.png`.
pub fn run_batch(
    source: &mut FrameSource,
    pipeline: &mut FramePipeline,
    output_dir: &Path,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)?;
    let mut summary = BatchSummary::default();

    while let Some(mut frame) = source.next_frame() {
        if pipeline.process(&mut frame)?.is_some() {
            summary.with_person += 1;
        }

        let path = output_dir.join(format!("annotated_{}.png", summary.frames));
        frame.save(&path)?;
        summary.outputs.push(path);
        summary.frames += 1;
    }

    tracing::info!(
        "Annotated {} frame(s), person found in {}",
        summary.frames,
        summary.with_person
    );
    Ok(summary)
}
