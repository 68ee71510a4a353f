// src/app.rs
use crate::analysis::FrameAnalysis;
use crate::capture::FrameSource;
use crate::pipeline::FramePipeline;
use crate::snapshot::{SnapshotKind, SnapshotWriter};

use image::RgbImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Snapshot(SnapshotKind),
    Exit,
}

pub fn key_action(key: egui::Key) -> Option<KeyAction> {
    match key {
        egui::Key::Num1 => Some(KeyAction::Snapshot(SnapshotKind::Sideways)),
        egui::Key::Num2 => Some(KeyAction::Snapshot(SnapshotKind::Back)),
        egui::Key::Num3 => Some(KeyAction::Snapshot(SnapshotKind::BackCrouch)),
        egui::Key::Escape => Some(KeyAction::Exit),
        _ => None,
    }
}

const WATCHED_KEYS: [egui::Key; 4] = [
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Escape,
];

pub struct AssessmentApp {
    // Capture handle, dropped (and released) when the session ends
    source: Option<FrameSource>,
    pipeline: FramePipeline,
    snapshots: SnapshotWriter,

    // Display state
    current_frame: Option<RgbImage>,
    last_analysis: Option<FrameAnalysis>,
    texture: Option<egui::TextureHandle>,
    frames_shown: u64,
}

impl AssessmentApp {
    pub fn new(source: FrameSource, pipeline: FramePipeline, snapshots: SnapshotWriter) -> Self {
        Self {
            source: Some(source),
            pipeline,
            snapshots,
            current_frame: None,
            last_analysis: None,
            texture: None,
            frames_shown: 0,
        }
    }

    /// Pulls and annotates the next frame. Returns `false` when the session is over.
    fn advance(&mut self, ctx: &egui::Context) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        let Some(mut frame) = source.next_frame() else {
            tracing::info!("End of stream after {} frames", self.frames_shown);
            return false;
        };

        match self.pipeline.process(&mut frame) {
            Ok(analysis) => self.last_analysis = analysis,
            Err(e) => {
                tracing::error!("Pose estimation failed: {}", e);
                return false;
            }
        }

        self.upload_texture(ctx, &frame);
        self.current_frame = Some(frame);
        self.frames_shown += 1;
        true
    }

    fn upload_texture(&mut self, ctx: &egui::Context, frame: &RgbImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, frame.as_raw());

        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()));
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) -> bool {
        let pressed: Vec<KeyAction> = ctx.input(|i| {
            WATCHED_KEYS
                .iter()
                .filter(|key| i.key_pressed(**key))
                .filter_map(|key| key_action(*key))
                .collect()
        });

        for action in pressed {
            match action {
                KeyAction::Snapshot(kind) => {
                    if let Some(frame) = &self.current_frame {
                        if let Err(e) = self.snapshots.save(frame, kind) {
                            tracing::error!("Failed to save snapshot: {}", e);
                        }
                    }
                }
                KeyAction::Exit => return false,
            }
        }
        true
    }

    fn close(&mut self, ctx: &egui::Context) {
        if self.source.take().is_some() {
            tracing::info!(
                "Closing session, {} snapshot(s) saved",
                self.snapshots.saved()
            );
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn status_line(&self) -> String {
        match &self.last_analysis {
            None => "No person detected".to_string(),
            Some(analysis) => match (analysis.sideways.is_some(), analysis.back.is_some()) {
                (true, true) => "Sideways and back view".to_string(),
                (true, false) => "Sideways view".to_string(),
                (false, true) => "Back view".to_string(),
                (false, false) => "Person detected".to_string(),
            },
        }
    }

    fn render_frame(&self, ui: &mut egui::Ui) {
        let (Some(texture), Some(frame)) = (self.texture.as_ref(), self.current_frame.as_ref()) else {
            ui.centered_and_justified(|ui| {
                ui.label("No video feed available");
            });
            return;
        };

        let available = ui.available_size();
        let scale = (available.x / frame.width() as f32)
            .min(available.y / frame.height() as f32)
            .max(0.1);
        let size = egui::vec2(frame.width() as f32 * scale, frame.height() as f32 * scale);

        ui.centered_and_justified(|ui| {
            ui.image((texture.id(), size));
        });
    }
}

impl eframe::App for AssessmentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.source.is_some() && !self.advance(ctx) {
            self.close(ctx);
            return;
        }

        if !self.handle_keys(ctx) {
            self.close(ctx);
            return;
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_line());
                ui.separator();
                ui.label(format!("Snapshots: {}", self.snapshots.saved()));
                ui.separator();
                ui.label("1/2/3 snapshot, Esc quit");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_frame(ui);
        });

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_take_snapshots_and_escape_exits() {
        assert_eq!(
            key_action(egui::Key::Num1),
            Some(KeyAction::Snapshot(SnapshotKind::Sideways))
        );
        assert_eq!(
            key_action(egui::Key::Num2),
            Some(KeyAction::Snapshot(SnapshotKind::Back))
        );
        assert_eq!(
            key_action(egui::Key::Num3),
            Some(KeyAction::Snapshot(SnapshotKind::BackCrouch))
        );
        assert_eq!(key_action(egui::Key::Escape), Some(KeyAction::Exit));
        assert_eq!(key_action(egui::Key::Q), None);
    }

    #[test]
    fn every_watched_key_has_an_action() {
        assert!(WATCHED_KEYS.iter().all(|key| key_action(*key).is_some()));
    }
}
