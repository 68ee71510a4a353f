// src/overlay.rs - Draws the assessment annotations onto a frame
use crate::analysis::{BackView, FrameAnalysis, SidewaysView};
use crate::config::{AssessmentConfig, Offset, OverlayLayout};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::landmarks::PoseLandmark;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use std::path::Path;

pub type Color = [u8; 3];

pub mod palette {
    use super::Color;

    pub const TORSO: Color = [0, 255, 0];
    pub const EAR: Color = [0, 0, 255];
    pub const ANKLE: Color = [255, 0, 0];
    pub const TEXT: Color = [255, 255, 255];
    pub const SIDE_ALIGNMENT: Color = [200, 200, 255];
    pub const LEVEL_LINE: Color = [255, 255, 0];
    pub const SHOULDER_DROP: Color = [0, 0, 255];
    pub const HIP_RISE: Color = [0, 255, 0];
}

/// Minimal drawing surface the overlay needs.
pub trait Canvas {
    fn circle(&mut self, center: Point, radius: i32, color: Color);

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: u32);

    /// `origin` is the left end of the text baseline.
    fn text(&mut self, origin: Point, text: &str, scale: f32, color: Color);
}

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| Error::Font {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| Error::Font {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Canvas over an RGB frame. Text is skipped when no font is available.
pub struct ImageCanvas<'a> {
    image: &'a mut RgbImage,
    font: Option<&'a FontVec>,
}

impl<'a> ImageCanvas<'a> {
    pub fn new(image: &'a mut RgbImage, font: Option<&'a FontVec>) -> Self {
        Self { image, font }
    }
}

impl Canvas for ImageCanvas<'_> {
    fn circle(&mut self, center: Point, radius: i32, color: Color) {
        draw_filled_circle_mut(&mut *self.image, (center.x, center.y), radius, Rgb(color));
    }

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: u32) {
        let (x0, y0) = (from.x as f32, from.y as f32);
        let (x1, y1) = (to.x as f32, to.y as f32);

        let (dx, dy) = (x1 - x0, y1 - y0);
        let length = (dx * dx + dy * dy).sqrt();
        let (nx, ny) = if length > 0.0 {
            (-dy / length, dx / length)
        } else {
            (1.0, 0.0)
        };

        let thickness = thickness.max(1);
        let centre = (thickness - 1) as f32 / 2.0;
        for k in 0..thickness {
            let shift = k as f32 - centre;
            draw_line_segment_mut(
                &mut *self.image,
                (x0 + nx * shift, y0 + ny * shift),
                (x1 + nx * shift, y1 + ny * shift),
                Rgb(color),
            );
        }
    }

    fn text(&mut self, origin: Point, text: &str, scale: f32, color: Color) {
        let Some(font) = self.font else {
            return;
        };
        let top = origin.y.saturating_sub(scale.round() as i32);
        draw_text_mut(&mut *self.image, Rgb(color), origin.x, top, PxScale::from(scale), font, text);
    }
}

fn landmark_color(landmark: PoseLandmark) -> Color {
    match landmark {
        PoseLandmark::LeftShoulder
        | PoseLandmark::RightShoulder
        | PoseLandmark::LeftHip
        | PoseLandmark::RightHip => palette::TORSO,
        PoseLandmark::LeftEar | PoseLandmark::RightEar => palette::EAR,
        PoseLandmark::LeftAnkle | PoseLandmark::RightAnkle => palette::ANKLE,
    }
}

fn shifted(point: Point, offset: Offset) -> Point {
    Point::new(point.x.saturating_add(offset.dx), point.y.saturating_add(offset.dy))
}

fn origin(offset: Offset) -> Point {
    Point::new(offset.dx, offset.dy)
}

/// Renders every annotation for a frame in which a person was found.
pub fn draw_overlay<C: Canvas + ?Sized>(canvas: &mut C, analysis: &FrameAnalysis, config: &AssessmentConfig) {
    let layout = &config.layout;

    draw_landmarks(canvas, analysis, layout);
    draw_labels(canvas, analysis, layout);

    if let Some(sideways) = &analysis.sideways {
        draw_sideways_view(canvas, analysis, sideways, layout);
    }
    if let Some(back) = &analysis.back {
        draw_back_view(canvas, analysis, back, layout);
    }

    draw_connecting_lines(canvas, analysis, layout);
    draw_distances(canvas, analysis, layout);
}

fn draw_landmarks<C: Canvas + ?Sized>(canvas: &mut C, analysis: &FrameAnalysis, layout: &OverlayLayout) {
    for (landmark, point) in analysis.landmarks.iter() {
        canvas.circle(point, layout.dot_radius, landmark_color(landmark));
    }
}

fn draw_labels<C: Canvas + ?Sized>(canvas: &mut C, analysis: &FrameAnalysis, layout: &OverlayLayout) {
    for (label, point) in analysis.reference.labelled() {
        canvas.text(shifted(point, layout.label_offset), label, layout.label_scale, palette::TEXT);
    }
}

fn draw_sideways_view<C: Canvas + ?Sized>(
    canvas: &mut C,
    analysis: &FrameAnalysis,
    sideways: &SidewaysView,
    layout: &OverlayLayout,
) {
    let lm = &analysis.landmarks;
    let segments = [
        (lm.ear_left, lm.hip_left),
        (lm.hip_left, lm.ankle_left),
        (lm.ear_right, lm.hip_right),
        (lm.hip_right, lm.ankle_right),
    ];
    for (from, to) in segments {
        canvas.line(from, to, palette::SIDE_ALIGNMENT, layout.line_thickness);
    }

    if let Some(left) = sideways.left_angle {
        canvas.text(
            origin(layout.first_readout),
            &format!("Left Angle: {:.2}", left),
            layout.readout_scale,
            palette::TEXT,
        );
    }
    if let Some(right) = sideways.right_angle {
        canvas.text(
            origin(layout.second_readout),
            &format!("Right Angle: {:.2}", right),
            layout.readout_scale,
            palette::TEXT,
        );
    }
}

fn draw_back_view<C: Canvas + ?Sized>(
    canvas: &mut C,
    analysis: &FrameAnalysis,
    back: &BackView,
    layout: &OverlayLayout,
) {
    let lm = &analysis.landmarks;
    canvas.line(lm.shoulder_left, lm.shoulder_right, palette::LEVEL_LINE, layout.line_thickness);
    canvas.line(lm.hip_left, lm.hip_right, palette::LEVEL_LINE, layout.line_thickness);

    if let Some(shoulder) = back.shoulder_inclination {
        canvas.text(
            origin(layout.first_readout),
            &format!("Shoulder Inclination: {:.2}", shoulder),
            layout.readout_scale,
            palette::TEXT,
        );
    }
    if let Some(hip) = back.hip_inclination {
        canvas.text(
            origin(layout.second_readout),
            &format!("Hip Inclination: {:.2}", hip),
            layout.readout_scale,
            palette::TEXT,
        );
    }
}

fn draw_connecting_lines<C: Canvas + ?Sized>(canvas: &mut C, analysis: &FrameAnalysis, layout: &OverlayLayout) {
    let lm = &analysis.landmarks;
    let c = analysis.connector_left;
    let d = analysis.connector_right;
    let t = layout.line_thickness;

    canvas.line(lm.shoulder_left, c, palette::SHOULDER_DROP, t);
    canvas.line(lm.shoulder_right, d, palette::SHOULDER_DROP, t);
    canvas.line(c, lm.hip_left, palette::HIP_RISE, t);
    canvas.line(d, lm.hip_right, palette::HIP_RISE, t);
    canvas.line(c, d, palette::LEVEL_LINE, t);
}

fn draw_distances<C: Canvas + ?Sized>(canvas: &mut C, analysis: &FrameAnalysis, layout: &OverlayLayout) {
    let lm = &analysis.landmarks;
    let d = &analysis.distances;
    let left = Offset::new(layout.left_distance_dx, layout.hip_distance_dy);
    let right = Offset::new(layout.right_distance_dx, layout.hip_distance_dy);
    let on_mid_line = |p: Point| Point::new(p.x, analysis.mid_line_y);

    let readouts = [
        (
            shifted(on_mid_line(lm.shoulder_left), Offset::new(left.dx, 0)),
            format!("A to C: {:.2} cm", d.a_to_c),
        ),
        (
            shifted(on_mid_line(lm.shoulder_right), Offset::new(right.dx, 0)),
            format!("B to D: {:.2} cm", d.b_to_d),
        ),
        (shifted(lm.hip_left, left), format!("C to E: {:.2} cm", d.c_to_e)),
        (shifted(lm.hip_right, right), format!("D to F: {:.2} cm", d.d_to_f)),
    ];

    for (position, text) in readouts {
        canvas.text(position, &text, layout.distance_scale, palette::TEXT);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::landmarks::LandmarkSet;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum DrawCall {
        Circle(Point, Color),
        Line(Point, Point, Color),
        Text(Point, String),
    }

    #[derive(Default)]
    pub(crate) struct RecordingCanvas {
        pub(crate) calls: Vec<DrawCall>,
    }

    impl RecordingCanvas {
        pub(crate) fn texts(&self) -> Vec<(Point, String)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Text(p, t) => Some((*p, t.clone())),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(*c)).count()
        }
    }

    impl Canvas for RecordingCanvas {
        fn circle(&mut self, center: Point, _radius: i32, color: Color) {
            self.calls.push(DrawCall::Circle(center, color));
        }

        fn line(&mut self, from: Point, to: Point, color: Color, _thickness: u32) {
            self.calls.push(DrawCall::Line(from, to, color));
        }

        fn text(&mut self, origin: Point, text: &str, _scale: f32, _color: Color) {
            self.calls.push(DrawCall::Text(origin, text.to_string()));
        }
    }

    fn back_view_landmarks() -> LandmarkSet {
        LandmarkSet {
            shoulder_left: Point::new(400, 200),
            shoulder_right: Point::new(240, 210),
            hip_left: Point::new(380, 420),
            hip_right: Point::new(260, 430),
            ear_left: Point::new(360, 120),
            ear_right: Point::new(280, 122),
            ankle_left: Point::new(385, 800),
            ankle_right: Point::new(255, 805),
        }
    }

    #[test]
    fn back_view_frame_draws_expected_primitives() {
        let config = AssessmentConfig::default();
        let analysis = FrameAnalysis::new(back_view_landmarks(), &config);
        let mut canvas = RecordingCanvas::default();

        draw_overlay(&mut canvas, &analysis, &config);

        assert_eq!(canvas.count(|c| matches!(c, DrawCall::Circle(..))), 8);
        // 2 level lines + 5 connecting lines
        assert_eq!(canvas.count(|c| matches!(c, DrawCall::Line(..))), 7);
        // 6 labels + 2 inclinations + 4 distances
        assert_eq!(canvas.count(|c| matches!(c, DrawCall::Text(..))), 12);

        assert!(canvas
            .calls
            .contains(&DrawCall::Circle(Point::new(360, 120), palette::EAR)));
        assert!(canvas
            .calls
            .contains(&DrawCall::Circle(Point::new(255, 805), palette::ANKLE)));
        assert!(canvas
            .calls
            .contains(&DrawCall::Line(Point::new(400, 315), Point::new(240, 315), palette::LEVEL_LINE)));
    }

    #[test]
    fn labels_and_distances_use_fixed_offsets() {
        let config = AssessmentConfig::default();
        let analysis = FrameAnalysis::new(back_view_landmarks(), &config);
        let mut canvas = RecordingCanvas::default();

        draw_overlay(&mut canvas, &analysis, &config);
        let texts = canvas.texts();

        assert!(texts.contains(&(Point::new(390, 190), "A".to_string())));
        assert!(texts.contains(&(Point::new(390, 300), "C".to_string())));
        assert!(texts.contains(&(Point::new(500, 315), "A to C: 3.83 cm".to_string())));
        assert!(texts.contains(&(Point::new(-260, 315), "B to D: 3.50 cm".to_string())));
        assert!(texts.contains(&(Point::new(480, 450), "C to E: 3.56 cm".to_string())));
        assert!(texts
            .iter()
            .any(|(p, t)| *p == Point::new(-240, 460) && t.starts_with("D to F: ")));
    }

    #[test]
    fn overlapping_views_share_readout_positions() {
        let config = AssessmentConfig::default();
        let mut landmarks = back_view_landmarks();
        landmarks.shoulder_right = Point::new(390, 205);
        let analysis = FrameAnalysis::new(landmarks, &config);
        let mut canvas = RecordingCanvas::default();

        draw_overlay(&mut canvas, &analysis, &config);
        let at_first: Vec<_> = canvas
            .texts()
            .into_iter()
            .filter(|(p, _)| *p == Point::new(10, 30))
            .map(|(_, t)| t)
            .collect();

        assert_eq!(at_first.len(), 2);
        assert!(at_first[0].starts_with("Left Angle: "));
        assert!(at_first[1].starts_with("Shoulder Inclination: "));
        // 4 sideways + 2 level + 5 connecting
        assert_eq!(canvas.count(|c| matches!(c, DrawCall::Line(..))), 11);
    }

    #[test]
    fn undefined_angles_are_not_printed() {
        let config = AssessmentConfig::default();
        let mut landmarks = back_view_landmarks();
        landmarks.shoulder_right = landmarks.shoulder_left;
        let analysis = FrameAnalysis::new(landmarks, &config);
        let mut canvas = RecordingCanvas::default();

        draw_overlay(&mut canvas, &analysis, &config);
        let texts = canvas.texts();

        assert!(!texts.iter().any(|(_, t)| t.starts_with("Shoulder Inclination")));
        assert!(texts.iter().any(|(_, t)| t.starts_with("Hip Inclination")));
    }

    #[test]
    fn custom_layout_moves_readouts() {
        let mut config = AssessmentConfig::default();
        config.layout.left_distance_dx = 40;
        config.layout.label_offset = Offset::new(0, 0);
        let analysis = FrameAnalysis::new(back_view_landmarks(), &config);
        let mut canvas = RecordingCanvas::default();

        draw_overlay(&mut canvas, &analysis, &config);
        let texts = canvas.texts();

        assert!(texts.contains(&(Point::new(440, 315), "A to C: 3.83 cm".to_string())));
        assert!(texts.contains(&(Point::new(400, 200), "A".to_string())));
    }

    #[test]
    fn image_canvas_draws_shapes_and_skips_text_without_font() {
        let mut image = RgbImage::new(64, 64);
        {
            let mut canvas = ImageCanvas::new(&mut image, None);
            canvas.line(Point::new(0, 10), Point::new(63, 10), palette::LEVEL_LINE, 2);
            canvas.circle(Point::new(40, 40), 5, palette::EAR);
            canvas.text(Point::new(5, 60), "A", 48.0, palette::TEXT);
            // off-frame primitives are clipped
            canvas.line(Point::new(-500, -500), Point::new(-10, 900), palette::TORSO, 2);
            canvas.circle(Point::new(1000, 1000), 5, palette::ANKLE);
        }

        assert_eq!(image.get_pixel(30, 10).0, palette::LEVEL_LINE);
        assert_eq!(image.get_pixel(40, 40).0, palette::EAR);
        assert_eq!(image.get_pixel(5, 55).0, [0, 0, 0]);
    }

    #[test]
    fn offsets_saturate_at_the_coordinate_limits() {
        let config = AssessmentConfig::default();
        let mut landmarks = back_view_landmarks();
        landmarks.shoulder_left = Point::new(i32::MAX - 20, 200);
        landmarks.hip_right = Point::new(i32::MIN + 20, i32::MAX - 5);
        let analysis = FrameAnalysis::new(landmarks, &config);
        let mut canvas = RecordingCanvas::default();

        draw_overlay(&mut canvas, &analysis, &config);
        let texts = canvas.texts();

        assert!(texts
            .iter()
            .any(|(p, t)| *p == Point::new(i32::MAX, analysis.mid_line_y) && t.starts_with("A to C")));
        assert!(texts
            .iter()
            .any(|(p, t)| *p == Point::new(i32::MIN, i32::MAX) && t.starts_with("D to F")));
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = load_font(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, Error::Font { .. }));
    }
}
