// src/analysis.rs - Per-frame derivations for the scoliosis overlay
use crate::config::AssessmentConfig;
use crate::geometry::{angle, distance_cm, floor_mean, vertical_midpoint, Point};
use crate::landmarks::LandmarkSet;

/// Shoulders nearly on top of each other horizontally: the subject is side-on.
pub fn is_sideways_view(landmarks: &LandmarkSet, threshold_px: i32) -> bool {
    let dx = (landmarks.shoulder_left.x as i64 - landmarks.shoulder_right.x as i64).abs();
    dx < threshold_px as i64
}

/// Shoulders roughly level: the subject is facing away from the camera.
pub fn is_back_view(landmarks: &LandmarkSet, threshold_px: i32) -> bool {
    let dy = (landmarks.shoulder_left.y as i64 - landmarks.shoulder_right.y as i64).abs();
    dy <= threshold_px as i64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidewaysView {
    /// Ear-hip-ankle angle at the left hip.
    pub left_angle: Option<f64>,
    pub right_angle: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackView {
    pub mid_spine_x: i32,
    pub shoulder_inclination: Option<f64>,
    pub hip_inclination: Option<f64>,
}

/// Labelled points A-F: shoulders, shoulder/hip midpoints, hips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePoints {
    pub a: Point,
    pub b: Point,
    pub c: Point,
    pub d: Point,
    pub e: Point,
    pub f: Point,
}

impl ReferencePoints {
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        Self {
            a: landmarks.shoulder_left,
            b: landmarks.shoulder_right,
            c: vertical_midpoint(landmarks.shoulder_left, landmarks.hip_left),
            d: vertical_midpoint(landmarks.shoulder_right, landmarks.hip_right),
            e: landmarks.hip_left,
            f: landmarks.hip_right,
        }
    }

    pub fn labelled(&self) -> [(&'static str, Point); 6] {
        [
            ("A", self.a),
            ("B", self.b),
            ("C", self.c),
            ("D", self.d),
            ("E", self.e),
            ("F", self.f),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDistances {
    pub a_to_c: f64,
    pub b_to_d: f64,
    pub c_to_e: f64,
    pub d_to_f: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub landmarks: LandmarkSet,
    pub sideways: Option<SidewaysView>,
    pub back: Option<BackView>,
    pub reference: ReferencePoints,
    /// Shared horizontal reference through both shoulder/hip midpoints.
    pub mid_line_y: i32,
    pub connector_left: Point,
    pub connector_right: Point,
    pub distances: SegmentDistances,
}

impl FrameAnalysis {
    pub fn new(landmarks: LandmarkSet, config: &AssessmentConfig) -> Self {
        let sl = landmarks.shoulder_left;
        let sr = landmarks.shoulder_right;
        let hl = landmarks.hip_left;
        let hr = landmarks.hip_right;

        // The two views are independent and may both apply to one frame.
        let sideways = is_sideways_view(&landmarks, config.sideways_threshold_px).then(|| SidewaysView {
            left_angle: angle(landmarks.ear_left, hl, landmarks.ankle_left),
            right_angle: angle(landmarks.ear_right, hr, landmarks.ankle_right),
        });

        let back = is_back_view(&landmarks, config.back_threshold_px).then(|| {
            let mid_spine_x = floor_mean(sl.x, sr.x);
            BackView {
                mid_spine_x,
                shoulder_inclination: angle(sl, sr, Point::new(mid_spine_x, sl.y)),
                hip_inclination: angle(hl, hr, Point::new(mid_spine_x, hl.y)),
            }
        });

        let reference = ReferencePoints::from_landmarks(&landmarks);
        let mid_line_y = floor_mean(reference.c.y, reference.d.y);
        let connector_left = Point::new(sl.x, mid_line_y);
        let connector_right = Point::new(sr.x, mid_line_y);

        let scale = config.pixels_per_cm;
        let distances = SegmentDistances {
            a_to_c: distance_cm(sl, connector_left, scale),
            b_to_d: distance_cm(sr, connector_right, scale),
            c_to_e: distance_cm(connector_left, hl, scale),
            d_to_f: distance_cm(connector_right, hr, scale),
        };

        Self {
            landmarks,
            sideways,
            back,
            reference,
            mid_line_y,
            connector_left,
            connector_right,
            distances,
        }
    }
}
