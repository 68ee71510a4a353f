// src/landmarks.rs
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// BlazePose landmark indices used by the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    LeftEar = 7,
    RightEar = 8,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftHip = 23,
    RightHip = 24,
    LeftAnkle = 27,
    RightAnkle = 28,
}

impl PoseLandmark {
    pub const ALL: [PoseLandmark; 8] = [
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftEar,
        PoseLandmark::RightEar,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    #[cfg(test)]
    pub fn name(self) -> &'static str {
        match self {
            PoseLandmark::LeftEar => "ear_left",
            PoseLandmark::RightEar => "ear_right",
            PoseLandmark::LeftShoulder => "shoulder_left",
            PoseLandmark::RightShoulder => "shoulder_right",
            PoseLandmark::LeftHip => "hip_left",
            PoseLandmark::RightHip => "hip_right",
            PoseLandmark::LeftAnkle => "ankle_left",
            PoseLandmark::RightAnkle => "ankle_right",
        }
    }
}

/// Landmark as reported by the pose model, x and y normalized to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "full_visibility")]
    pub visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

impl NormalizedLandmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }
}

/// Pixel positions of the landmarks for the current frame only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkSet {
    pub shoulder_left: Point,
    pub shoulder_right: Point,
    pub hip_left: Point,
    pub hip_right: Point,
    pub ear_left: Point,
    pub ear_right: Point,
    pub ankle_left: Point,
    pub ankle_right: Point,
}

impl LandmarkSet {
    pub fn get(&self, landmark: PoseLandmark) -> Point {
        match landmark {
            PoseLandmark::LeftEar => self.ear_left,
            PoseLandmark::RightEar => self.ear_right,
            PoseLandmark::LeftShoulder => self.shoulder_left,
            PoseLandmark::RightShoulder => self.shoulder_right,
            PoseLandmark::LeftHip => self.hip_left,
            PoseLandmark::RightHip => self.hip_right,
            PoseLandmark::LeftAnkle => self.ankle_left,
            PoseLandmark::RightAnkle => self.ankle_right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoseLandmark, Point)> + '_ {
        PoseLandmark::ALL.into_iter().map(move |lm| (lm, self.get(lm)))
    }
}

/// Furthest a landmark may sit outside the frame, in frame sizes.
const MAX_FRAME_SPAN: f64 = 4.0;
/// Hard cap on any pixel coordinate, leaving headroom for overlay offsets.
const MAX_PIXEL: f64 = (1 << 24) as f64;

fn scale_axis(normalized: f64, extent: u32) -> i32 {
    let limit = (extent as f64 * MAX_FRAME_SPAN).min(MAX_PIXEL);
    // `as` truncates toward zero
    (normalized * extent as f64).clamp(-limit, limit) as i32
}

fn to_pixel(landmark: &NormalizedLandmark, height: u32, width: u32) -> Option<Point> {
    if !(landmark.x.is_finite() && landmark.y.is_finite()) {
        return None;
    }
    Some(Point::new(
        scale_axis(landmark.x, width),
        scale_axis(landmark.y, height),
    ))
}

/// Scales normalized landmarks to pixels. `None` when no person was detected
/// or the model output lacks one of the required landmarks. Non-finite
/// coordinates count as missing; far off-frame ones are pulled in to within
/// four frame sizes.
pub fn extract_coordinates(
    landmarks: &[NormalizedLandmark],
    height: u32,
    width: u32,
) -> Option<LandmarkSet> {
    if landmarks.is_empty() {
        return None;
    }

    let pixel = |lm: PoseLandmark| landmarks.get(lm.index()).and_then(|l| to_pixel(l, height, width));

    let set = LandmarkSet {
        shoulder_left: pixel(PoseLandmark::LeftShoulder)?,
        shoulder_right: pixel(PoseLandmark::RightShoulder)?,
        hip_left: pixel(PoseLandmark::LeftHip)?,
        hip_right: pixel(PoseLandmark::RightHip)?,
        ear_left: pixel(PoseLandmark::LeftEar)?,
        ear_right: pixel(PoseLandmark::RightEar)?,
        ankle_left: pixel(PoseLandmark::LeftAnkle)?,
        ankle_right: pixel(PoseLandmark::RightAnkle)?,
    };
    Some(set)
}
