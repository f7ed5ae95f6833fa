use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{self, GeometryError};

/// Number of landmarks in the 33-point BlazePose body schema.
pub const LANDMARK_COUNT: usize = 33;

/// One detected body point.
///
/// `x` and `y` are normalized to the frame width and height, `z` is the
/// model's relative depth (roughly the same scale as `x`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Landmark {
        Landmark {
            x,
            y,
            z,
            visibility,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Pixel location of the landmark in a `width` x `height` frame.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// The full landmark set detected in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    landmarks: Vec<Landmark>,
}

impl Pose {
    pub fn new(landmarks: Vec<Landmark>) -> Result<Pose> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(Error::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: landmarks.len(),
            });
        }
        Ok(Pose { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn landmark(&self, which: PoseLandmark) -> &Landmark {
        &self.landmarks[which as usize]
    }

    fn position_f64(&self, index: usize) -> std::result::Result<DVec3, GeometryError> {
        self.landmarks
            .get(index)
            .map(|l| l.position().as_dvec3())
            .ok_or(GeometryError::LandmarkOutOfRange {
                index,
                len: self.landmarks.len(),
            })
    }

    /// Angle between landmarks `a` and `b` taken as vectors from the origin.
    pub fn angle_between(&self, a: usize, b: usize) -> std::result::Result<u32, GeometryError> {
        geometry::angle_between_vectors(self.position_f64(a)?, self.position_f64(b)?)
    }

    /// Angle at landmark `vertex` spanned by the limbs towards `b` and `c`.
    pub fn angle_at(
        &self,
        vertex: usize,
        b: usize,
        c: usize,
    ) -> std::result::Result<u32, GeometryError> {
        geometry::angle_at_vertex(
            self.position_f64(vertex)?,
            self.position_f64(b)?,
            self.position_f64(c)?,
        )
    }
}

/// Landmark indices of the BlazePose schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

/// Skeleton edges drawn on annotated output images.
pub const POSE_CONNECTIONS: [(usize, usize); 35] = [
    // face
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    // arms
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    // torso
    (11, 23),
    (12, 24),
    (23, 24),
    // legs
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// Joint angles commonly tracked by a live exercise loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointAngle {
    LeftElbow,
    RightElbow,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

impl JointAngle {
    pub const ALL: [JointAngle; 8] = [
        JointAngle::LeftElbow,
        JointAngle::RightElbow,
        JointAngle::LeftShoulder,
        JointAngle::RightShoulder,
        JointAngle::LeftHip,
        JointAngle::RightHip,
        JointAngle::LeftKnee,
        JointAngle::RightKnee,
    ];

    /// (vertex, limb end, limb end)
    pub fn landmarks(&self) -> (PoseLandmark, PoseLandmark, PoseLandmark) {
        use PoseLandmark::*;
        match self {
            JointAngle::LeftElbow => (LeftElbow, LeftShoulder, LeftWrist),
            JointAngle::RightElbow => (RightElbow, RightShoulder, RightWrist),
            JointAngle::LeftShoulder => (LeftShoulder, LeftElbow, LeftHip),
            JointAngle::RightShoulder => (RightShoulder, RightElbow, RightHip),
            JointAngle::LeftHip => (LeftHip, LeftShoulder, LeftKnee),
            JointAngle::RightHip => (RightHip, RightShoulder, RightKnee),
            JointAngle::LeftKnee => (LeftKnee, LeftHip, LeftAnkle),
            JointAngle::RightKnee => (RightKnee, RightHip, RightAnkle),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JointAngle::LeftElbow => "left_elbow",
            JointAngle::RightElbow => "right_elbow",
            JointAngle::LeftShoulder => "left_shoulder",
            JointAngle::RightShoulder => "right_shoulder",
            JointAngle::LeftHip => "left_hip",
            JointAngle::RightHip => "right_hip",
            JointAngle::LeftKnee => "left_knee",
            JointAngle::RightKnee => "right_knee",
        }
    }

    /// Measures the joint on `pose`, `None` when the angle is undefined.
    pub fn measure(&self, pose: &Pose) -> Option<u32> {
        let (vertex, b, c) = self.landmarks();
        match pose.angle_at(vertex as usize, b as usize, c as usize) {
            Ok(angle) => Some(angle),
            Err(e) => {
                log::debug!("{} undefined: {}", self.name(), e);
                None
            }
        }
    }
}
