//! Landmark point types and validation of tracker input

use serde::{Deserialize, Serialize};

/// Number of landmarks per detected hand
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// Which hand the tracker believes it saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    /// Trackers that cannot tell are assumed to see a right hand
    #[default]
    Right,
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
        }
    }
}

/// A single tracked point, normalized to the camera frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    #[cfg(test)]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A 2D position in normalized frame coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Landmark> for Point {
    fn from(lm: Landmark) -> Self {
        Self { x: lm.x, y: lm.y }
    }
}

/// Raw per-hand payload as submitted by the tracker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandObservation {
    /// `[x, y, z]` triples in landmark order. Kept loose so a badly shaped
    /// point reaches validation instead of failing the whole request.
    pub landmarks: Vec<Vec<f32>>,
    #[serde(default)]
    pub handedness: Handedness,
}

/// Reasons a tracker payload cannot be used as a landmark set
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("expected {LANDMARK_COUNT} landmarks, got {0}")]
    WrongCount(usize),

    #[error("landmark {0} does not have exactly 3 coordinates")]
    WrongShape(usize),

    #[error("landmark {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// Validated 21-point hand with its handedness
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
    handedness: Handedness,
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT], handedness: Handedness) -> Self {
        Self { points, handedness }
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    /// Replace one landmark, used to build synthetic poses
    #[cfg(test)]
    pub fn with_point(mut self, index: usize, point: Landmark) -> Self {
        self.points[index] = point;
        self
    }
}

impl TryFrom<&HandObservation> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(obs: &HandObservation) -> Result<Self, Self::Error> {
        if obs.landmarks.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount(obs.landmarks.len()));
        }

        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (i, raw) in obs.landmarks.iter().enumerate() {
            let &[x, y, z] = raw.as_slice() else {
                return Err(LandmarkError::WrongShape(i));
            };
            if !(x.is_finite() && y.is_finite() && z.is_finite()) {
                return Err(LandmarkError::NonFinite(i));
            }
            points[i] = Landmark { x, y, z };
        }

        Ok(Self::new(points, obs.handedness))
    }
}
