//! Finger extension and scale-invariant distance helpers

use super::points::{
    Handedness, Landmark, LandmarkSet, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_MCP, THUMB_TIP, WRIST,
};

/// Keeps the palm-scale denominator away from zero
const SCALE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Fingertip landmark index
    pub fn tip(self) -> usize {
        match self {
            Finger::Thumb => THUMB_TIP,
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Pinky => PINKY_TIP,
        }
    }

    /// Joint the tip is compared against: MCP for the thumb, PIP otherwise
    pub fn reference_joint(self) -> usize {
        match self {
            Finger::Thumb => THUMB_MCP,
            Finger::Index => INDEX_PIP,
            Finger::Middle => MIDDLE_PIP,
            Finger::Ring => RING_PIP,
            Finger::Pinky => PINKY_PIP,
        }
    }
}

/// Whether `finger` is extended.
///
/// Long fingers are extended when the tip sits above the PIP joint (smaller
/// `y` in camera space). The thumb abducts sideways, so it is compared on
/// `x` and the direction depends on which hand it is.
pub fn finger_extended(landmarks: &LandmarkSet, finger: Finger, handedness: Handedness) -> bool {
    let tip = landmarks.point(finger.tip());
    let joint = landmarks.point(finger.reference_joint());

    match finger {
        Finger::Thumb => match handedness {
            Handedness::Right => tip.x < joint.x,
            Handedness::Left => tip.x > joint.x,
        },
        _ => tip.y < joint.y,
    }
}

/// Planar distance between `p` and `q`, divided by the distance between
/// the two scale references
pub fn normalized_distance(p: Landmark, q: Landmark, scale_a: Landmark, scale_b: Landmark) -> f32 {
    planar(p, q) / (planar(scale_a, scale_b) + SCALE_EPSILON)
}

/// Distance between two landmarks of a hand in units of palm length
/// (wrist to middle-finger base)
pub fn palm_distance(landmarks: &LandmarkSet, a: usize, b: usize) -> f32 {
    normalized_distance(
        landmarks.point(a),
        landmarks.point(b),
        landmarks.point(WRIST),
        landmarks.point(MIDDLE_MCP),
    )
}

fn planar(a: Landmark, b: Landmark) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Extension state of all five fingers for one hand in one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    /// Evaluate every finger using the set's own handedness
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        let handedness = landmarks.handedness();
        let ext = |finger| finger_extended(landmarks, finger, handedness);
        Self {
            thumb: ext(Finger::Thumb),
            index: ext(Finger::Index),
            middle: ext(Finger::Middle),
            ring: ext(Finger::Ring),
            pinky: ext(Finger::Pinky),
        }
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    /// Every finger extended
    pub fn all(&self) -> bool {
        Finger::ALL.iter().all(|f| self.is_extended(*f))
    }

    /// No finger extended
    pub fn none(&self) -> bool {
        !Finger::ALL.iter().any(|f| self.is_extended(*f))
    }

    /// Exactly the given fingers are extended and every other one is curled
    pub fn exactly(&self, fingers: &[Finger]) -> bool {
        Finger::ALL
            .iter()
            .all(|f| self.is_extended(*f) == fingers.contains(f))
    }
}
