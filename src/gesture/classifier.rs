//! Frame classifier
//!
//! Turns the zero, one or two hands seen in a frame into the set of
//! gesture labels whose predicates hold, plus the index-fingertip pointer.

use tracing::debug;

use crate::landmarks::{
    palm_distance, Finger, FingerState, HandObservation, LandmarkSet, Point, INDEX_TIP, THUMB_TIP,
};

use super::labels::GestureLabel;

/// Geometry of one hand that every predicate reads from
#[derive(Debug, Clone, Copy)]
struct HandPose {
    fingers: FingerState,
    /// Thumb-tip to index-tip distance in palm lengths
    pinch: f32,
}

impl HandPose {
    fn measure(set: &LandmarkSet) -> Self {
        Self {
            fingers: FingerState::from_landmarks(set),
            pinch: palm_distance(set, THUMB_TIP, INDEX_TIP),
        }
    }
}

/// Classification result for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameGestures {
    matched: Vec<GestureLabel>,
    pointer: Option<Point>,
}

impl FrameGestures {
    /// No hands, nothing matched
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every label whose predicate held, in evaluation order
    #[cfg(test)]
    pub fn labels(&self) -> &[GestureLabel] {
        &self.matched
    }

    pub fn contains(&self, label: GestureLabel) -> bool {
        self.matched.contains(&label)
    }

    /// Highest-priority label of the exclusive vocabulary
    pub fn exclusive(&self) -> Option<GestureLabel> {
        GestureLabel::EXCLUSIVE_PRIORITY
            .into_iter()
            .find(|label| self.contains(*label))
    }

    /// Labels the multi-label policy routes (its vocabulary and the toggle)
    pub fn multi_label(&self) -> impl Iterator<Item = GestureLabel> + '_ {
        self.matched
            .iter()
            .copied()
            .filter(|label| !GestureLabel::EXCLUSIVE_PRIORITY.contains(label))
    }

    /// Index fingertip, present whenever the index finger is extended
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }
}

/// Stateless per-frame gesture classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    pinch_threshold: f32,
    enabled: Vec<GestureLabel>,
}

impl Classifier {
    /// Create a classifier testing `enabled` multi-label predicates.
    ///
    /// The exclusive vocabulary and the two-hand toggle are always tested.
    pub fn new(pinch_threshold: f32, enabled: Vec<GestureLabel>) -> Self {
        Self {
            pinch_threshold,
            enabled,
        }
    }

    /// Classify the hands seen in one frame.
    ///
    /// Only the first two hands are considered. A malformed hand degrades
    /// the whole frame to an empty result.
    pub fn classify(&self, hands: &[HandObservation]) -> FrameGestures {
        let mut sets = Vec::with_capacity(2);
        for obs in hands.iter().take(2) {
            match LandmarkSet::try_from(obs) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    debug!(%e, "dropping frame with malformed landmarks");
                    return FrameGestures::empty();
                }
            }
        }

        let Some(primary) = sets.first() else {
            return FrameGestures::empty();
        };

        let pose = HandPose::measure(primary);
        let mut matched: Vec<GestureLabel> = self
            .evaluate(&pose)
            .into_iter()
            .filter_map(|(label, holds)| holds.then_some(label))
            .collect();

        if let Some(secondary) = sets.get(1) {
            let other = FingerState::from_landmarks(secondary);
            if is_toggle_pair(&pose.fingers, &other) {
                matched.push(GestureLabel::ToggleMode);
            }
        }

        let pointer = pose
            .fingers
            .index
            .then(|| Point::from(primary.point(INDEX_TIP)));

        FrameGestures { matched, pointer }
    }

    /// Every single-hand predicate paired with its outcome
    fn evaluate(&self, pose: &HandPose) -> Vec<(GestureLabel, bool)> {
        let f = &pose.fingers;
        let pinched = pose.pinch < self.pinch_threshold;

        let mut results = vec![
            (GestureLabel::OpenPalm, f.all()),
            (GestureLabel::Fist, f.none()),
            (GestureLabel::Point, f.exactly(&[Finger::Index])),
            (GestureLabel::Ok, pinched),
        ];

        for label in GestureLabel::MULTI_LABEL {
            if !self.enabled.contains(&label) {
                continue;
            }
            let holds = match label {
                GestureLabel::ThumbOnly => f.exactly(&[Finger::Thumb]),
                GestureLabel::PinkyOnly => f.exactly(&[Finger::Pinky]),
                GestureLabel::IndexMiddle => f.index && f.middle && !f.ring && !f.pinky,
                GestureLabel::IndexOnly => f.exactly(&[Finger::Index]),
                GestureLabel::MiddleRingPinky => !f.index && f.middle && f.ring && f.pinky,
                GestureLabel::AllFive => f.all(),
                GestureLabel::PinchThumbIndex => pinched,
                GestureLabel::ThumbPinky => f.exactly(&[Finger::Thumb, Finger::Pinky]),
                _ => false,
            };
            results.push((label, holds));
        }

        results
    }
}

/// One hand fully open and the other fully closed, in either order
fn is_toggle_pair(a: &FingerState, b: &FingerState) -> bool {
    (a.all() && b.none()) || (a.none() && b.all())
}
